//! Rigid distance joint between anchor points on two bodies.

use std::fmt;

use super::{apply_position_impulse, apply_velocity_impulse, effective_mass, SolverConstraint};
use crate::body::{BodyId, RigidBody};
use crate::body_set::BodySet;
use crate::config::SolverConfig;
use crate::error::{PhysicsError, Result};
use crate::math::Vec2;

/// Handle returned by [`World::add_distance_joint`](crate::World::add_distance_joint).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(pub(crate) u32);

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Keeps two anchor points at the distance they had when the joint was
/// created.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceJoint {
    pub(crate) id: JointId,
    pub(crate) body_a: BodyId,
    pub(crate) body_b: BodyId,
    /// Anchors in each body's frame, relative to its centroid.
    pub(crate) local_anchor_a: Vec2,
    pub(crate) local_anchor_b: Vec2,
    pub(crate) rest_length: f64,
    /// Accumulated impulse of the last step, reused for warm starting.
    pub(crate) impulse: f64,
}

impl DistanceJoint {
    pub(crate) fn new(id: JointId, a: &RigidBody, b: &RigidBody, anchor_a: Vec2, anchor_b: Vec2) -> Result<Self> {
        if a.id() == b.id() {
            return Err(PhysicsError::InvalidConfig("a joint needs two distinct bodies"));
        }
        if !(anchor_a.is_finite() && anchor_b.is_finite()) {
            return Err(PhysicsError::InvalidConfig("joint anchors must be finite"));
        }
        Ok(Self {
            id,
            body_a: a.id(),
            body_b: b.id(),
            local_anchor_a: a.transform.rotation.inv_rotate(anchor_a - a.center),
            local_anchor_b: b.transform.rotation.inv_rotate(anchor_b - b.center),
            rest_length: (anchor_b - anchor_a).length(),
            impulse: 0.0,
        })
    }

    #[must_use]
    pub fn id(&self) -> JointId {
        self.id
    }

    #[must_use]
    pub fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_a, self.body_b)
    }

    #[must_use]
    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    #[must_use]
    pub fn impulse(&self) -> f64 {
        self.impulse
    }

    /// Current world-space anchor positions.
    pub fn world_anchors(&self, bodies: &BodySet) -> Result<(Vec2, Vec2)> {
        let a = bodies.get(self.body_a)?;
        let b = bodies.get(self.body_b)?;
        Ok((
            a.center + a.transform.rotation.rotate(self.local_anchor_a),
            b.center + b.transform.rotation.rotate(self.local_anchor_b),
        ))
    }

    pub(crate) fn involves(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }
}

#[derive(Clone, Debug)]
pub struct DistanceConstraint {
    joint: JointId,
    index_a: usize,
    index_b: usize,
    local_anchor_a: Vec2,
    local_anchor_b: Vec2,
    rest_length: f64,
    r_a: Vec2,
    r_b: Vec2,
    axis: Vec2,
    mass: f64,
    impulse: f64,
}

impl DistanceConstraint {
    pub(crate) fn new(joint: &DistanceJoint, bodies: &BodySet, config: &SolverConfig) -> Option<Self> {
        let a = bodies.get(joint.body_a).ok()?;
        let b = bodies.get(joint.body_b).ok()?;
        if !(a.is_simulated() || b.is_simulated()) {
            return None;
        }
        let r_a = a.transform.rotation.rotate(joint.local_anchor_a);
        let r_b = b.transform.rotation.rotate(joint.local_anchor_b);
        let delta = (b.center + r_b) - (a.center + r_a);
        let length = delta.length();
        // Coincident anchors have no direction to push along.
        let axis = if length > config.linear_slop { delta / length } else { Vec2::ZERO };
        let impulse = if config.warm_starting { joint.impulse * config.warm_start_scale } else { 0.0 };
        Some(Self {
            joint: joint.id,
            index_a: a.id().index(),
            index_b: b.id().index(),
            local_anchor_a: joint.local_anchor_a,
            local_anchor_b: joint.local_anchor_b,
            rest_length: joint.rest_length,
            r_a,
            r_b,
            axis,
            mass: effective_mass(a, b, r_a, r_b, axis),
            impulse,
        })
    }

    #[must_use]
    pub fn joint(&self) -> JointId {
        self.joint
    }

    #[must_use]
    pub fn impulse(&self) -> f64 {
        self.impulse
    }
}

impl SolverConstraint for DistanceConstraint {
    fn warm_start(&mut self, bodies: &mut BodySet) {
        if let Some((a, b)) = bodies.pair_mut(self.index_a, self.index_b) {
            apply_velocity_impulse(a, b, self.r_a, self.r_b, self.axis * self.impulse);
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodySet) {
        let Some((a, b)) = bodies.pair_mut(self.index_a, self.index_b) else {
            return;
        };
        let relative = b.velocity_at(b.center + self.r_b) - a.velocity_at(a.center + self.r_a);
        let lambda = -self.mass * relative.dot(self.axis);
        self.impulse += lambda;
        apply_velocity_impulse(a, b, self.r_a, self.r_b, self.axis * lambda);
    }

    fn solve_position(&mut self, bodies: &mut BodySet, config: &SolverConfig) -> bool {
        let Some((a, b)) = bodies.pair_mut(self.index_a, self.index_b) else {
            return true;
        };
        let r_a = a.transform.rotation.rotate(self.local_anchor_a);
        let r_b = b.transform.rotation.rotate(self.local_anchor_b);
        let delta = (b.center + r_b) - (a.center + r_a);
        let length = delta.length();
        let Some(axis) = delta.try_normalize() else {
            return true;
        };
        let error = length - self.rest_length;
        let correction = error.clamp(-config.max_linear_correction, config.max_linear_correction);
        let impulse = -effective_mass(a, b, r_a, r_b, axis) * correction;
        apply_position_impulse(a, b, r_a, r_b, axis * impulse);
        error.abs() < config.linear_slop
    }
}
