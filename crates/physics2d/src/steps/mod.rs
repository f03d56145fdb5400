//! # Constraint Solver
//!
//! Sequential-impulse (projected Gauss-Seidel) solver over contacts and
//! joints. A step goes through the solver in four passes:
//!
//! 1. [`ConstraintSolver::prepare`] builds one constraint per joint and per
//!    contact manifold, joints first, and seeds accumulated impulses from the
//!    previous step.
//! 2. [`ConstraintSolver::warm_start`] applies those seeded impulses.
//! 3. [`ConstraintSolver::solve_velocities`] iterates the velocity
//!    constraints, then [`ConstraintSolver::store_impulses`] refreshes the
//!    warm-start cache.
//! 4. After positions are integrated, [`ConstraintSolver::solve_positions`]
//!    removes the remaining penetration and joint drift by moving poses
//!    directly.
//!
//! Constraints refer to bodies by slot index. Bodies that are not simulated
//! this step (static, sleeping or frozen) take part with zero inverse mass
//! and are never written to.

mod contact;
mod joint;

use std::collections::{BTreeMap, HashMap};

pub use contact::{ContactConstraint, PointImpulse};
pub use joint::{DistanceConstraint, DistanceJoint, JointId};

use crate::body::{BodyId, RigidBody};
use crate::body_set::BodySet;
use crate::collision::Manifold;
use crate::config::SolverConfig;
use crate::math::Vec2;

/// What every constraint kind must provide to the solver loop.
pub(crate) trait SolverConstraint {
    /// Apply the impulses accumulated so far.
    fn warm_start(&mut self, bodies: &mut BodySet);

    /// One Gauss-Seidel pass over the velocity constraint.
    fn solve_velocity(&mut self, bodies: &mut BodySet);

    /// One non-linear Gauss-Seidel pass over the position error. Returns
    /// `true` once the error is within tolerance.
    fn solve_position(&mut self, bodies: &mut BodySet, config: &SolverConfig) -> bool;
}

#[derive(Clone, Debug)]
pub(crate) enum Constraint {
    Contact(ContactConstraint),
    Distance(DistanceConstraint),
}

impl SolverConstraint for Constraint {
    fn warm_start(&mut self, bodies: &mut BodySet) {
        match self {
            Self::Contact(c) => c.warm_start(bodies),
            Self::Distance(d) => d.warm_start(bodies),
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodySet) {
        match self {
            Self::Contact(c) => c.solve_velocity(bodies),
            Self::Distance(d) => d.solve_velocity(bodies),
        }
    }

    fn solve_position(&mut self, bodies: &mut BodySet, config: &SolverConfig) -> bool {
        match self {
            Self::Contact(c) => c.solve_position(bodies, config),
            Self::Distance(d) => d.solve_position(bodies, config),
        }
    }
}

/// Accumulated impulses of one contact point.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ContactImpulse {
    pub normal: f64,
    pub tangent: f64,
}

/// Warm-start cache key: the body pair and the packed feature id.
pub(crate) type ContactKey = (BodyId, BodyId, u32);

#[derive(Debug, Default)]
pub(crate) struct ConstraintSolver {
    constraints: Vec<Constraint>,
    cache: HashMap<ContactKey, ContactImpulse>,
    impulses: Vec<PointImpulse>,
}

impl ConstraintSolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn prepare<'a>(
        &mut self,
        joints: impl IntoIterator<Item = &'a DistanceJoint>,
        manifolds: &[Manifold],
        bodies: &BodySet,
        config: &SolverConfig,
    ) {
        self.constraints.clear();
        for joint in joints {
            if let Some(c) = DistanceConstraint::new(joint, bodies, config) {
                self.constraints.push(Constraint::Distance(c));
            }
        }
        let cache = &self.cache;
        let lookup = |key: &ContactKey| {
            if config.warm_starting {
                cache.get(key).copied().unwrap_or_default()
            } else {
                ContactImpulse::default()
            }
        };
        for manifold in manifolds {
            if let Some(c) = ContactConstraint::new(manifold, bodies, config, &lookup) {
                self.constraints.push(Constraint::Contact(c));
            }
        }
    }

    pub(crate) fn warm_start(&mut self, bodies: &mut BodySet) {
        for c in &mut self.constraints {
            c.warm_start(bodies);
        }
    }

    pub(crate) fn solve_velocities(&mut self, bodies: &mut BodySet, iterations: usize) {
        for _ in 0..iterations {
            for c in &mut self.constraints {
                c.solve_velocity(bodies);
            }
        }
    }

    /// Rebuild the warm-start cache from this step's contacts and hand joint
    /// impulses back to their joints. Cache entries for contacts that were
    /// not regenerated this step are dropped.
    pub(crate) fn store_impulses(&mut self, joints: &mut BTreeMap<JointId, DistanceJoint>) {
        self.cache.clear();
        self.impulses.clear();
        for c in &self.constraints {
            match c {
                Constraint::Contact(contact) => {
                    for point in contact.point_impulses() {
                        self.cache.insert(
                            (point.body_a, point.body_b, point.feature),
                            ContactImpulse { normal: point.normal_impulse, tangent: point.tangent_impulse },
                        );
                        self.impulses.push(point);
                    }
                }
                Constraint::Distance(distance) => {
                    if let Some(joint) = joints.get_mut(&distance.joint()) {
                        joint.impulse = distance.impulse();
                    }
                }
            }
        }
    }

    /// Returns `true` when every constraint ended within tolerance.
    pub(crate) fn solve_positions(&mut self, bodies: &mut BodySet, config: &SolverConfig, iterations: usize) -> bool {
        for _ in 0..iterations {
            let mut solved = true;
            for c in &mut self.constraints {
                solved &= c.solve_position(bodies, config);
            }
            if solved {
                return true;
            }
        }
        iterations == 0
    }

    /// Per-point impulses of the last velocity solve, in constraint order.
    pub(crate) fn point_impulses(&self) -> &[PointImpulse] {
        &self.impulses
    }

    pub(crate) fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Forget cached impulses touching `body`.
    pub(crate) fn forget_body(&mut self, body: BodyId) {
        self.cache.retain(|&(a, b, _), _| a != body && b != body);
    }
}

/// Apply impulse `p` at arm `r_b` on B and `-p` at arm `r_a` on A.
pub(crate) fn apply_velocity_impulse(a: &mut RigidBody, b: &mut RigidBody, r_a: Vec2, r_b: Vec2, p: Vec2) {
    if a.is_simulated() {
        a.linear_velocity -= p * a.inv_mass;
        a.angular_velocity -= a.inv_inertia * r_a.cross(p);
    }
    if b.is_simulated() {
        b.linear_velocity += p * b.inv_mass;
        b.angular_velocity += b.inv_inertia * r_b.cross(p);
    }
}

/// Positional counterpart of [`apply_velocity_impulse`]: moves the poses.
pub(crate) fn apply_position_impulse(a: &mut RigidBody, b: &mut RigidBody, r_a: Vec2, r_b: Vec2, p: Vec2) {
    if a.is_simulated() {
        let center = a.center - p * a.inv_mass;
        let rotation = a.transform.rotation.integrate(-a.inv_inertia * r_a.cross(p));
        a.set_pose(center, rotation);
    }
    if b.is_simulated() {
        let center = b.center + p * b.inv_mass;
        let rotation = b.transform.rotation.integrate(b.inv_inertia * r_b.cross(p));
        b.set_pose(center, rotation);
    }
}

/// Effective mass along `axis` for arms `r_a`, `r_b`; zero when both sides are
/// immovable.
pub(crate) fn effective_mass(a: &RigidBody, b: &RigidBody, r_a: Vec2, r_b: Vec2, axis: Vec2) -> f64 {
    let rn_a = r_a.cross(axis);
    let rn_b = r_b.cross(axis);
    let k = a.solver_inv_mass()
        + b.solver_inv_mass()
        + a.solver_inv_inertia() * rn_a * rn_a
        + b.solver_inv_inertia() * rn_b * rn_b;
    if k > 0.0 { 1.0 / k } else { 0.0 }
}
