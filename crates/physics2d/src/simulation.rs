//! # Physics World
//!
//! [`World`] owns every body, joint and force generator and advances them by
//! one fixed timestep per [`World::step`]. A step runs these phases in order:
//!
//! 1. force generators add to the force accumulators of awake bodies;
//! 2. velocities are integrated from forces and gravity;
//! 3. bodies whose state went non-finite are frozen;
//! 4. sleepers jointed to awake bodies are woken;
//! 5. the broad phase collects candidate pairs;
//! 6. the narrow phase builds contact manifolds, waking sleepers that are
//!    hit; when anything woke, phases 4 to 6 run again so the woken bodies
//!    enter the solver with all of their contacts;
//! 7. joint and contact constraints are assembled;
//! 8. warm start and velocity iterations run;
//! 9. accumulated impulses are cached for the next step;
//! 10. poses are integrated from the solved velocities;
//! 11. position correction removes residual penetration;
//! 12. non-finite bodies are frozen again;
//! 13. resting bodies accumulate rest time and fall asleep;
//! 14. [`StepStats`] are recorded.
//!
//! Every phase walks bodies in slot order, so equal inputs give bit-identical
//! trajectories.

use std::collections::{BTreeMap, HashSet};

use crate::body::{BodyId, BodyState, RenderInstance, RigidBody};
use crate::body_set::BodySet;
use crate::builder::BodyDesc;
use crate::collision::dispatcher::build_manifolds;
use crate::collision::{BroadPhase, Manifold};
use crate::config::{SleepConfig, WorldConfig};
use crate::error::{PhysicsError, Result};
use crate::forces::ForceGenerator;
use crate::integrator::{
    integrate_positions, integrate_positions_explicit, integrate_velocities, snapshot_velocities, Damping, Integrator,
};
use crate::math::Vec2;
use crate::steps::{ConstraintSolver, DistanceJoint, JointId, PointImpulse};

/// Counters describing the last completed step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Steps completed so far.
    pub step: u64,
    pub candidate_pairs: usize,
    pub manifolds: usize,
    pub contact_points: usize,
    pub constraints: usize,
    pub awake_bodies: usize,
    pub sleeping_bodies: usize,
    pub frozen_bodies: usize,
    /// Whether position correction reached its tolerance.
    pub positions_converged: bool,
}

/// A 2D rigid-body simulation advanced with a fixed timestep.
pub struct World {
    config: WorldConfig,
    bodies: BodySet,
    joints: BTreeMap<JointId, DistanceJoint>,
    next_joint: u32,
    force_generators: Vec<Box<dyn ForceGenerator>>,
    broad_phase: BroadPhase,
    manifolds: Vec<Manifold>,
    solver: ConstraintSolver,
    /// Pairs that had a manifold on the previous step.
    touching: HashSet<(BodyId, BodyId)>,
    /// Velocities at the start of the step, for explicit Euler.
    start_velocities: Vec<(Vec2, f64)>,
    stats: StepStats,
}

impl World {
    /// World with default settings apart from gravity and timestep.
    pub fn new(gravity: Vec2, timestep: f64) -> Result<Self> {
        Self::with_config(WorldConfig::new(gravity, timestep))
    }

    pub fn with_config(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            gravity = ?config.gravity,
            timestep = config.timestep,
            solver_iterations = config.solver_iterations,
            position_iterations = config.position_iterations,
            "created physics world"
        );
        Ok(Self {
            config,
            bodies: BodySet::new(),
            joints: BTreeMap::new(),
            next_joint: 0,
            force_generators: Vec::new(),
            broad_phase: BroadPhase::new(),
            manifolds: Vec::new(),
            solver: ConstraintSolver::new(),
            touching: HashSet::new(),
            start_velocities: Vec::new(),
            stats: StepStats::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next step.
    pub fn set_config(&mut self, config: WorldConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId> {
        let id = self.bodies.insert(&desc)?;
        tracing::debug!(body = %id, kind = ?desc.kind, "added body");
        Ok(id)
    }

    /// Remove a body together with every joint attached to it.
    pub fn remove_body(&mut self, id: BodyId) -> Result<RigidBody> {
        let body = self.bodies.remove(id)?;
        let before = self.joints.len();
        self.joints.retain(|_, joint| !joint.involves(id));
        self.manifolds.retain(|m| m.body_a != id && m.body_b != id);
        self.touching.retain(|&(a, b)| a != id && b != id);
        self.solver.forget_body(id);
        tracing::debug!(body = %id, joints_removed = before - self.joints.len(), "removed body");
        Ok(body)
    }

    pub fn body(&self, id: BodyId) -> Result<&RigidBody> {
        self.bodies.get(id)
    }

    pub fn body_state(&self, id: BodyId) -> Result<BodyState> {
        self.bodies.get(id).map(RigidBody::state)
    }

    /// Ids of all live bodies in slot order.
    pub fn bodies(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.ids()
    }

    #[must_use]
    pub fn body_set(&self) -> &BodySet {
        &self.bodies
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Accumulate `force` at `world_point` until the next step.
    pub fn apply_force(&mut self, id: BodyId, force: Vec2, world_point: Vec2) -> Result<()> {
        self.bodies.get_mut(id)?.apply_force(force, world_point);
        Ok(())
    }

    pub fn apply_torque(&mut self, id: BodyId, torque: f64) -> Result<()> {
        self.bodies.get_mut(id)?.apply_torque(torque);
        Ok(())
    }

    /// Change the body's velocity immediately; wakes it on this call.
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2, world_point: Vec2) -> Result<()> {
        self.bodies.get_mut(id)?.apply_impulse(impulse, world_point);
        Ok(())
    }

    pub fn set_linear_velocity(&mut self, id: BodyId, velocity: Vec2) -> Result<()> {
        self.bodies.get_mut(id)?.set_linear_velocity(velocity);
        Ok(())
    }

    pub fn set_angular_velocity(&mut self, id: BodyId, omega: f64) -> Result<()> {
        self.bodies.get_mut(id)?.set_angular_velocity(omega);
        Ok(())
    }

    /// Keep the world-space anchors at their current distance. Both bodies
    /// are woken.
    pub fn add_distance_joint(
        &mut self,
        a: BodyId,
        b: BodyId,
        anchor_a: Vec2,
        anchor_b: Vec2,
    ) -> Result<JointId> {
        let id = JointId(self.next_joint);
        let joint = DistanceJoint::new(id, self.bodies.get(a)?, self.bodies.get(b)?, anchor_a, anchor_b)?;
        self.next_joint = self
            .next_joint
            .checked_add(1)
            .ok_or(PhysicsError::InvalidConfig("too many joints"))?;
        tracing::debug!(joint = %id, body_a = %a, body_b = %b, rest_length = joint.rest_length, "added joint");
        self.joints.insert(id, joint);
        self.bodies.get_mut(a)?.wake();
        self.bodies.get_mut(b)?.wake();
        Ok(id)
    }

    pub fn remove_joint(&mut self, id: JointId) -> Result<DistanceJoint> {
        let joint = self.joints.remove(&id).ok_or(PhysicsError::UnknownJoint(id))?;
        for body in [joint.body_a, joint.body_b] {
            if let Ok(body) = self.bodies.get_mut(body) {
                body.wake();
            }
        }
        tracing::debug!(joint = %id, "removed joint");
        Ok(joint)
    }

    pub fn joint(&self, id: JointId) -> Result<&DistanceJoint> {
        self.joints.get(&id).ok_or(PhysicsError::UnknownJoint(id))
    }

    pub fn joints(&self) -> impl Iterator<Item = &DistanceJoint> {
        self.joints.values()
    }

    pub fn add_force_generator(&mut self, generator: Box<dyn ForceGenerator>) {
        self.force_generators.push(generator);
    }

    /// Contact manifolds found by the last step.
    #[must_use]
    pub fn contacts(&self) -> &[Manifold] {
        &self.manifolds
    }

    /// Accumulated impulses per contact point after the last velocity solve.
    #[must_use]
    pub fn contact_impulses(&self) -> &[PointImpulse] {
        self.solver.point_impulses()
    }

    #[must_use]
    pub fn stats(&self) -> StepStats {
        self.stats
    }

    /// Simulated time in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time(&self) -> f64 {
        self.stats.step as f64 * self.config.timestep
    }

    #[must_use]
    pub fn total_kinetic_energy(&self) -> f64 {
        self.bodies.iter().map(RigidBody::kinetic_energy).sum()
    }

    /// One packed record per body in slot order.
    #[must_use]
    pub fn render_instances(&self) -> Vec<RenderInstance> {
        self.bodies.iter().map(RigidBody::render_instance).collect()
    }

    /// Advance the world by one timestep.
    ///
    /// If any body's state became non-finite it is frozen and the step still
    /// completes for every other body; the frozen ids are then returned once
    /// in [`PhysicsError::NumericInstability`].
    pub fn step(&mut self) -> Result<()> {
        let dt = self.config.timestep;

        for generator in &self.force_generators {
            generator.apply(&mut self.bodies);
        }
        let damping = Damping {
            linear: self.config.linear_damping,
            angular: self.config.angular_damping,
        };
        let explicit = self.config.integrator == Integrator::ExplicitEuler;
        if explicit {
            snapshot_velocities(&self.bodies, &mut self.start_velocities);
        }
        integrate_velocities(&mut self.bodies, self.config.gravity, dt, damping);
        let mut unstable = self.freeze_non_finite();

        let previous = std::mem::take(&mut self.touching);
        let candidate_pairs = loop {
            self.wake_jointed_sleepers();
            let pairs = self.broad_phase.find_pairs(&self.bodies, self.config.aabb_margin);
            let count = pairs.len();
            build_manifolds(pairs, &self.bodies, &mut self.manifolds);
            if !self.wake_touched_sleepers(&previous) {
                break count;
            }
        };
        self.touching = self.manifolds.iter().map(|m| (m.body_a, m.body_b)).collect();

        let solver_config = self.config.solver;
        self.solver
            .prepare(self.joints.values(), &self.manifolds, &self.bodies, &solver_config);
        self.solver.warm_start(&mut self.bodies);
        self.solver
            .solve_velocities(&mut self.bodies, self.config.solver_iterations);
        self.solver.store_impulses(&mut self.joints);

        if explicit {
            integrate_positions_explicit(&mut self.bodies, dt, &self.start_velocities);
        } else {
            integrate_positions(&mut self.bodies, dt);
        }
        let positions_converged =
            self.solver
                .solve_positions(&mut self.bodies, &solver_config, self.config.position_iterations);
        unstable.extend(self.freeze_non_finite());

        self.update_sleep(dt);
        self.record_stats(candidate_pairs, positions_converged);

        if unstable.is_empty() {
            Ok(())
        } else {
            tracing::warn!(bodies = ?unstable, "numeric instability, bodies frozen");
            Err(PhysicsError::NumericInstability { bodies: unstable })
        }
    }

    /// Freeze every simulated body whose state is no longer finite.
    fn freeze_non_finite(&mut self) -> Vec<BodyId> {
        let mut frozen = Vec::new();
        for body in self.bodies.iter_mut().filter(|b| b.is_simulated()) {
            if !body.has_finite_state() {
                body.freeze();
                frozen.push(body.id());
            }
        }
        frozen
    }

    /// A sleeper hit by an awake body wakes when the contact is new or the
    /// other body is still moving. Returns whether any body woke.
    fn wake_touched_sleepers(&mut self, previous: &HashSet<(BodyId, BodyId)>) -> bool {
        let sleep = self.config.sleep;
        let mut to_wake = Vec::new();
        for m in &self.manifolds {
            let (Ok(a), Ok(b)) = (self.bodies.get(m.body_a), self.bodies.get(m.body_b)) else {
                continue;
            };
            let (sleeper, mover) = match (a.is_simulated(), b.is_simulated()) {
                (true, false) => (b, a),
                (false, true) => (a, b),
                _ => continue,
            };
            if sleeper.is_static() || sleeper.is_frozen() || sleeper.is_awake() {
                continue;
            }
            let new_contact = !previous.contains(&(m.body_a, m.body_b));
            if new_contact || is_moving(mover, &sleep) {
                to_wake.push(sleeper.id());
            }
        }
        let woke = !to_wake.is_empty();
        for id in to_wake {
            if let Ok(body) = self.bodies.get_mut(id) {
                body.wake();
            }
        }
        woke
    }

    /// Wakes sleepers jointed to awake bodies, following joint chains.
    fn wake_jointed_sleepers(&mut self) {
        loop {
            let mut to_wake = Vec::new();
            for joint in self.joints.values() {
                let (Ok(a), Ok(b)) = (self.bodies.get(joint.body_a), self.bodies.get(joint.body_b)) else {
                    continue;
                };
                for (this, other) in [(a, b), (b, a)] {
                    if this.is_simulated() && !other.is_static() && !other.is_frozen() && !other.is_awake() {
                        to_wake.push(other.id());
                    }
                }
            }
            if to_wake.is_empty() {
                return;
            }
            for id in to_wake {
                if let Ok(body) = self.bodies.get_mut(id) {
                    body.wake();
                }
            }
        }
    }

    fn update_sleep(&mut self, dt: f64) {
        let sleep = self.config.sleep;
        if !sleep.enabled {
            return;
        }
        for body in self.bodies.iter_mut().filter(|b| b.is_simulated()) {
            if is_moving(body, &sleep) {
                body.sleep_time = 0.0;
            } else {
                body.sleep_time += dt;
                if body.sleep_time >= sleep.time_threshold {
                    body.sleep();
                }
            }
        }
    }

    fn record_stats(&mut self, candidate_pairs: usize, positions_converged: bool) {
        let mut stats = StepStats {
            step: self.stats.step + 1,
            candidate_pairs,
            manifolds: self.manifolds.len(),
            contact_points: self.manifolds.iter().map(|m| m.points.len()).sum(),
            constraints: self.solver.constraint_count(),
            positions_converged,
            ..StepStats::default()
        };
        for body in self.bodies.iter().filter(|b| !b.is_static()) {
            if body.is_frozen() {
                stats.frozen_bodies += 1;
            } else if body.is_awake() {
                stats.awake_bodies += 1;
            } else {
                stats.sleeping_bodies += 1;
            }
        }
        self.stats = stats;
        tracing::debug!(
            step = stats.step,
            pairs = stats.candidate_pairs,
            manifolds = stats.manifolds,
            points = stats.contact_points,
            awake = stats.awake_bodies,
            sleeping = stats.sleeping_bodies,
            "step complete"
        );
    }
}

fn is_moving(body: &RigidBody, sleep: &SleepConfig) -> bool {
    body.linear_velocity.length() > sleep.linear_threshold || body.angular_velocity.abs() > sleep.angular_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Material;
    use crate::shapes::Shape;

    fn world() -> World {
        World::new(Vec2::new(0.0, -9.8), 1.0 / 60.0).unwrap()
    }

    #[test]
    fn rejects_invalid_timestep() {
        assert!(matches!(
            World::new(Vec2::ZERO, 0.0),
            Err(PhysicsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn free_fall_matches_semi_implicit_euler() {
        let mut w = World::new(Vec2::new(0.0, -10.0), 0.1).unwrap();
        let id = w.add_circle(Vec2::ZERO, 0.5, 1.0, Material::default()).unwrap();
        w.step().unwrap();
        w.step().unwrap();
        let s = w.body_state(id).unwrap();
        assert!((s.linear_velocity.y + 2.0).abs() < 1e-12);
        assert!((s.position.y + 0.3).abs() < 1e-12);
        assert_eq!(w.stats().step, 2);
        assert!((w.time() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn removing_a_body_drops_its_joints() {
        let mut w = world();
        let a = w.add_circle(Vec2::ZERO, 0.1, 1.0, Material::default()).unwrap();
        let b = w.add_circle(Vec2::new(1.0, 0.0), 0.1, 1.0, Material::default()).unwrap();
        let j = w.add_distance_joint(a, b, Vec2::ZERO, Vec2::new(1.0, 0.0)).unwrap();
        w.remove_body(a).unwrap();
        assert_eq!(w.joint(j), Err(PhysicsError::UnknownJoint(j)));
        assert_eq!(w.body_count(), 1);
        assert_eq!(w.remove_body(a).unwrap_err(), PhysicsError::UnknownBody(a));
    }

    #[test]
    fn stale_ids_stay_invalid_after_slot_reuse() {
        let mut w = world();
        let a = w.add_circle(Vec2::ZERO, 0.1, 1.0, Material::default()).unwrap();
        w.remove_body(a).unwrap();
        let b = w.add_circle(Vec2::ZERO, 0.1, 1.0, Material::default()).unwrap();
        assert_eq!(a.index(), b.index());
        assert!(w.body_state(a).is_err());
        assert!(w.body_state(b).is_ok());
    }

    #[test]
    fn render_instances_cover_every_body() {
        let mut w = world();
        w.add_static_box(Vec2::ZERO, 0.0, 10.0, 1.0).unwrap();
        w.add_body(BodyDesc::dynamic(Shape::circle(0.5).unwrap(), 1.0).position(Vec2::new(0.0, 3.0)))
            .unwrap();
        let instances = w.render_instances();
        assert_eq!(instances.len(), 2);
        assert_ne!(instances[0].flags & RenderInstance::FLAG_STATIC, 0);
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), 2 * std::mem::size_of::<RenderInstance>());
    }
}
