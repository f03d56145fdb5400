//! # Rigid Bodies
//!
//! Mass properties, kinematic state and material of a single body. Bodies
//! are owned by the [`BodySet`](crate::body_set::BodySet) inside a
//! [`World`](crate::World); everything else refers to them by [`BodyId`].

use std::fmt;
use std::sync::Arc;

use crate::builder::BodyDesc;
use crate::error::{PhysicsError, Result};
use crate::math::{Rot2, Transform2, Vec2};
use crate::shapes::Shape;

/// Stable handle to a body. The generation makes handles of removed bodies
/// stay invalid even after their slot is reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl BodyId {
    #[must_use]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyKind {
    /// Moves under forces, impulses and contacts.
    Dynamic,
    /// Infinite mass; never moves.
    Static,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum SleepState {
    #[default]
    Awake,
    Sleeping,
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    /// Bounciness in `[0, 1]`.
    pub restitution: f64,
    /// Coulomb friction coefficient, `>= 0`.
    pub friction: f64,
}

impl Material {
    #[must_use]
    pub const fn new(restitution: f64, friction: f64) -> Self {
        Self { restitution, friction }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::InvalidMaterial("restitution must be within [0, 1]"));
        }
        if !(self.friction.is_finite() && self.friction >= 0.0) {
            return Err(PhysicsError::InvalidMaterial("friction must be finite and >= 0"));
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self { restitution: 0.0, friction: 0.5 }
    }
}

/// Read-only snapshot of a body's kinematic state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BodyState {
    /// Body origin in world space.
    pub position: Vec2,
    /// Orientation in radians, `(-π, π]`.
    pub rotation: f64,
    pub center_of_mass: Vec2,
    pub linear_velocity: Vec2,
    pub angular_velocity: f64,
    pub sleep_state: SleepState,
    pub frozen: bool,
}

/// Packed per-body record for renderers; `bytemuck::cast_slice` it straight
/// into a vertex or storage buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderInstance {
    pub position: [f32; 2],
    /// `[cos θ, sin θ]`
    pub rotation: [f32; 2],
    pub body_index: u32,
    pub flags: u32,
}

impl RenderInstance {
    pub const FLAG_SLEEPING: u32 = 1;
    pub const FLAG_STATIC: u32 = 1 << 1;
    pub const FLAG_FROZEN: u32 = 1 << 2;
}

#[derive(Clone, Debug)]
pub struct RigidBody {
    pub(crate) id: BodyId,
    pub(crate) shape: Arc<Shape>,
    pub(crate) kind: BodyKind,
    pub(crate) mass: f64,
    pub(crate) inv_mass: f64,
    pub(crate) inertia: f64,
    pub(crate) inv_inertia: f64,
    pub(crate) local_center: Vec2,
    pub(crate) transform: Transform2,
    /// World-space centroid; the point velocities refer to.
    pub(crate) center: Vec2,
    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f64,
    pub(crate) force: Vec2,
    pub(crate) torque: f64,
    pub(crate) material: Material,
    pub(crate) sleep_state: SleepState,
    pub(crate) sleep_time: f64,
    pub(crate) frozen: bool,
    pub(crate) fixed_rotation: bool,
}

impl RigidBody {
    pub(crate) fn new(id: BodyId, desc: &BodyDesc) -> Result<Self> {
        desc.shape.validate()?;
        desc.material.validate()?;
        let fixed_rotation = desc.fixed_rotation && desc.kind == BodyKind::Dynamic;
        let (mass, inv_mass, inertia, inv_inertia, local_center) = match desc.kind {
            BodyKind::Dynamic => {
                if !(desc.mass.is_finite() && desc.mass > 0.0) {
                    return Err(PhysicsError::InvalidMass(desc.mass));
                }
                let props = desc.shape.mass_properties(desc.mass);
                if fixed_rotation {
                    (props.mass, 1.0 / props.mass, 0.0, 0.0, props.local_center)
                } else {
                    let inv_inertia = if props.inertia > 0.0 { 1.0 / props.inertia } else { 0.0 };
                    (props.mass, 1.0 / props.mass, props.inertia, inv_inertia, props.local_center)
                }
            }
            BodyKind::Static => {
                let props = desc.shape.mass_properties(0.0);
                (f64::INFINITY, 0.0, f64::INFINITY, 0.0, props.local_center)
            }
        };
        let transform = desc.transform;
        if !(transform.position.is_finite() && transform.rotation.is_finite()) {
            return Err(PhysicsError::InvalidConfig("initial transform must be finite"));
        }
        let (linear_velocity, angular_velocity) = match desc.kind {
            BodyKind::Dynamic if fixed_rotation => (desc.linear_velocity, 0.0),
            BodyKind::Dynamic => (desc.linear_velocity, desc.angular_velocity),
            BodyKind::Static => (Vec2::ZERO, 0.0),
        };
        Ok(Self {
            id,
            shape: Arc::clone(&desc.shape),
            kind: desc.kind,
            mass,
            inv_mass,
            inertia,
            inv_inertia,
            local_center,
            transform,
            center: transform.apply(local_center),
            linear_velocity,
            angular_velocity,
            force: Vec2::ZERO,
            torque: 0.0,
            material: desc.material,
            sleep_state: SleepState::Awake,
            sleep_time: 0.0,
            frozen: false,
            fixed_rotation,
        })
    }

    #[must_use]
    pub fn id(&self) -> BodyId {
        self.id
    }

    #[must_use]
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    #[must_use]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// `f64::INFINITY` for static bodies.
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[must_use]
    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    #[must_use]
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    #[must_use]
    pub fn inv_inertia(&self) -> f64 {
        self.inv_inertia
    }

    #[must_use]
    pub fn material(&self) -> Material {
        self.material
    }

    #[must_use]
    pub fn transform(&self) -> &Transform2 {
        &self.transform
    }

    #[must_use]
    pub fn center_of_mass(&self) -> Vec2 {
        self.center
    }

    #[must_use]
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    #[must_use]
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    #[must_use]
    pub fn sleep_state(&self) -> SleepState {
        self.sleep_state
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.sleep_state == SleepState::Awake
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Particles and other bodies that never rotate.
    #[must_use]
    pub fn has_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    /// Awake, dynamic and not frozen: the only bodies the step moves.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.kind == BodyKind::Dynamic && self.is_awake() && !self.frozen
    }

    /// Inverse mass as seen by the solver this step.
    pub(crate) fn solver_inv_mass(&self) -> f64 {
        if self.is_simulated() { self.inv_mass } else { 0.0 }
    }

    pub(crate) fn solver_inv_inertia(&self) -> f64 {
        if self.is_simulated() { self.inv_inertia } else { 0.0 }
    }

    /// Velocity of a world-space point rigidly attached to the body.
    #[must_use]
    pub fn velocity_at(&self, world_point: Vec2) -> Vec2 {
        self.linear_velocity + Vec2::scalar_cross(self.angular_velocity, world_point - self.center)
    }

    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        if self.kind == BodyKind::Static {
            return 0.0;
        }
        0.5 * self.mass * self.linear_velocity.length_squared()
            + 0.5 * self.inertia * self.angular_velocity * self.angular_velocity
    }

    pub fn wake(&mut self) {
        if self.kind == BodyKind::Dynamic && self.sleep_state == SleepState::Sleeping {
            tracing::trace!(body = %self.id, "waking");
            self.sleep_state = SleepState::Awake;
        }
        self.sleep_time = 0.0;
    }

    pub(crate) fn sleep(&mut self) {
        tracing::trace!(body = %self.id, "falling asleep");
        self.sleep_state = SleepState::Sleeping;
        self.linear_velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Accumulates `force` at `world_point`; consumed and cleared by the next
    /// step. Static bodies ignore forces.
    pub fn apply_force(&mut self, force: Vec2, world_point: Vec2) {
        if self.kind == BodyKind::Static {
            return;
        }
        if force != Vec2::ZERO {
            self.wake();
        }
        self.force += force;
        self.torque += (world_point - self.center).cross(force);
    }

    /// Adds to the accumulators without touching the sleep state. Only bodies
    /// simulated this step are affected; meant for force generators.
    pub fn accumulate_force(&mut self, force: Vec2, world_point: Vec2) {
        if self.is_simulated() {
            self.force += force;
            self.torque += (world_point - self.center).cross(force);
        }
    }

    pub fn apply_force_to_center(&mut self, force: Vec2) {
        let center = self.center;
        self.apply_force(force, center);
    }

    pub fn apply_torque(&mut self, torque: f64) {
        if self.kind == BodyKind::Static {
            return;
        }
        if torque != 0.0 {
            self.wake();
        }
        self.torque += torque;
    }

    /// Instantaneous change of momentum at `world_point`.
    pub fn apply_impulse(&mut self, impulse: Vec2, world_point: Vec2) {
        if self.kind == BodyKind::Static {
            return;
        }
        if impulse != Vec2::ZERO {
            self.wake();
        }
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia * (world_point - self.center).cross(impulse);
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        if self.kind == BodyKind::Static {
            return;
        }
        if velocity != Vec2::ZERO {
            self.wake();
        }
        self.linear_velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, omega: f64) {
        if self.kind == BodyKind::Static || self.fixed_rotation {
            return;
        }
        if omega != 0.0 {
            self.wake();
        }
        self.angular_velocity = omega;
    }

    pub(crate) fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Re-derives the body origin after the centroid or rotation moved.
    pub(crate) fn sync_transform(&mut self) {
        self.transform.position = self.center - self.transform.rotation.rotate(self.local_center);
    }

    pub(crate) fn set_pose(&mut self, center: Vec2, rotation: Rot2) {
        self.center = center;
        self.transform.rotation = rotation;
        self.sync_transform();
    }

    pub(crate) fn has_finite_state(&self) -> bool {
        self.center.is_finite()
            && self.transform.position.is_finite()
            && self.transform.rotation.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
    }

    pub(crate) fn freeze(&mut self) {
        tracing::warn!(body = %self.id, "non-finite state, freezing body");
        self.frozen = true;
        self.linear_velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.clear_forces();
    }

    #[must_use]
    pub fn state(&self) -> BodyState {
        BodyState {
            position: self.transform.position,
            rotation: self.transform.rotation.angle(),
            center_of_mass: self.center,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            sleep_state: self.sleep_state,
            frozen: self.frozen,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn render_instance(&self) -> RenderInstance {
        let mut flags = 0;
        if self.sleep_state == SleepState::Sleeping {
            flags |= RenderInstance::FLAG_SLEEPING;
        }
        if self.kind == BodyKind::Static {
            flags |= RenderInstance::FLAG_STATIC;
        }
        if self.frozen {
            flags |= RenderInstance::FLAG_FROZEN;
        }
        let xf = &self.transform;
        RenderInstance {
            position: [xf.position.x as f32, xf.position.y as f32],
            rotation: [xf.rotation.cos as f32, xf.rotation.sin as f32],
            body_index: self.id.index,
            flags,
        }
    }
}
