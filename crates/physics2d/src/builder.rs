//! # Body Builder
//!
//! [`BodyDesc`] describes a body before it is inserted into a world. The
//! `add_*` shorthands on [`World`] cover the common circle and box cases.

use std::sync::Arc;

use crate::body::{BodyId, BodyKind, Material};
use crate::error::Result;
use crate::math::{Rot2, Transform2, Vec2};
use crate::shapes::{Circle, Shape};
use crate::World;

/// Collider radius given to particles.
pub const PARTICLE_RADIUS: f64 = 0.05;

#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub shape: Arc<Shape>,
    pub kind: BodyKind,
    /// Ignored for static bodies.
    pub mass: f64,
    pub material: Material,
    pub transform: Transform2,
    pub linear_velocity: Vec2,
    pub angular_velocity: f64,
    /// Zero inverse inertia: contacts and torques never spin the body.
    pub fixed_rotation: bool,
}

impl BodyDesc {
    /// A body that moves under forces and contacts.
    pub fn dynamic(shape: impl Into<Arc<Shape>>, mass: f64) -> Self {
        Self {
            shape: shape.into(),
            kind: BodyKind::Dynamic,
            mass,
            material: Material::default(),
            transform: Transform2::IDENTITY,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            fixed_rotation: false,
        }
    }

    /// A point mass: a small circle of radius [`PARTICLE_RADIUS`] that never
    /// rotates.
    pub fn particle(mass: f64) -> Self {
        Self::dynamic(Shape::Circle(Circle { radius: PARTICLE_RADIUS }), mass).fixed_rotation()
    }

    /// A body with infinite mass that never moves.
    pub fn fixed(shape: impl Into<Arc<Shape>>) -> Self {
        Self {
            kind: BodyKind::Static,
            mass: 0.0,
            ..Self::dynamic(shape, 0.0)
        }
    }

    #[must_use]
    pub fn restitution(mut self, restitution: f64) -> Self {
        self.material.restitution = restitution;
        self
    }

    #[must_use]
    pub fn friction(mut self, friction: f64) -> Self {
        self.material.friction = friction;
        self
    }

    #[must_use]
    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: Transform2) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn position(mut self, position: Vec2) -> Self {
        self.transform.position = position;
        self
    }

    /// Orientation in radians.
    #[must_use]
    pub fn rotation(mut self, angle: f64) -> Self {
        self.transform.rotation = Rot2::from_angle(angle);
        self
    }

    #[must_use]
    pub fn linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    #[must_use]
    pub fn angular_velocity(mut self, omega: f64) -> Self {
        self.angular_velocity = omega;
        self
    }

    #[must_use]
    pub fn fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }
}

/// Shorthands for adding common bodies.
impl World {
    /// Add a dynamic circle with the given material.
    pub fn add_circle(
        &mut self,
        position: Vec2,
        radius: f64,
        mass: f64,
        material: Material,
    ) -> Result<BodyId> {
        let desc = BodyDesc::dynamic(Shape::circle(radius)?, mass)
            .position(position)
            .material(material);
        self.add_body(desc)
    }

    /// Add a dynamic box of `width × height` centered at `position`.
    pub fn add_box(
        &mut self,
        position: Vec2,
        angle: f64,
        width: f64,
        height: f64,
        mass: f64,
    ) -> Result<BodyId> {
        let desc = BodyDesc::dynamic(Shape::rectangle(width * 0.5, height * 0.5)?, mass)
            .position(position)
            .rotation(angle);
        self.add_body(desc)
    }

    /// Add a particle moving with `velocity`.
    pub fn add_particle(&mut self, position: Vec2, velocity: Vec2, mass: f64) -> Result<BodyId> {
        self.add_body(BodyDesc::particle(mass).position(position).linear_velocity(velocity))
    }

    /// Add a static box, typically ground or walls.
    pub fn add_static_box(
        &mut self,
        position: Vec2,
        angle: f64,
        width: f64,
        height: f64,
    ) -> Result<BodyId> {
        let desc = BodyDesc::fixed(Shape::rectangle(width * 0.5, height * 0.5)?)
            .position(position)
            .rotation(angle);
        self.add_body(desc)
    }
}
