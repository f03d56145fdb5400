#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::missing_errors_doc)]
//! # physics2d
//!
//! A small, deterministic 2D rigid-body physics engine.
//!
//! The engine advances a set of rigid bodies, circles and convex polygons,
//! under gravity, contacts, joints and user forces with a fixed timestep.
//!
//! ## Key Components
//!
//! -   **Shapes and bodies:** [`Shape`] describes a collider; [`BodyDesc`]
//!     describes a body before insertion and [`RigidBody`] is the live body,
//!     addressed by a generational [`BodyId`].
//! -   **Collision:** a sort-and-sweep [`BroadPhase`] feeds the narrow-phase
//!     routines in [`collision`], which produce [`Manifold`]s with up to two
//!     points and stable feature ids.
//! -   **Solver:** a sequential-impulse solver in [`steps`] with warm
//!     starting, friction, restitution, distance joints and position
//!     correction.
//! -   **World:** [`World`] ties it together and exposes the public API.
//!
//! ## Usage
//!
//! ```rust
//! use physics2d::{Material, Vec2, World};
//!
//! let mut world = World::new(Vec2::new(0.0, -9.8), 1.0 / 60.0)?;
//! world.add_static_box(Vec2::new(0.0, -0.5), 0.0, 20.0, 1.0)?;
//! let ball = world.add_circle(Vec2::new(0.0, 2.0), 0.5, 1.0, Material::default())?;
//!
//! for _ in 0..120 {
//!     world.step()?;
//! }
//! let state = world.body_state(ball)?;
//! assert!((state.position.y - 0.5).abs() < 1e-2);
//! # Ok::<(), physics2d::PhysicsError>(())
//! ```

pub mod body;
pub mod body_set;
pub mod builder;
pub mod collision;
pub mod config;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod math;
pub mod shapes;
pub mod simulation;
pub mod steps;

pub use body::{BodyId, BodyKind, BodyState, Material, RenderInstance, RigidBody, SleepState};
pub use body_set::BodySet;
pub use builder::{BodyDesc, PARTICLE_RADIUS};
pub use collision::{Aabb, BroadPhase, Collision, ContactFeature, ContactPoint, FeatureKind, Manifold};
pub use config::{SleepConfig, SolverConfig, WorldConfig};
pub use error::{PhysicsError, Result};
pub use forces::{ForceGenerator, LinearDrag, Spring, SpringEnd};
pub use integrator::Integrator;
pub use math::{Rot2, Transform2, Vec2};
pub use shapes::{Circle, MassProperties, Polygon, Shape};
pub use simulation::{StepStats, World};
pub use steps::{ContactImpulse, DistanceJoint, JointId, PointImpulse};
