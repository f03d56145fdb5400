//! # Collision Detection
//!
//! Broad-phase pair finding and narrow-phase manifold generation. The
//! narrow-phase routines are pure functions of two shapes and their
//! transforms; [`dispatcher`] routes a candidate pair to the right one and
//! attaches body ids and mixed material.

mod broad_phase;
mod circle_circle;
pub mod dispatcher;
mod polygon_circle;
mod polygon_polygon;

pub use broad_phase::*;
pub use circle_circle::collide_circles;
pub use polygon_circle::collide_polygon_circle;
pub use polygon_polygon::collide_polygons;

use crate::body::BodyId;
use crate::math::Vec2;

/// Which kind of geometric feature produced one side of a contact point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum FeatureKind {
    #[default]
    Vertex = 0,
    Face = 1,
}

/// Identifies the pair of features a contact point came from, so the same
/// point can be recognised on the next step for warm starting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ContactFeature {
    pub index_a: u8,
    pub index_b: u8,
    pub kind_a: FeatureKind,
    pub kind_b: FeatureKind,
}

impl ContactFeature {
    #[must_use]
    pub const fn new(index_a: u8, kind_a: FeatureKind, index_b: u8, kind_b: FeatureKind) -> Self {
        Self { index_a, index_b, kind_a, kind_b }
    }

    /// Same feature pair seen from the other body.
    #[must_use]
    pub const fn flipped(self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            kind_a: self.kind_b,
            kind_b: self.kind_a,
        }
    }

    #[must_use]
    pub fn key(self) -> u32 {
        u32::from(self.index_a)
            | u32::from(self.index_b) << 8
            | (self.kind_a as u32) << 16
            | (self.kind_b as u32) << 24
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactPoint {
    /// World-space contact position, midway between the two surfaces.
    pub point: Vec2,
    /// Penetration depth, `>= 0`. Zero means touching.
    pub depth: f64,
    pub feature: ContactFeature,
}

/// Raw narrow-phase output: normal from A to B and one or two points.
#[derive(Clone, Debug, PartialEq)]
pub struct Collision {
    pub normal: Vec2,
    pub points: Vec<ContactPoint>,
}

impl Collision {
    /// Swap the roles of A and B.
    #[must_use]
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        for p in &mut self.points {
            p.feature = p.feature.flipped();
        }
        self
    }
}

/// Contact manifold between two bodies for the current step.
#[derive(Clone, Debug, PartialEq)]
pub struct Manifold {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Unit normal pointing from A to B.
    pub normal: Vec2,
    pub points: Vec<ContactPoint>,
    /// Combined friction coefficient
    pub friction: f64,
    /// Combined restitution coefficient
    pub restitution: f64,
}

/// Polygons are capped at 255 vertices, so every index fits.
pub(crate) fn feature_index(i: usize) -> u8 {
    u8::try_from(i).unwrap_or(u8::MAX)
}

/// Combine friction coefficients using geometric mean
#[must_use]
pub fn combine_friction(f1: f64, f2: f64) -> f64 {
    (f1 * f2).sqrt()
}

/// Combine restitution coefficients using geometric mean
#[must_use]
pub fn combine_restitution(r1: f64, r2: f64) -> f64 {
    (r1 * r2).sqrt()
}
