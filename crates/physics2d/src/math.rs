//! # Math Primitives
//!
//! Small value types used throughout the engine: a 2D vector, a rotation
//! stored as a normalized cosine/sine pair, and a rigid transform. Everything
//! is `Copy` and uses `f64`.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Scalar z-component of the 3D cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// `self × s` for a scalar `s` treated as a z-axis vector.
    #[must_use]
    pub fn cross_scalar(self, s: f64) -> Self {
        Self::new(s * self.y, -s * self.x)
    }

    /// `s × v` for a scalar `s` treated as a z-axis vector. This is the
    /// velocity of point `v` on a body spinning at `s` rad/s.
    #[must_use]
    pub fn scalar_cross(s: f64, v: Self) -> Self {
        Self::new(-s * v.y, s * v.x)
    }

    /// Counter-clockwise perpendicular.
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` when the length is too
    /// small to divide by.
    #[must_use]
    pub fn try_normalize(self) -> Option<Self> {
        let len = self.length();
        if len > f64::EPSILON {
            Some(self / len)
        } else {
            None
        }
    }

    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;
    fn mul(self, rhs: Vec2) -> Vec2 {
        rhs * self
    }
}

impl MulAssign<f64> for Vec2 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f64> for Vec2 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A planar rotation stored as `(cos θ, sin θ)`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rot2 {
    pub cos: f64,
    pub sin: f64,
}

impl Default for Rot2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rot2 {
    pub const IDENTITY: Self = Self { cos: 1.0, sin: 0.0 };

    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { cos, sin }
    }

    /// Angle in `(-π, π]`.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.sin.atan2(self.cos)
    }

    #[must_use]
    pub fn rotate(self, v: Vec2) -> Vec2 {
        Vec2::new(self.cos * v.x - self.sin * v.y, self.sin * v.x + self.cos * v.y)
    }

    #[must_use]
    pub fn inv_rotate(self, v: Vec2) -> Vec2 {
        Vec2::new(self.cos * v.x + self.sin * v.y, -self.sin * v.x + self.cos * v.y)
    }

    /// Composition: rotate by `other`, then by `self`.
    #[must_use]
    pub fn compose(self, other: Self) -> Self {
        Self {
            cos: self.cos * other.cos - self.sin * other.sin,
            sin: self.sin * other.cos + self.cos * other.sin,
        }
    }

    /// Advance by `delta` radians, renormalizing to keep the pair on the unit
    /// circle.
    #[must_use]
    pub fn integrate(self, delta: f64) -> Self {
        self.compose(Self::from_angle(delta)).normalized()
    }

    #[must_use]
    pub fn normalized(self) -> Self {
        let mag = (self.cos * self.cos + self.sin * self.sin).sqrt();
        if mag > 0.0 && mag.is_finite() {
            Self { cos: self.cos / mag, sin: self.sin / mag }
        } else {
            self
        }
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.cos.is_finite() && self.sin.is_finite()
    }
}

/// Rigid transform: rotation followed by translation.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform2 {
    pub position: Vec2,
    pub rotation: Rot2,
}

impl Transform2 {
    pub const IDENTITY: Self = Self { position: Vec2::ZERO, rotation: Rot2::IDENTITY };

    #[must_use]
    pub fn new(position: Vec2, angle: f64) -> Self {
        Self { position, rotation: Rot2::from_angle(angle) }
    }

    #[must_use]
    pub fn from_position(position: Vec2) -> Self {
        Self { position, rotation: Rot2::IDENTITY }
    }

    /// Local point to world space.
    #[must_use]
    pub fn apply(&self, local: Vec2) -> Vec2 {
        self.rotation.rotate(local) + self.position
    }

    /// World point to local space.
    #[must_use]
    pub fn apply_inverse(&self, world: Vec2) -> Vec2 {
        self.rotation.inv_rotate(world - self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-12
    }

    #[test]
    fn cross_helpers_agree() {
        let v = Vec2::new(2.0, 3.0);
        assert!(close(Vec2::scalar_cross(1.5, v), -v.cross_scalar(1.5)));
        assert!(close(Vec2::scalar_cross(1.0, Vec2::X), Vec2::Y));
        assert_eq!(Vec2::X.cross(Vec2::Y), 1.0);
    }

    #[test]
    fn normalize_rejects_zero() {
        assert!(Vec2::ZERO.try_normalize().is_none());
        let n = Vec2::new(3.0, 4.0).try_normalize().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_round_trips_points() {
        let r = Rot2::from_angle(0.7);
        let p = Vec2::new(-1.25, 4.0);
        assert!(close(r.inv_rotate(r.rotate(p)), p));
        assert!(close(Rot2::from_angle(FRAC_PI_2).rotate(Vec2::X), Vec2::Y));
    }

    #[test]
    fn integrate_wraps_angle() {
        let mut r = Rot2::from_angle(PI - 0.1);
        r = r.integrate(0.2);
        assert!((r.angle() - (-PI + 0.1)).abs() < 1e-12);
        assert!(((r.cos * r.cos + r.sin * r.sin) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn transform_inverse() {
        let xf = Transform2::new(Vec2::new(1.0, -2.0), 1.1);
        let p = Vec2::new(0.3, 0.9);
        assert!(close(xf.apply_inverse(xf.apply(p)), p));
    }
}
