//! # Force Generators
//!
//! Persistent force sources evaluated at the start of every step, before
//! velocities are integrated. Generators only push on awake dynamic bodies
//! and never wake anything.

use crate::body::BodyId;
use crate::body_set::BodySet;
use crate::error::{PhysicsError, Result};
use crate::math::Vec2;

/// Ends closer than this exert no spring force.
const MIN_SPRING_LENGTH: f64 = 1e-6;

pub trait ForceGenerator: Send {
    /// Add this generator's forces to the bodies' accumulators.
    fn apply(&self, bodies: &mut BodySet);
}

/// One end of a [`Spring`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SpringEnd {
    /// Attached to a body's center of mass.
    Body(BodyId),
    /// Fixed world-space point.
    Anchor(Vec2),
}

/// Damped Hooke spring: `F = -k (|d| - rest) d̂ - c (v_rel · d̂) d̂`.
#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
    pub a: SpringEnd,
    pub b: SpringEnd,
    pub stiffness: f64,
    pub damping: f64,
    pub rest_length: f64,
}

impl Spring {
    pub fn new(a: SpringEnd, b: SpringEnd, stiffness: f64, damping: f64, rest_length: f64) -> Result<Self> {
        if !(non_negative(stiffness) && non_negative(damping) && non_negative(rest_length)) {
            return Err(PhysicsError::InvalidConfig(
                "spring stiffness, damping and rest length must be finite and >= 0",
            ));
        }
        Ok(Self { a, b, stiffness, damping, rest_length })
    }

    pub fn between(a: BodyId, b: BodyId, stiffness: f64, damping: f64, rest_length: f64) -> Result<Self> {
        Self::new(SpringEnd::Body(a), SpringEnd::Body(b), stiffness, damping, rest_length)
    }

    pub fn to_anchor(body: BodyId, anchor: Vec2, stiffness: f64, damping: f64, rest_length: f64) -> Result<Self> {
        Self::new(SpringEnd::Body(body), SpringEnd::Anchor(anchor), stiffness, damping, rest_length)
    }

    /// Position and velocity of an end, or `None` if its body is gone.
    fn end_state(end: SpringEnd, bodies: &BodySet) -> Option<(Vec2, Vec2)> {
        match end {
            SpringEnd::Body(id) => {
                let body = bodies.get(id).ok()?;
                Some((body.center_of_mass(), body.linear_velocity()))
            }
            SpringEnd::Anchor(p) => Some((p, Vec2::ZERO)),
        }
    }

    /// Force acting on end A; end B receives the opposite.
    #[must_use]
    pub fn force_on_a(&self, bodies: &BodySet) -> Option<Vec2> {
        let (pa, va) = Self::end_state(self.a, bodies)?;
        let (pb, vb) = Self::end_state(self.b, bodies)?;
        let displacement = pa - pb;
        let distance = displacement.length();
        if distance < MIN_SPRING_LENGTH {
            return None;
        }
        let direction = displacement / distance;
        let extension = distance - self.rest_length;
        let axial_speed = (va - vb).dot(direction);
        Some(direction * (-self.stiffness * extension - self.damping * axial_speed))
    }
}

impl ForceGenerator for Spring {
    fn apply(&self, bodies: &mut BodySet) {
        let Some(force) = self.force_on_a(bodies) else {
            return;
        };
        for (end, f) in [(self.a, force), (self.b, -force)] {
            if let SpringEnd::Body(id) = end {
                if let Ok(body) = bodies.get_mut(id) {
                    let center = body.center_of_mass();
                    body.accumulate_force(f, center);
                }
            }
        }
    }
}

/// Velocity-proportional drag on every moving body: `F = -k v`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LinearDrag {
    pub coefficient: f64,
}

impl LinearDrag {
    pub fn new(coefficient: f64) -> Result<Self> {
        if !non_negative(coefficient) {
            return Err(PhysicsError::InvalidConfig("drag coefficient must be finite and >= 0"));
        }
        Ok(Self { coefficient })
    }
}

impl ForceGenerator for LinearDrag {
    fn apply(&self, bodies: &mut BodySet) {
        for body in bodies.iter_mut() {
            let force = body.linear_velocity() * -self.coefficient;
            let center = body.center_of_mass();
            body.accumulate_force(force, center);
        }
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BodyDesc;
    use crate::shapes::Shape;

    fn ball(set: &mut BodySet, position: Vec2) -> BodyId {
        set.insert(&BodyDesc::dynamic(Shape::circle(0.1).unwrap(), 1.0).position(position))
            .unwrap()
    }

    #[test]
    fn stretched_spring_pulls_ends_together() {
        let mut set = BodySet::new();
        let a = ball(&mut set, Vec2::ZERO);
        let b = ball(&mut set, Vec2::new(3.0, 0.0));
        let spring = Spring::between(a, b, 10.0, 0.0, 2.0).unwrap();
        spring.apply(&mut set);
        assert!((set.get(a).unwrap().force.x - 10.0).abs() < 1e-12);
        assert!((set.get(b).unwrap().force.x + 10.0).abs() < 1e-12);
    }

    #[test]
    fn anchored_spring_damps_motion() {
        let mut set = BodySet::new();
        let a = ball(&mut set, Vec2::new(0.0, -1.0));
        set.get_mut(a).unwrap().set_linear_velocity(Vec2::new(0.0, -2.0));
        let spring = Spring::to_anchor(a, Vec2::ZERO, 0.0, 0.5, 1.0).unwrap();
        spring.apply(&mut set);
        assert!((set.get(a).unwrap().force.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn drag_opposes_velocity_and_skips_sleepers() {
        let mut set = BodySet::new();
        let a = ball(&mut set, Vec2::ZERO);
        let b = ball(&mut set, Vec2::new(5.0, 0.0));
        set.get_mut(a).unwrap().set_linear_velocity(Vec2::new(2.0, 0.0));
        set.get_mut(b).unwrap().sleep();
        LinearDrag::new(0.5).unwrap().apply(&mut set);
        assert!((set.get(a).unwrap().force.x + 1.0).abs() < 1e-12);
        assert_eq!(set.get(b).unwrap().force, Vec2::ZERO);
        assert!(!set.get(b).unwrap().is_awake());
    }

    #[test]
    fn rejects_negative_parameters() {
        assert!(LinearDrag::new(-1.0).is_err());
        let id = BodyId { index: 0, generation: 0 };
        assert!(Spring::to_anchor(id, Vec2::ZERO, -1.0, 0.0, 1.0).is_err());
        assert!(Spring::to_anchor(id, Vec2::ZERO, 1.0, f64::NAN, 1.0).is_err());
    }
}
