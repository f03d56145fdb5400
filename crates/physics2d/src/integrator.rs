//! # Physics Integration
//!
//! Euler integration, split in two halves around the constraint solver:
//! velocities are advanced from forces and gravity before contacts are
//! solved, and poses are advanced afterwards. With
//! [`Integrator::SemiImplicitEuler`] poses use the solved velocities; with
//! [`Integrator::ExplicitEuler`] they use the velocities the step started
//! with. Only awake, dynamic, non-frozen bodies are touched.

use crate::body::RigidBody;
use crate::body_set::BodySet;
use crate::math::Vec2;

/// Which velocity the position half of a step reads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Integrator {
    /// `x += dt v(t)`: first order, gains energy on oscillators.
    ExplicitEuler,
    /// `x += dt v(t + dt)`: symplectic.
    #[default]
    SemiImplicitEuler,
}

/// Velocity damping rates in 1/s.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Damping {
    pub linear: f64,
    pub angular: f64,
}

/// `v += dt (F/m + g)`, `ω += dt τ/I`, then damping. Force and torque
/// accumulators are cleared on every body once consumed.
pub fn integrate_velocities(bodies: &mut BodySet, gravity: Vec2, dt: f64, damping: Damping) {
    let linear_factor = 1.0 / (1.0 + dt * damping.linear);
    let angular_factor = 1.0 / (1.0 + dt * damping.angular);
    for body in bodies.iter_mut() {
        if body.is_simulated() {
            body.linear_velocity += (body.force * body.inv_mass + gravity) * dt;
            body.angular_velocity += body.torque * body.inv_inertia * dt;
            if damping.linear > 0.0 {
                body.linear_velocity *= linear_factor;
            }
            if damping.angular > 0.0 {
                body.angular_velocity *= angular_factor;
            }
        }
        body.clear_forces();
    }
}

/// `c += dt v`, `q ← q ∘ rot(dt ω)`, with the body origin re-derived from the
/// centroid.
pub fn integrate_positions(bodies: &mut BodySet, dt: f64) {
    for body in bodies.iter_mut().filter(|b| b.is_simulated()) {
        let (v, omega) = (body.linear_velocity, body.angular_velocity);
        advance_pose(body, v, omega, dt);
    }
}

/// Velocities of every body in slot order, taken before
/// [`integrate_velocities`] for explicit Euler.
pub fn snapshot_velocities(bodies: &BodySet, out: &mut Vec<(Vec2, f64)>) {
    out.clear();
    out.extend(bodies.iter().map(|b| (b.linear_velocity, b.angular_velocity)));
}

/// Position half of explicit Euler: poses advance with the velocities from
/// [`snapshot_velocities`] instead of the solved ones.
pub fn integrate_positions_explicit(bodies: &mut BodySet, dt: f64, start: &[(Vec2, f64)]) {
    for (body, &(v, omega)) in bodies.iter_mut().zip(start) {
        if body.is_simulated() {
            advance_pose(body, v, omega, dt);
        }
    }
}

fn advance_pose(body: &mut RigidBody, v: Vec2, omega: f64, dt: f64) {
    let center = body.center + v * dt;
    let rotation = body.transform.rotation.integrate(omega * dt);
    body.set_pose(center, rotation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BodyDesc;
    use crate::shapes::Shape;

    fn one_body(desc: &BodyDesc) -> (BodySet, crate::body::BodyId) {
        let mut set = BodySet::new();
        let id = set.insert(desc).unwrap();
        (set, id)
    }

    #[test]
    fn semi_implicit_euler_uses_new_velocity() {
        let (mut set, id) = one_body(&BodyDesc::dynamic(Shape::circle(0.5).unwrap(), 2.0));
        let g = Vec2::new(0.0, -10.0);
        integrate_velocities(&mut set, g, 0.1, Damping::default());
        integrate_positions(&mut set, 0.1);
        let body = set.get(id).unwrap();
        assert!((body.linear_velocity().y + 1.0).abs() < 1e-12);
        assert!((body.center_of_mass().y + 0.1).abs() < 1e-12);
    }

    #[test]
    fn explicit_euler_uses_start_velocity() {
        let desc = BodyDesc::dynamic(Shape::circle(0.5).unwrap(), 2.0).linear_velocity(Vec2::new(1.0, 0.0));
        let (mut set, id) = one_body(&desc);
        let mut start = Vec::new();
        snapshot_velocities(&set, &mut start);
        integrate_velocities(&mut set, Vec2::new(0.0, -10.0), 0.1, Damping::default());
        integrate_positions_explicit(&mut set, 0.1, &start);
        let body = set.get(id).unwrap();
        assert!((body.linear_velocity().y + 1.0).abs() < 1e-12);
        assert!((body.center_of_mass().x - 0.1).abs() < 1e-12);
        assert!(body.center_of_mass().y.abs() < 1e-12);
    }

    #[test]
    fn forces_are_consumed() {
        let (mut set, id) = one_body(&BodyDesc::dynamic(Shape::circle(0.5).unwrap(), 2.0));
        set.get_mut(id).unwrap().apply_force_to_center(Vec2::new(4.0, 0.0));
        integrate_velocities(&mut set, Vec2::ZERO, 0.5, Damping::default());
        assert!((set.get(id).unwrap().linear_velocity().x - 1.0).abs() < 1e-12);
        integrate_velocities(&mut set, Vec2::ZERO, 0.5, Damping::default());
        assert!((set.get(id).unwrap().linear_velocity().x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn damping_slows_bodies() {
        let desc = BodyDesc::dynamic(Shape::circle(0.5).unwrap(), 1.0)
            .linear_velocity(Vec2::new(2.0, 0.0))
            .angular_velocity(3.0);
        let (mut set, id) = one_body(&desc);
        let damping = Damping { linear: 1.0, angular: 1.0 };
        integrate_velocities(&mut set, Vec2::ZERO, 1.0, damping);
        let body = set.get(id).unwrap();
        assert!((body.linear_velocity().x - 1.0).abs() < 1e-12);
        assert!((body.angular_velocity() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn static_bodies_do_not_move() {
        let (mut set, id) = one_body(&BodyDesc::fixed(Shape::rectangle(1.0, 1.0).unwrap()));
        let before = set.get(id).unwrap().state();
        integrate_velocities(&mut set, Vec2::new(0.0, -9.81), 1.0 / 60.0, Damping::default());
        integrate_positions(&mut set, 1.0 / 60.0);
        assert_eq!(set.get(id).unwrap().state(), before);
    }
}
