//! Contact constraint: non-penetration plus Coulomb friction, per manifold.

use super::{apply_position_impulse, apply_velocity_impulse, effective_mass, ContactImpulse, ContactKey, SolverConstraint};
use crate::body::BodyId;
use crate::body_set::BodySet;
use crate::collision::Manifold;
use crate::config::SolverConfig;
use crate::math::Vec2;

#[derive(Copy, Clone, Debug)]
struct ContactPointConstraint {
    feature: u32,
    /// Arms from each centroid to the contact point, world space.
    r_a: Vec2,
    r_b: Vec2,
    /// Surface points in each body's frame, relative to the centroid.
    local_a: Vec2,
    local_b: Vec2,
    normal_mass: f64,
    tangent_mass: f64,
    velocity_bias: f64,
    normal_impulse: f64,
    tangent_impulse: f64,
}

/// Final impulses of one contact point after the velocity solve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointImpulse {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Packed feature id of the point.
    pub feature: u32,
    pub normal_impulse: f64,
    pub tangent_impulse: f64,
}

#[derive(Clone, Debug)]
pub struct ContactConstraint {
    body_a: BodyId,
    body_b: BodyId,
    index_a: usize,
    index_b: usize,
    normal: Vec2,
    tangent: Vec2,
    friction: f64,
    points: Vec<ContactPointConstraint>,
}

impl ContactConstraint {
    /// Build the constraint for `manifold`, seeding accumulated impulses from
    /// `lookup`. Returns `None` when a body is gone or neither side can move.
    pub(crate) fn new(
        manifold: &Manifold,
        bodies: &BodySet,
        config: &SolverConfig,
        lookup: impl Fn(&ContactKey) -> ContactImpulse,
    ) -> Option<Self> {
        let a = bodies.get(manifold.body_a).ok()?;
        let b = bodies.get(manifold.body_b).ok()?;
        if !(a.is_simulated() || b.is_simulated()) {
            return None;
        }

        let normal = manifold.normal;
        let tangent = normal.cross_scalar(1.0);
        let points = manifold
            .points
            .iter()
            .map(|p| {
                let r_a = p.point - a.center;
                let r_b = p.point - b.center;
                let half_depth = normal * (0.5 * p.depth);
                let surface_a = p.point + half_depth;
                let surface_b = p.point - half_depth;

                let relative = b.velocity_at(p.point) - a.velocity_at(p.point);
                let approach = relative.dot(normal);
                let bounces = approach < -config.restitution_threshold
                    || (manifold.restitution >= 1.0 && approach < 0.0);
                let velocity_bias = if bounces {
                    -manifold.restitution * approach
                } else {
                    0.0
                };

                let feature = p.feature.key();
                let cached = lookup(&(manifold.body_a, manifold.body_b, feature));
                ContactPointConstraint {
                    feature,
                    r_a,
                    r_b,
                    local_a: a.transform.rotation.inv_rotate(surface_a - a.center),
                    local_b: b.transform.rotation.inv_rotate(surface_b - b.center),
                    normal_mass: effective_mass(a, b, r_a, r_b, normal),
                    tangent_mass: effective_mass(a, b, r_a, r_b, tangent),
                    velocity_bias,
                    normal_impulse: cached.normal * config.warm_start_scale,
                    tangent_impulse: cached.tangent * config.warm_start_scale,
                }
            })
            .collect();

        Some(Self {
            body_a: manifold.body_a,
            body_b: manifold.body_b,
            index_a: manifold.body_a.index(),
            index_b: manifold.body_b.index(),
            normal,
            tangent,
            friction: manifold.friction,
            points,
        })
    }

    #[must_use]
    pub fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_a, self.body_b)
    }

    pub fn point_impulses(&self) -> impl Iterator<Item = PointImpulse> + '_ {
        self.points.iter().map(|p| PointImpulse {
            body_a: self.body_a,
            body_b: self.body_b,
            feature: p.feature,
            normal_impulse: p.normal_impulse,
            tangent_impulse: p.tangent_impulse,
        })
    }
}

impl SolverConstraint for ContactConstraint {
    fn warm_start(&mut self, bodies: &mut BodySet) {
        let Some((a, b)) = bodies.pair_mut(self.index_a, self.index_b) else {
            return;
        };
        for p in &self.points {
            let impulse = self.normal * p.normal_impulse + self.tangent * p.tangent_impulse;
            apply_velocity_impulse(a, b, p.r_a, p.r_b, impulse);
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodySet) {
        let Some((a, b)) = bodies.pair_mut(self.index_a, self.index_b) else {
            return;
        };
        for p in &mut self.points {
            // Normal: accumulated impulse never pulls.
            let relative = b.velocity_at(b.center + p.r_b) - a.velocity_at(a.center + p.r_a);
            let vn = relative.dot(self.normal);
            let lambda = -p.normal_mass * (vn - p.velocity_bias);
            let accumulated = (p.normal_impulse + lambda).max(0.0);
            let lambda = accumulated - p.normal_impulse;
            p.normal_impulse = accumulated;
            apply_velocity_impulse(a, b, p.r_a, p.r_b, self.normal * lambda);

            // Friction, bounded by the current normal impulse.
            let relative = b.velocity_at(b.center + p.r_b) - a.velocity_at(a.center + p.r_a);
            let vt = relative.dot(self.tangent);
            let lambda = -p.tangent_mass * vt;
            let max_friction = self.friction * p.normal_impulse;
            let accumulated = (p.tangent_impulse + lambda).max(-max_friction).min(max_friction);
            let lambda = accumulated - p.tangent_impulse;
            p.tangent_impulse = accumulated;
            apply_velocity_impulse(a, b, p.r_a, p.r_b, self.tangent * lambda);
        }
    }

    fn solve_position(&mut self, bodies: &mut BodySet, config: &SolverConfig) -> bool {
        let Some((a, b)) = bodies.pair_mut(self.index_a, self.index_b) else {
            return true;
        };
        let mut min_separation = 0.0_f64;
        for p in &self.points {
            let surface_a = a.center + a.transform.rotation.rotate(p.local_a);
            let surface_b = b.center + b.transform.rotation.rotate(p.local_b);
            let separation = (surface_b - surface_a).dot(self.normal);
            min_separation = min_separation.min(separation);

            let point = surface_a.lerp(surface_b, 0.5);
            let r_a = point - a.center;
            let r_b = point - b.center;
            let correction = (config.baumgarte * (separation + config.linear_slop))
                .clamp(-config.max_linear_correction, 0.0);
            let mass = effective_mass(a, b, r_a, r_b, self.normal);
            let impulse = -correction * mass;
            apply_position_impulse(a, b, r_a, r_b, self.normal * impulse);
        }
        min_separation >= -3.0 * config.linear_slop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BodyDesc;
    use crate::collision::dispatcher::collide_bodies;
    use crate::shapes::Shape;

    fn head_on(restitution: f64) -> (BodySet, Manifold) {
        let mut set = BodySet::new();
        let shape = Shape::circle(0.5).unwrap();
        let desc = BodyDesc::dynamic(shape, 1.0).restitution(restitution).friction(0.0);
        let a = set.insert(&desc.clone().linear_velocity(Vec2::new(5.0, 0.0))).unwrap();
        let b = set.insert(&desc.position(Vec2::new(0.99, 0.0))).unwrap();
        let m = collide_bodies(set.get(a).unwrap(), set.get(b).unwrap()).unwrap();
        (set, m)
    }

    #[test]
    fn elastic_contact_exchanges_velocity() {
        let (mut set, m) = head_on(1.0);
        let config = SolverConfig::default();
        let mut c = ContactConstraint::new(&m, &set, &config, |_| ContactImpulse::default()).unwrap();
        for _ in 0..8 {
            c.solve_velocity(&mut set);
        }
        let (a, b) = c.bodies();
        assert!(set.get(a).unwrap().linear_velocity().length() < 1e-12);
        assert!((set.get(b).unwrap().linear_velocity().x - 5.0).abs() < 1e-12);
    }

    #[test]
    fn inelastic_contact_never_pulls() {
        let (mut set, m) = head_on(0.0);
        let config = SolverConfig::default();
        let mut c = ContactConstraint::new(&m, &set, &config, |_| ContactImpulse::default()).unwrap();
        for _ in 0..8 {
            c.solve_velocity(&mut set);
            assert!(c.point_impulses().all(|p| p.normal_impulse >= 0.0));
        }
        let (a, b) = c.bodies();
        let va = set.get(a).unwrap().linear_velocity().x;
        let vb = set.get(b).unwrap().linear_velocity().x;
        assert!((va - 2.5).abs() < 1e-12);
        assert!((vb - 2.5).abs() < 1e-12);
    }

    #[test]
    fn position_pass_reduces_penetration() {
        let (mut set, m) = head_on(0.0);
        let config = SolverConfig::default();
        let depth_before = m.points[0].depth;
        let mut c = ContactConstraint::new(&m, &set, &config, |_| ContactImpulse::default()).unwrap();
        for _ in 0..100 {
            c.solve_position(&mut set, &config);
        }
        let (a, b) = c.bodies();
        let m2 = collide_bodies(set.get(a).unwrap(), set.get(b).unwrap()).unwrap();
        assert!(m2.points[0].depth < depth_before);
        assert!(m2.points[0].depth <= config.linear_slop + 1e-6);
    }
}
