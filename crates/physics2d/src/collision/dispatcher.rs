//! Collision detection dispatcher that routes to appropriate algorithms

use super::{
    collide_circles, collide_polygon_circle, collide_polygons, combine_friction, combine_restitution,
    Collision, Manifold,
};
use crate::body::RigidBody;
use crate::body_set::BodySet;
use crate::math::Transform2;
use crate::shapes::Shape;

/// Detect contact between two posed shapes. The returned normal points from
/// A to B regardless of which routine handled the pair.
#[must_use]
pub fn collide(shape_a: &Shape, xf_a: &Transform2, shape_b: &Shape, xf_b: &Transform2) -> Option<Collision> {
    match (shape_a, shape_b) {
        (Shape::Circle(a), Shape::Circle(b)) => collide_circles(xf_a.position, a.radius, xf_b.position, b.radius),
        (Shape::Polygon(a), Shape::Circle(b)) => collide_polygon_circle(a, xf_a, xf_b.position, b.radius),
        (Shape::Circle(a), Shape::Polygon(b)) => {
            collide_polygon_circle(b, xf_b, xf_a.position, a.radius).map(Collision::flipped)
        }
        (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(a, xf_a, b, xf_b),
    }
}

/// Contact manifold for two bodies, with mixed material, if they touch.
#[must_use]
pub fn collide_bodies(a: &RigidBody, b: &RigidBody) -> Option<Manifold> {
    let collision = collide(a.shape(), a.transform(), b.shape(), b.transform())?;
    let (ma, mb) = (a.material(), b.material());
    Some(Manifold {
        body_a: a.id(),
        body_b: b.id(),
        normal: collision.normal,
        points: collision.points,
        friction: combine_friction(ma.friction, mb.friction),
        restitution: combine_restitution(ma.restitution, mb.restitution),
    })
}

/// Run the narrow phase over broad-phase candidates, appending one manifold
/// per touching pair in candidate order.
pub(crate) fn build_manifolds(pairs: &[(usize, usize)], bodies: &BodySet, out: &mut Vec<Manifold>) {
    out.clear();
    for &(ia, ib) in pairs {
        let (Some(a), Some(b)) = (bodies.by_index(ia), bodies.by_index(ib)) else {
            continue;
        };
        if let Some(manifold) = collide_bodies(a, b) {
            out.push(manifold);
        }
    }
}
