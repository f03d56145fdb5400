//! Polygon-circle contact

use super::{feature_index, Collision, ContactFeature, ContactPoint, FeatureKind};
use crate::math::{Transform2, Vec2};
use crate::shapes::Polygon;

/// Detect contact between a convex polygon (A) and a circle (B).
///
/// The circle center is classified against the polygon's Voronoi regions:
/// inside, beyond a face, or beyond a vertex. The normal points from the
/// polygon to the circle.
#[must_use]
pub fn collide_polygon_circle(
    polygon: &Polygon,
    xf: &Transform2,
    center: Vec2,
    radius: f64,
) -> Option<Collision> {
    let c = xf.apply_inverse(center);
    let vertices = polygon.vertices();
    let normals = polygon.normals();
    let n = vertices.len();

    // Face with the largest separation from the center.
    let mut separation = f64::NEG_INFINITY;
    let mut face = 0;
    for i in 0..n {
        let s = normals[i].dot(c - vertices[i]);
        if s > radius {
            return None;
        }
        if s > separation {
            separation = s;
            face = i;
        }
    }

    let next = (face + 1) % n;
    let v1 = vertices[face];
    let v2 = vertices[next];
    let face_feature = (face, FeatureKind::Face);

    let (normal, surface, depth, (index, kind)) = if separation <= 0.0 {
        // Center inside the polygon: push out through the nearest face.
        let normal = normals[face];
        (normal, c - normal * separation, radius - separation, face_feature)
    } else if (c - v1).dot(v2 - v1) <= 0.0 {
        vertex_region(c, v1, radius, normals[face], face)?
    } else if (c - v2).dot(v1 - v2) <= 0.0 {
        vertex_region(c, v2, radius, normals[face], next)?
    } else {
        let normal = normals[face];
        (normal, c - normal * separation, radius - separation, face_feature)
    };

    let normal = xf.rotation.rotate(normal);
    let surface_a = xf.apply(surface);
    let surface_b = center - normal * radius;
    Some(Collision {
        normal,
        points: vec![ContactPoint {
            point: surface_a.lerp(surface_b, 0.5),
            depth,
            feature: ContactFeature::new(feature_index(index), kind, 0, FeatureKind::Vertex),
        }],
    })
}

type RegionHit = (Vec2, Vec2, f64, (usize, FeatureKind));

fn vertex_region(c: Vec2, vertex: Vec2, radius: f64, face_normal: Vec2, index: usize) -> Option<RegionHit> {
    let delta = c - vertex;
    let distance = delta.length();
    if distance > radius {
        return None;
    }
    // A center sitting exactly on the vertex has no direction; use the face.
    let normal = delta.try_normalize().unwrap_or(face_normal);
    Some((normal, vertex, radius - distance, (index, FeatureKind::Vertex)))
}
