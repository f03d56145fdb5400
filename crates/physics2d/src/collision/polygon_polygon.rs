//! Polygon-polygon contact: separating axis test followed by reference/incident
//! edge clipping.

use super::{feature_index, Collision, ContactFeature, ContactPoint, FeatureKind};
use crate::math::{Transform2, Vec2};
use crate::shapes::Polygon;

/// B's face is only chosen as the reference when it beats A's by this much,
/// which keeps the choice stable for nearly symmetric overlaps.
const REFERENCE_FACE_TOLERANCE: f64 = 5e-4;

struct WorldPolygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
}

impl WorldPolygon {
    fn new(polygon: &Polygon, xf: &Transform2) -> Self {
        Self {
            vertices: polygon.vertices().iter().map(|&v| xf.apply(v)).collect(),
            normals: polygon.normals().iter().map(|&n| xf.rotation.rotate(n)).collect(),
        }
    }

    fn len(&self) -> usize {
        self.vertices.len()
    }
}

#[derive(Copy, Clone, Debug)]
struct ClipVertex {
    point: Vec2,
    feature: ContactFeature,
}

/// Detect contact between two convex polygons. Produces up to two points and
/// a normal pointing from A to B.
#[must_use]
pub fn collide_polygons(
    a: &Polygon,
    xf_a: &Transform2,
    b: &Polygon,
    xf_b: &Transform2,
) -> Option<Collision> {
    let poly_a = WorldPolygon::new(a, xf_a);
    let poly_b = WorldPolygon::new(b, xf_b);

    let (separation_a, edge_a) = max_separation(&poly_a, &poly_b);
    if separation_a > 0.0 {
        return None;
    }
    let (separation_b, edge_b) = max_separation(&poly_b, &poly_a);
    if separation_b > 0.0 {
        return None;
    }

    let flip = separation_b > separation_a + REFERENCE_FACE_TOLERANCE;
    let (reference, incident, edge) = if flip {
        (&poly_b, &poly_a, edge_b)
    } else {
        (&poly_a, &poly_b, edge_a)
    };

    let incident_edge = find_incident_edge(reference, edge, incident);

    let v11 = reference.vertices[edge];
    let v12 = reference.vertices[(edge + 1) % reference.len()];
    let tangent = (v12 - v11).try_normalize()?;
    let normal = tangent.cross_scalar(1.0);

    let front_offset = normal.dot(v11);
    let side_offset_1 = -tangent.dot(v11);
    let side_offset_2 = tangent.dot(v12);

    let clipped = clip_segment(incident_edge, -tangent, side_offset_1, edge)?;
    let clipped = clip_segment(clipped, tangent, side_offset_2, (edge + 1) % reference.len())?;

    let points: Vec<ContactPoint> = clipped
        .iter()
        .filter_map(|cv| {
            let separation = normal.dot(cv.point) - front_offset;
            (separation <= 0.0).then(|| ContactPoint {
                point: cv.point - normal * (0.5 * separation),
                depth: -separation,
                feature: if flip { cv.feature.flipped() } else { cv.feature },
            })
        })
        .collect();

    if points.is_empty() {
        return None;
    }
    Some(Collision {
        normal: if flip { -normal } else { normal },
        points,
    })
}

/// Largest separation of `b` along any face normal of `a`, and that face.
fn max_separation(a: &WorldPolygon, b: &WorldPolygon) -> (f64, usize) {
    let mut best = f64::NEG_INFINITY;
    let mut best_edge = 0;
    for (i, (&n, &v)) in a.normals.iter().zip(&a.vertices).enumerate() {
        let s = b
            .vertices
            .iter()
            .map(|&w| n.dot(w - v))
            .fold(f64::INFINITY, f64::min);
        if s > best {
            best = s;
            best_edge = i;
        }
    }
    (best, best_edge)
}

/// The incident edge is the edge of `incident` most anti-parallel to the
/// reference face normal.
fn find_incident_edge(reference: &WorldPolygon, edge: usize, incident: &WorldPolygon) -> [ClipVertex; 2] {
    let reference_normal = reference.normals[edge];
    let mut index = 0;
    let mut min_dot = f64::INFINITY;
    for (i, n) in incident.normals.iter().enumerate() {
        let d = reference_normal.dot(*n);
        if d < min_dot {
            min_dot = d;
            index = i;
        }
    }
    let next = (index + 1) % incident.len();
    let edge = feature_index(edge);
    [
        ClipVertex {
            point: incident.vertices[index],
            feature: ContactFeature::new(edge, FeatureKind::Face, feature_index(index), FeatureKind::Vertex),
        },
        ClipVertex {
            point: incident.vertices[next],
            feature: ContactFeature::new(edge, FeatureKind::Face, feature_index(next), FeatureKind::Vertex),
        },
    ]
}

/// Sutherland-Hodgman clip of a segment against the half-plane
/// `dot(normal, p) <= offset`. Returns `None` when fewer than two points
/// survive.
fn clip_segment(
    input: [ClipVertex; 2],
    normal: Vec2,
    offset: f64,
    reference_vertex: usize,
) -> Option<[ClipVertex; 2]> {
    let [v0, v1] = input;
    let d0 = normal.dot(v0.point) - offset;
    let d1 = normal.dot(v1.point) - offset;

    let mut out = [v0; 2];
    let mut count = 0;
    for (v, d) in [(v0, d0), (v1, d1)] {
        if d <= 0.0 {
            out[count] = v;
            count += 1;
        }
    }

    if d0 * d1 < 0.0 && count < 2 {
        let t = d0 / (d0 - d1);
        out[count] = ClipVertex {
            point: v0.point + (v1.point - v0.point) * t,
            feature: ContactFeature::new(
                feature_index(reference_vertex),
                FeatureKind::Vertex,
                v0.feature.index_b,
                FeatureKind::Face,
            ),
        };
        count += 1;
    }

    (count == 2).then_some(out)
}
