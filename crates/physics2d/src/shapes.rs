//! # Collision Shapes
//!
//! Geometric description of a body's collider. Shapes are validated on
//! construction and never mutated afterwards, so a single `Arc<Shape>` can be
//! shared by any number of bodies.

use crate::collision::Aabb;
use crate::error::{PhysicsError, Result};
use crate::math::{Transform2, Vec2};

/// Edges shorter than this are treated as duplicate vertices.
const MIN_EDGE_LENGTH: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Polygon(Polygon),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Circle {
    pub radius: f64,
}

/// Convex polygon in body-local coordinates, counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    centroid: Vec2,
    area: f64,
}

/// Mass, rotational inertia about the centroid, and the centroid itself.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MassProperties {
    pub mass: f64,
    pub inertia: f64,
    pub local_center: Vec2,
}

impl Shape {
    pub fn circle(radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(PhysicsError::DegenerateShape("circle radius must be finite and > 0"));
        }
        Ok(Self::Circle(Circle { radius }))
    }

    pub fn polygon(vertices: &[Vec2]) -> Result<Self> {
        Polygon::new(vertices).map(Self::Polygon)
    }

    /// Axis-aligned box centered on the body origin.
    pub fn rectangle(half_width: f64, half_height: f64) -> Result<Self> {
        Polygon::rectangle(half_width, half_height).map(Self::Polygon)
    }

    /// Checks a shape that may have been built without its constructor, as
    /// `Shape::Circle(Circle { radius })` can be.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Circle(c) => Self::circle(c.radius).map(drop),
            Self::Polygon(_) => Ok(()),
        }
    }

    #[must_use]
    pub fn mass_properties(&self, mass: f64) -> MassProperties {
        match self {
            Self::Circle(c) => MassProperties {
                mass,
                inertia: 0.5 * mass * c.radius * c.radius,
                local_center: Vec2::ZERO,
            },
            Self::Polygon(p) => MassProperties {
                mass,
                inertia: p.inertia_about_centroid(mass),
                local_center: p.centroid,
            },
        }
    }

    #[must_use]
    pub fn aabb(&self, xf: &Transform2) -> Aabb {
        match self {
            Self::Circle(c) => {
                let ext = Vec2::new(c.radius, c.radius);
                Aabb::new(xf.position - ext, xf.position + ext)
            }
            Self::Polygon(p) => {
                let first = xf.apply(p.vertices[0]);
                let (min, max) = p.vertices[1..]
                    .iter()
                    .map(|&v| xf.apply(v))
                    .fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
                Aabb::new(min, max)
            }
        }
    }

    /// Farthest point of the shape along `direction`, in world space.
    #[must_use]
    pub fn support_point(&self, xf: &Transform2, direction: Vec2) -> Vec2 {
        match self {
            Self::Circle(c) => {
                let dir = direction.try_normalize().unwrap_or(Vec2::Y);
                xf.position + dir * c.radius
            }
            Self::Polygon(p) => {
                let local_dir = xf.rotation.inv_rotate(direction);
                xf.apply(p.vertices[p.support_index(local_dir)])
            }
        }
    }
}

impl Polygon {
    pub fn new(input: &[Vec2]) -> Result<Self> {
        if input.len() < 3 {
            return Err(PhysicsError::DegenerateShape("polygon needs at least 3 vertices"));
        }
        if input.len() > usize::from(u8::MAX) {
            return Err(PhysicsError::DegenerateShape("polygon has too many vertices"));
        }
        if input.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::DegenerateShape("polygon vertex is not finite"));
        }

        let mut vertices = input.to_vec();
        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }

        let n = vertices.len();
        let mut normals = Vec::with_capacity(n);
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            if edge.length() < MIN_EDGE_LENGTH {
                return Err(PhysicsError::DegenerateShape("polygon has duplicate vertices"));
            }
            let next_edge = vertices[(i + 2) % n] - vertices[(i + 1) % n];
            if edge.cross(next_edge) <= 0.0 {
                return Err(PhysicsError::DegenerateShape("polygon is not strictly convex"));
            }
            normals.push(edge.cross_scalar(1.0) / edge.length());
        }

        let (centroid, area) = centroid_and_area(&vertices);
        if area <= 0.0 {
            return Err(PhysicsError::DegenerateShape("polygon has zero area"));
        }
        Ok(Self { vertices, normals, centroid, area })
    }

    pub fn rectangle(half_width: f64, half_height: f64) -> Result<Self> {
        if !(half_width.is_finite() && half_height.is_finite() && half_width > 0.0 && half_height > 0.0) {
            return Err(PhysicsError::DegenerateShape("rectangle extents must be finite and > 0"));
        }
        Self::new(&[
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ])
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Outward unit normal of edge `i` (from vertex `i` to vertex `i + 1`).
    #[must_use]
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    #[must_use]
    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    pub(crate) fn support_index(&self, local_dir: Vec2) -> usize {
        let mut best = 0;
        let mut best_dot = self.vertices[0].dot(local_dir);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let d = v.dot(local_dir);
            if d > best_dot {
                best = i;
                best_dot = d;
            }
        }
        best
    }

    /// Polar moment of inertia about the centroid for a uniform density body
    /// of the given mass, integrated over a triangle fan.
    fn inertia_about_centroid(&self, mass: f64) -> f64 {
        let origin = self.vertices[0];
        let n = self.vertices.len();
        let mut area = 0.0;
        let mut center = Vec2::ZERO;
        let mut inertia = 0.0;
        for i in 1..n - 1 {
            let e1 = self.vertices[i] - origin;
            let e2 = self.vertices[i + 1] - origin;
            let d = e1.cross(e2);
            let tri_area = 0.5 * d;
            area += tri_area;
            center += (e1 + e2) * (tri_area / 3.0);
            let int_x2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let int_y2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
            inertia += (0.25 / 3.0) * d * (int_x2 + int_y2);
        }
        center = center / area;
        let density = mass / area;
        density * inertia - mass * center.length_squared()
    }
}

fn signed_area(vertices: &[Vec2]) -> f64 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].cross(vertices[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

fn centroid_and_area(vertices: &[Vec2]) -> (Vec2, f64) {
    let origin = vertices[0];
    let mut area = 0.0;
    let mut center = Vec2::ZERO;
    for i in 1..vertices.len() - 1 {
        let e1 = vertices[i] - origin;
        let e2 = vertices[i + 1] - origin;
        let tri_area = 0.5 * e1.cross(e2);
        area += tri_area;
        center += (e1 + e2) * (tri_area / 3.0);
    }
    if area > 0.0 {
        (origin + center / area, area)
    } else {
        (origin, area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_circles() {
        assert!(Shape::circle(0.0).is_err());
        assert!(Shape::circle(-1.0).is_err());
        assert!(Shape::circle(f64::NAN).is_err());
        assert!(Shape::circle(0.25).is_ok());
    }

    #[test]
    fn rejects_degenerate_polygons() {
        let two = [Vec2::ZERO, Vec2::X];
        assert_eq!(
            Shape::polygon(&two),
            Err(PhysicsError::DegenerateShape("polygon needs at least 3 vertices"))
        );

        let collinear = [Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)];
        assert!(Shape::polygon(&collinear).is_err());

        // Arrow head: reflex vertex at (0.5, 0.5).
        let concave = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.5, 0.5),
            Vec2::new(0.0, 1.0),
        ];
        assert_eq!(
            Shape::polygon(&concave),
            Err(PhysicsError::DegenerateShape("polygon is not strictly convex"))
        );
    }

    #[test]
    fn clockwise_input_is_reordered() {
        let cw = [Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0)];
        let Shape::Polygon(p) = Shape::polygon(&cw).unwrap() else {
            panic!("expected polygon");
        };
        assert!(signed_area(p.vertices()) > 0.0);
        for (v, n) in p.vertices().iter().zip(p.normals()) {
            // Every normal points away from the centroid.
            assert!(n.dot(*v - p.centroid()) > 0.0);
        }
    }

    #[test]
    fn box_inertia_matches_closed_form() {
        let shape = Shape::rectangle(1.0, 0.5).unwrap();
        let props = shape.mass_properties(3.0);
        let expected = 3.0 * (2.0f64.powi(2) + 1.0f64.powi(2)) / 12.0;
        assert!((props.inertia - expected).abs() < 1e-12, "{}", props.inertia);
        assert!(props.local_center.length() < 1e-12);
    }

    #[test]
    fn offset_polygon_inertia_is_about_centroid() {
        let offset = Vec2::new(5.0, -3.0);
        let square: Vec<Vec2> = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .iter()
            .map(|&(x, y)| Vec2::new(x, y) + offset)
            .collect();
        let props = Shape::polygon(&square).unwrap().mass_properties(2.0);
        assert!((props.local_center - offset).length() < 1e-12);
        assert!((props.inertia - 2.0 * 8.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn disk_inertia() {
        let props = Shape::circle(2.0).unwrap().mass_properties(4.0);
        assert!((props.inertia - 8.0).abs() < 1e-12);
    }

    #[test]
    fn rotated_box_aabb() {
        let shape = Shape::rectangle(1.0, 1.0).unwrap();
        let xf = Transform2::new(Vec2::new(2.0, 0.0), std::f64::consts::FRAC_PI_4);
        let aabb = shape.aabb(&xf);
        let r = 2.0f64.sqrt();
        assert!((aabb.max.x - (2.0 + r)).abs() < 1e-12);
        assert!((aabb.min.y + r).abs() < 1e-12);
    }

    #[test]
    fn support_point_picks_extreme_vertex() {
        let shape = Shape::rectangle(1.0, 2.0).unwrap();
        let p = shape.support_point(&Transform2::IDENTITY, Vec2::new(1.0, 1.0));
        assert_eq!(p, Vec2::new(1.0, 2.0));
    }
}
