//! Circle-circle contact

use super::{Collision, ContactFeature, ContactPoint};
use crate::math::Vec2;

/// Detect contact between two circles given their centers.
///
/// Touching circles (zero depth) still produce a contact so resting stacks
/// keep their manifold from one step to the next.
#[must_use]
pub fn collide_circles(center_a: Vec2, radius_a: f64, center_b: Vec2, radius_b: f64) -> Option<Collision> {
    let delta = center_b - center_a;
    let distance_squared = delta.length_squared();
    let min_distance = radius_a + radius_b;
    if distance_squared > min_distance * min_distance {
        return None;
    }

    let distance = distance_squared.sqrt();
    // Coincident centers have no line between them.
    let normal = delta.try_normalize().unwrap_or(Vec2::Y);
    let surface_a = center_a + normal * radius_a;
    let surface_b = center_b - normal * radius_b;

    Some(Collision {
        normal,
        points: vec![ContactPoint {
            point: surface_a.lerp(surface_b, 0.5),
            depth: min_distance - distance,
            feature: ContactFeature::default(),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_circles() {
        let c = collide_circles(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0).unwrap();
        assert_eq!(c.normal, Vec2::X);
        assert!((c.points[0].depth - 0.5).abs() < 1e-12);
        assert!((c.points[0].point - Vec2::new(0.75, 0.0)).length() < 1e-12);
    }

    #[test]
    fn touching_circles_report_zero_depth() {
        let c = collide_circles(Vec2::ZERO, 1.0, Vec2::new(0.0, 2.0), 1.0).unwrap();
        assert_eq!(c.points[0].depth, 0.0);
        assert_eq!(c.normal, Vec2::Y);
    }

    #[test]
    fn separated_circles() {
        assert!(collide_circles(Vec2::ZERO, 1.0, Vec2::new(2.0001, 0.0), 1.0).is_none());
    }

    #[test]
    fn coincident_centers_fall_back_to_up() {
        let c = collide_circles(Vec2::new(1.0, 1.0), 0.5, Vec2::new(1.0, 1.0), 0.25).unwrap();
        assert_eq!(c.normal, Vec2::Y);
        assert!((c.points[0].depth - 0.75).abs() < 1e-12);
    }
}
