//! Broad-phase collision detection using sort-and-sweep along x

use crate::body_set::BodySet;
use crate::math::Vec2;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Grown by `margin` on every side.
    #[must_use]
    pub fn fattened(self, margin: f64) -> Self {
        let ext = Vec2::new(margin, margin);
        Self::new(self.min - ext, self.max + ext)
    }

    /// Closed-interval overlap test; touching boxes overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    index: usize,
    aabb: Aabb,
    simulated: bool,
}

/// Sort-and-sweep pair finder. Buffers are kept between steps to avoid
/// reallocating.
#[derive(Debug, Default)]
pub struct BroadPhase {
    entries: Vec<Entry>,
    active: Vec<usize>,
    pairs: Vec<(usize, usize)>,
}

impl BroadPhase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate pairs as `(lower slot, higher slot)`, sorted. A pair is only
    /// emitted when at least one body is simulated this step; frozen bodies
    /// never appear.
    pub fn find_pairs(&mut self, bodies: &BodySet, margin: f64) -> &[(usize, usize)] {
        self.entries.clear();
        self.entries.extend(bodies.iter().filter(|b| !b.is_frozen()).map(|b| Entry {
            index: b.id().index(),
            aabb: b.shape().aabb(b.transform()).fattened(margin),
            simulated: b.is_simulated(),
        }));
        self.entries.sort_by(|a, b| {
            a.aabb
                .min
                .x
                .total_cmp(&b.aabb.min.x)
                .then(a.index.cmp(&b.index))
        });

        self.active.clear();
        self.pairs.clear();
        for (pos, cur) in self.entries.iter().enumerate() {
            let entries = &self.entries;
            self.active.retain(|&a| entries[a].aabb.max.x >= cur.aabb.min.x);
            for &a in &self.active {
                let other = &self.entries[a];
                if !(other.simulated || cur.simulated) {
                    continue;
                }
                if other.aabb.min.y <= cur.aabb.max.y && other.aabb.max.y >= cur.aabb.min.y {
                    self.pairs.push((other.index.min(cur.index), other.index.max(cur.index)));
                }
            }
            self.active.push(pos);
        }
        self.pairs.sort_unstable();
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BodyDesc;
    use crate::shapes::Shape;

    fn circle_at(set: &mut BodySet, x: f64, y: f64) -> usize {
        set.insert(&BodyDesc::dynamic(Shape::circle(0.5).unwrap(), 1.0).position(Vec2::new(x, y)))
            .unwrap()
            .index()
    }

    #[test]
    fn aabb_overlap_is_closed() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(1.0, 1.0));
        let b = Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        let c = Aabb::new(Vec2::new(1.5, 0.0), Vec2::new(2.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.fattened(0.5).overlaps(&c));
    }

    #[test]
    fn sweep_requires_y_overlap() {
        let mut set = BodySet::new();
        let a = circle_at(&mut set, 0.0, 0.0);
        let b = circle_at(&mut set, 0.5, 0.0);
        circle_at(&mut set, 0.5, 10.0);
        let mut bp = BroadPhase::new();
        assert_eq!(bp.find_pairs(&set, 0.0), &[(a, b)]);
    }

    #[test]
    fn static_pairs_are_skipped() {
        let mut set = BodySet::new();
        let ground = Shape::rectangle(5.0, 0.5).unwrap();
        set.insert(&BodyDesc::fixed(ground.clone())).unwrap();
        set.insert(&BodyDesc::fixed(ground).position(Vec2::new(1.0, 0.0))).unwrap();
        let mut bp = BroadPhase::new();
        assert!(bp.find_pairs(&set, 0.05).is_empty());
    }

    #[test]
    fn sleeping_pairs_are_skipped() {
        let mut set = BodySet::new();
        let a = circle_at(&mut set, 0.0, 0.0);
        let b = circle_at(&mut set, 0.5, 0.0);
        let ground = set
            .insert(&BodyDesc::fixed(Shape::rectangle(5.0, 0.5).unwrap()).position(Vec2::new(0.0, -1.0)))
            .unwrap()
            .index();
        for body in set.iter_mut().filter(|b| !b.is_static()) {
            body.sleep();
        }
        let mut bp = BroadPhase::new();
        assert!(bp.find_pairs(&set, 0.05).is_empty());

        for body in set.iter_mut().filter(|body| body.id().index() == a) {
            body.wake();
        }
        assert_eq!(bp.find_pairs(&set, 0.05), &[(a, b), (a, ground)]);
    }

    #[test]
    fn matches_brute_force() {
        let mut set = BodySet::new();
        // Deterministic scatter.
        let mut seed = 17_u64;
        let mut next = || {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            f64::from(u32::try_from(seed >> 40).unwrap()) / f64::from(1_u32 << 24) * 10.0
        };
        for _ in 0..40 {
            let (x, y) = (next(), next());
            circle_at(&mut set, x, y);
        }
        let mut expected = Vec::new();
        let all: Vec<_> = set.iter().collect();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                let aa = a.shape().aabb(a.transform()).fattened(0.05);
                let bb = b.shape().aabb(b.transform()).fattened(0.05);
                if aa.overlaps(&bb) {
                    expected.push((a.id().index(), b.id().index()));
                }
            }
        }
        expected.sort_unstable();
        let mut bp = BroadPhase::new();
        assert_eq!(bp.find_pairs(&set, 0.05), expected.as_slice());
    }
}
