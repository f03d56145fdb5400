//! Stable-indexed arena of rigid bodies.
//!
//! Slots are never moved while a body lives in them; removal leaves a hole
//! that a later insertion may reuse with a bumped generation. Iteration is in
//! slot order, which keeps every phase of a step deterministic.

use crate::body::{BodyId, RigidBody};
use crate::builder::BodyDesc;
use crate::error::{PhysicsError, Result};

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<RigidBody>,
}

#[derive(Clone, Debug, Default)]
pub struct BodySet {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl BodySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots, occupied or not. Slot indices are below this.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn insert(&mut self, desc: &BodyDesc) -> Result<BodyId> {
        // Lowest free slot first so reuse order does not depend on removal order.
        let free_pos = self
            .free
            .iter()
            .enumerate()
            .min_by_key(|&(_, &index)| index)
            .map(|(pos, _)| pos);
        let index = match free_pos {
            Some(pos) => self.free[pos],
            None => u32::try_from(self.slots.len())
                .map_err(|_| PhysicsError::InvalidConfig("too many bodies"))?,
        };
        let generation = self.slots.get(index as usize).map_or(0, |s| s.generation);
        let id = BodyId { index, generation };
        let body = RigidBody::new(id, desc)?;

        if let Some(pos) = free_pos {
            self.free.swap_remove(pos);
            self.slots[index as usize].body = Some(body);
        } else {
            self.slots.push(Slot { generation, body: Some(body) });
        }
        self.len += 1;
        Ok(id)
    }

    pub(crate) fn remove(&mut self, id: BodyId) -> Result<RigidBody> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && s.body.is_some())
            .ok_or(PhysicsError::UnknownBody(id))?;
        let body = slot.body.take().ok_or(PhysicsError::UnknownBody(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Ok(body)
    }

    #[must_use]
    pub fn contains(&self, id: BodyId) -> bool {
        self.get(id).is_ok()
    }

    pub fn get(&self, id: BodyId) -> Result<&RigidBody> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.body.as_ref())
            .ok_or(PhysicsError::UnknownBody(id))
    }

    pub fn get_mut(&mut self, id: BodyId) -> Result<&mut RigidBody> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.body.as_mut())
            .ok_or(PhysicsError::UnknownBody(id))
    }

    /// Body in slot `index`, regardless of generation.
    pub(crate) fn by_index(&self, index: usize) -> Option<&RigidBody> {
        self.slots.get(index).and_then(|s| s.body.as_ref())
    }

    /// Two distinct bodies by slot index, mutably.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut RigidBody, &mut RigidBody)> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (left, right) = self.slots.split_at_mut(hi);
        let first = left[lo].body.as_mut()?;
        let second = right[0].body.as_mut()?;
        Some(if a < b { (first, second) } else { (second, first) })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RigidBody> {
        self.slots.iter().filter_map(|s| s.body.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RigidBody> {
        self.slots.iter_mut().filter_map(|s| s.body.as_mut())
    }

    pub fn ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.iter().map(RigidBody::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn desc() -> BodyDesc {
        BodyDesc::dynamic(Shape::circle(1.0).unwrap(), 1.0)
    }

    #[test]
    fn removed_ids_stay_invalid_after_reuse() {
        let mut set = BodySet::new();
        let a = set.insert(&desc()).unwrap();
        let b = set.insert(&desc()).unwrap();
        set.remove(a).unwrap();
        assert_eq!(set.remove(a).unwrap_err(), PhysicsError::UnknownBody(a));

        let c = set.insert(&desc()).unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(set.get(a).is_err());
        assert!(set.get(c).is_ok());
        assert!(set.get(b).is_ok());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn failed_insert_does_not_consume_a_slot() {
        let mut set = BodySet::new();
        let bad = BodyDesc::dynamic(Shape::circle(1.0).unwrap(), 0.0);
        assert!(set.insert(&bad).is_err());
        assert!(set.is_empty());
        assert_eq!(set.capacity(), 0);
    }

    #[test]
    fn pair_mut_preserves_order() {
        let mut set = BodySet::new();
        let a = set.insert(&desc()).unwrap();
        let b = set.insert(&desc()).unwrap();
        let (first, second) = set.pair_mut(b.index(), a.index()).unwrap();
        assert_eq!(first.id(), b);
        assert_eq!(second.id(), a);
        assert!(set.pair_mut(a.index(), a.index()).is_none());
    }
}
