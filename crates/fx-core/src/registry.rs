//! Arena of per-element effect state keyed by a stable id.
//!
//! Event closures capture an `ElementId` and look the state up on each call
//! instead of holding the element or its state directly. Removing an entry
//! makes every later lookup miss, which is how teardown severs stale
//! callbacks.

use fnv::FnvHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
pub struct ElementRegistry<T> {
    entries: FnvHashMap<ElementId, T>,
    next: u32,
}

impl<T> Default for ElementRegistry<T> {
    fn default() -> Self {
        Self {
            entries: FnvHashMap::default(),
            next: 0,
        }
    }
}

impl<T> ElementRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are never reused, even after removal.
    pub fn insert(&mut self, value: T) -> ElementId {
        let id = ElementId(self.next);
        self.next = self.next.wrapping_add(1);
        self.entries.insert(id, value);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn remove(&mut self, id: ElementId) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &T)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ElementId, &mut T)> {
        self.entries.iter_mut().map(|(id, v)| (*id, v))
    }

    pub fn drain(&mut self) -> impl Iterator<Item = (ElementId, T)> + '_ {
        self.entries.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_ids_miss_and_are_not_reused() {
        let mut reg = ElementRegistry::new();
        let a = reg.insert("a");
        let b = reg.insert("b");
        assert_ne!(a, b);
        assert_eq!(reg.remove(a), Some("a"));
        assert!(reg.get(a).is_none());
        let c = reg.insert("c");
        assert_ne!(c, a);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn drain_empties() {
        let mut reg = ElementRegistry::new();
        reg.insert(1);
        reg.insert(2);
        assert_eq!(reg.drain().count(), 2);
        assert!(reg.is_empty());
    }
}
