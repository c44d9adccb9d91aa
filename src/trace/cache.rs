//! Lazy trace materialization keyed by ROI identity.
//!
//! At most one value is computed per ROI between invalidations. Entries
//! remember whether their value depends on the mask so that a threshold change
//! drops exactly those.
use super::Trace;
use crate::roi::RoiId;
use log::debug;
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct Entry {
    trace: Trace,
    mask_dependent: bool,
}

#[derive(Clone, Debug, Default)]
pub struct TraceCache {
    entries: HashMap<RoiId, Entry>,
    computations: u64,
}

impl TraceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached trace for `id`, computing and storing it with `compute` on a miss.
    pub fn get_or_compute<F>(&mut self, id: RoiId, mask_dependent: bool, compute: F) -> Trace
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(entry) = self.entries.get(&id) {
            return entry.trace.clone();
        }
        let trace: Trace = compute().into();
        self.computations += 1;
        self.entries.insert(
            id,
            Entry {
                trace: trace.clone(),
                mask_dependent,
            },
        );
        trace
    }

    pub fn get(&self, id: RoiId) -> Option<Trace> {
        self.entries.get(&id).map(|e| e.trace.clone())
    }

    /// Drop the entry for `id`. Returns whether one existed.
    pub fn invalidate(&mut self, id: RoiId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drop every entry whose value depends on the mask.
    pub fn invalidate_mask_dependent(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.mask_dependent);
        let dropped = before - self.entries.len();
        debug!("TraceCache::invalidate_mask_dependent dropped={dropped}");
        dropped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, id: RoiId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of traces computed over the cache's lifetime.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn hit_returns_same_buffer_without_recomputing() {
        let mut cache = TraceCache::new();
        let a = cache.get_or_compute(RoiId(1), true, || vec![1.0, 2.0]);
        let b = cache.get_or_compute(RoiId(1), true, || unreachable!());
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn invalidation_forces_recompute() {
        let mut cache = TraceCache::new();
        cache.get_or_compute(RoiId(1), false, || vec![1.0]);
        assert!(cache.invalidate(RoiId(1)));
        assert!(!cache.invalidate(RoiId(1)));
        let t = cache.get_or_compute(RoiId(1), false, || vec![2.0]);
        assert_eq!(&*t, &[2.0]);
        assert_eq!(cache.computations(), 2);
    }

    #[test]
    fn mask_change_keeps_unmasked_entries() {
        let mut cache = TraceCache::new();
        cache.get_or_compute(RoiId(1), true, || vec![1.0]);
        cache.get_or_compute(RoiId(2), false, || vec![2.0]);
        cache.get_or_compute(RoiId(3), true, || vec![3.0]);
        assert_eq!(cache.invalidate_mask_dependent(), 2);
        assert!(cache.contains(RoiId(2)));
        assert_eq!(cache.len(), 1);
    }
}
