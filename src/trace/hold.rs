//! Fixed set of comparison slots holding trace snapshots.
//!
//! A held snapshot is the `Trace` buffer at hold time; later invalidation of
//! the ROI's cache entry does not touch it.
use super::Trace;
use crate::error::{RoiError, RoiResult};
use crate::roi::RoiId;

#[derive(Clone, Debug)]
pub struct HeldTrace {
    pub roi: RoiId,
    pub trace: Trace,
}

#[derive(Clone, Debug)]
pub struct HoldSlots {
    slots: Vec<Option<HeldTrace>>,
}

impl HoldSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn check(&self, slot: usize) -> RoiResult<()> {
        if slot < self.slots.len() {
            Ok(())
        } else {
            Err(RoiError::OutOfRange {
                what: "hold slot",
                index: slot,
                len: self.slots.len(),
            })
        }
    }

    /// Pin `trace` into `slot`, returning whatever it displaced.
    pub fn hold(&mut self, slot: usize, roi: RoiId, trace: Trace) -> RoiResult<Option<HeldTrace>> {
        self.check(slot)?;
        Ok(self.slots[slot].replace(HeldTrace { roi, trace }))
    }

    pub fn release(&mut self, slot: usize) -> RoiResult<Option<HeldTrace>> {
        self.check(slot)?;
        Ok(self.slots[slot].take())
    }

    pub fn get(&self, slot: usize) -> RoiResult<Option<&HeldTrace>> {
        self.check(slot)?;
        Ok(self.slots[slot].as_ref())
    }

    /// Slots currently holding a snapshot of `roi`.
    pub fn slots_of(&self, roi: RoiId) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|h| h.roi == roi))
            .map(|(i, _)| i)
            .collect()
    }

    /// Empty every slot holding `roi`.
    pub fn release_roi(&mut self, roi: RoiId) {
        for slot in self.slots.iter_mut() {
            if slot.as_ref().is_some_and(|h| h.roi == roi) {
                *slot = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(v: f64) -> Trace {
        vec![v].into()
    }

    #[test]
    fn holding_on_occupied_slot_reassigns() {
        let mut slots = HoldSlots::new(3);
        assert!(slots.hold(0, RoiId(1), trace(1.0)).unwrap().is_none());
        let displaced = slots.hold(0, RoiId(2), trace(2.0)).unwrap().unwrap();
        assert_eq!(displaced.roi, RoiId(1));
        assert_eq!(slots.get(0).unwrap().unwrap().roi, RoiId(2));
        assert!(slots.slots_of(RoiId(1)).is_empty());
    }

    #[test]
    fn slot_outside_capacity_is_rejected() {
        let mut slots = HoldSlots::new(3);
        assert!(matches!(
            slots.hold(3, RoiId(1), trace(0.0)),
            Err(RoiError::OutOfRange { index: 3, len: 3, .. })
        ));
    }

    #[test]
    fn release_roi_clears_all_its_slots() {
        let mut slots = HoldSlots::new(3);
        slots.hold(0, RoiId(1), trace(1.0)).unwrap();
        slots.hold(2, RoiId(1), trace(1.0)).unwrap();
        slots.hold(1, RoiId(4), trace(4.0)).unwrap();
        assert_eq!(slots.slots_of(RoiId(1)), vec![0, 2]);
        slots.release_roi(RoiId(1));
        assert_eq!(slots.slots_of(RoiId(1)), Vec::<usize>::new());
        assert!(slots.release(1).unwrap().is_some());
    }
}
