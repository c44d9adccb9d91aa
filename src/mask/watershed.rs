//! Marker-controlled priority flooding.
//!
//! All labeled pixels seed a min-heap keyed by elevation. Popping the lowest
//! pixel labels each unlabeled 4-neighbour with the popped label and pushes it
//! with its own elevation. Ties are resolved first-in first-out so plateaus
//! are split evenly between competing fronts. Pixels unreachable from any
//! marker keep label 0.
use crate::image::ImageF32;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Clone, Copy, Debug)]
struct Front {
    elevation: f32,
    age: u64,
    idx: usize,
}

impl PartialEq for Front {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Front {}

impl PartialOrd for Front {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Front {
    // Reversed so the max-heap pops the lowest elevation, then the oldest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .elevation
            .total_cmp(&self.elevation)
            .then_with(|| other.age.cmp(&self.age))
    }
}

/// Flood `markers` over `elevation`. Returns one label per pixel.
pub fn watershed(elevation: &ImageF32, markers: &[u8]) -> Vec<u8> {
    let (w, h) = (elevation.w, elevation.h);
    debug_assert_eq!(markers.len(), w * h);
    let mut labels = markers.to_vec();
    let mut heap = BinaryHeap::with_capacity(w * h / 4 + 1);
    let mut age = 0u64;

    for (idx, &label) in labels.iter().enumerate() {
        if label != 0 {
            heap.push(Front {
                elevation: elevation.data[idx],
                age,
                idx,
            });
            age += 1;
        }
    }

    while let Some(Front { idx, .. }) = heap.pop() {
        let label = labels[idx];
        let (x, y) = (idx % w, idx / w);
        let neighbours = [
            (x > 0).then(|| idx - 1),
            (x + 1 < w).then(|| idx + 1),
            (y > 0).then(|| idx - w),
            (y + 1 < h).then(|| idx + w),
        ];
        for n in neighbours.into_iter().flatten() {
            if labels[n] == 0 {
                labels[n] = label;
                heap.push(Front {
                    elevation: elevation.data[n],
                    age,
                    idx: n,
                });
                age += 1;
            }
        }
    }

    labels
}
