//! # Navigation Volume Pool
//!
//! Battle and boss rooms each claim the next unused pooled navigation volume. Claims only
//! move forward during a run; an exhausted pool leaves later rooms without a volume.

use crate::world::NavVolumeId;
use log::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavVolumePool {
    size: usize,
    next: usize,
}

impl NavVolumePool {
    pub fn new(size: usize) -> Self {
        Self { size, next: 0 }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn claimed(&self) -> usize {
        self.next
    }

    /// Makes every volume claimable again. Called at the start of each run.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Claims the next volume, or `None` once the pool is exhausted.
    pub fn claim(&mut self) -> Option<NavVolumeId> {
        if self.next >= self.size {
            warn!(
                "navigation volume pool exhausted after {} claims; room left without a volume",
                self.size
            );
            return None;
        }
        let id = NavVolumeId(self.next);
        self.next += 1;
        Some(id)
    }
}
