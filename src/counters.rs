use std::sync::atomic::{AtomicU32, Ordering};

/// Lock-free counter array shared across worker threads. The segmentation
/// engine uses one instance for per-type dominant counts; the partition
/// stage uses a second instance, seeded from the prefix sum, as its write
/// cursors. Every access is bounds-checked before the atomic operation.
pub struct AtomicCounters {
    slots: Vec<AtomicU32>,
}

impl AtomicCounters {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn from_offsets(offsets: &[u32]) -> Self {
        Self {
            slots: offsets.iter().map(|&v| AtomicU32::new(v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fetch-and-increment, returning the value before the increment.
    pub fn increment(&self, index: usize) -> Result<u32, String> {
        let slot = self.slots.get(index).ok_or_else(|| {
            format!(
                "counter index {} out of range (len {})",
                index,
                self.slots.len()
            )
        })?;
        Ok(slot.fetch_add(1, Ordering::Relaxed))
    }

    pub fn load(&self, index: usize) -> Result<u32, String> {
        let slot = self.slots.get(index).ok_or_else(|| {
            format!(
                "counter index {} out of range (len {})",
                index,
                self.slots.len()
            )
        })?;
        Ok(slot.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> Vec<u32> {
        self.slots
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect()
    }
}
