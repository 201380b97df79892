// policy.rs - Delivery Policy
// Decides whether a downloaded artifact is small enough to upload.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, runtime-adjustable size ceiling in bytes.
/// Cloning hands out another view of the same value.
#[derive(Debug, Clone)]
pub struct SizeCeiling(Arc<AtomicU64>);

impl SizeCeiling {
    pub fn new(bytes: u64) -> Self {
        Self(Arc::new(AtomicU64::new(bytes)))
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, bytes: u64) {
        self.0.store(bytes, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject { size: u64, ceiling: u64 },
}

#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    ceiling: SizeCeiling,
}

impl DeliveryPolicy {
    pub fn new(ceiling: SizeCeiling) -> Self {
        Self { ceiling }
    }

    /// Accept iff `size <= ceiling`. The ceiling is read on every call.
    pub fn evaluate(&self, size: u64) -> Decision {
        let ceiling = self.ceiling.get();
        if size <= ceiling {
            Decision::Accept
        } else {
            Decision::Reject { size, ceiling }
        }
    }
}
