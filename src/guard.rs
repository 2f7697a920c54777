//! Motion guard
//!
//! Read-only signal from the machine controller: is motion currently
//! executing? The store never pauses or resumes motion; it only declines to
//! write while the flag is set, keeping unbounded media latency out of the
//! real-time path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Source of the "machine is moving" signal.
pub trait MotionGuard {
    fn in_motion(&self) -> bool;
}

/// Shared boolean flag; clone one handle into the store and keep another in
/// the controller (or the test).
#[derive(Debug, Clone, Default)]
pub struct MotionFlag(Arc<AtomicBool>);

impl MotionFlag {
    /// New flag, initially not moving.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_moving(&self, moving: bool) {
        self.0.store(moving, Ordering::Relaxed);
    }
}

impl MotionGuard for MotionFlag {
    fn in_motion(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
