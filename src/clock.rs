//! Tick source
//!
//! Monotonic millisecond clock used only for commit rate limiting. A trait
//! seam so tests can drive time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic millisecond counter.
pub trait TickSource {
    fn now_ms(&self) -> u64;
}

/// Wall-clock ticks measured from construction.
#[derive(Debug)]
pub struct SystemTicks {
    origin: Instant,
}

impl SystemTicks {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SystemTicks {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven ticks for deterministic tests; cloned handles share the
/// counter.
#[derive(Debug, Clone, Default)]
pub struct ManualTicks(Arc<AtomicU64>);

impl ManualTicks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::Relaxed);
    }
}

impl TickSource for ManualTicks {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
