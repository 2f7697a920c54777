//! Write Cache
//!
//! Pending-writes buffer decoupling caller-visible writes from physical
//! media writes. Entries are inserted by the value-store write path and
//! removed only once folded into a fully-synced new file.
//!
//! Invariant: an entry always reflects the most recently requested write for
//! its index (last-write-wins) and is authoritative over whatever is on
//! media.

use std::collections::BTreeMap;

use crate::backend::VALUE_LEN;

/// Ordered buffer of not-yet-durable writes.
#[derive(Debug, Clone, Default)]
pub struct WriteCache {
    entries: BTreeMap<u16, f32>,
}

impl WriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending write, replacing any prior entry for `index`.
    pub fn insert(&mut self, index: u16, value: f32) {
        self.entries.insert(index, value);
    }

    /// Pending value for `index`, if any.
    pub fn get(&self, index: u16) -> Option<f32> {
        self.entries.get(&index).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop all pending entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stable copy for a commit to consume. The live cache stays untouched
    /// so a mid-commit failure remains retryable.
    pub fn snapshot(&self) -> WriteCache {
        self.clone()
    }

    /// Highest pending index, if any.
    pub fn max_index(&self) -> Option<u16> {
        self.entries.keys().next_back().copied()
    }

    /// Byte extent the pending entries occupy in the record space: one past
    /// the end of the highest pending record.
    pub fn byte_extent(&self) -> u64 {
        self.max_index()
            .map(|i| (u64::from(i) + 1) * VALUE_LEN as u64)
            .unwrap_or(0)
    }

    /// Remove and return the entries with `lo <= index <= hi`, in index
    /// order.
    pub fn drain_range(&mut self, lo: u16, hi: u16) -> Vec<(u16, f32)> {
        let drained: Vec<(u16, f32)> = self
            .entries
            .range(lo..=hi)
            .map(|(&i, &v)| (i, v))
            .collect();
        for (i, _) in &drained {
            self.entries.remove(i);
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let mut cache = WriteCache::new();
        cache.insert(7, 1.0);
        cache.insert(7, 2.5);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(7), Some(2.5));
    }

    #[test]
    fn drain_range_is_inclusive_and_removes() {
        let mut cache = WriteCache::new();
        for i in [3u16, 10, 127, 128, 300] {
            cache.insert(i, f32::from(i));
        }
        let block = cache.drain_range(0, 127);
        assert_eq!(
            block.iter().map(|&(i, _)| i).collect::<Vec<_>>(),
            vec![3, 10, 127]
        );
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(128), Some(128.0));
    }

    #[test]
    fn byte_extent_covers_highest_index() {
        let mut cache = WriteCache::new();
        assert_eq!(cache.byte_extent(), 0);
        cache.insert(0, 1.0);
        assert_eq!(cache.byte_extent(), 4);
        cache.insert(100, 1.0);
        assert_eq!(cache.byte_extent(), 404);
    }

    #[test]
    fn snapshot_leaves_live_cache_untouched() {
        let mut cache = WriteCache::new();
        cache.insert(1, 1.0);
        let mut snap = cache.snapshot();
        snap.drain_range(0, u16::MAX);
        assert!(snap.is_empty());
        assert_eq!(cache.len(), 1);
    }
}
