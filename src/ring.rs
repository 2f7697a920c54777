//! File Rotation Manager
//!
//! Three candidate filenames form a logical cycle. Each commit copies data
//! from the current file into the *next* slot, then deletes the current file
//! once the copy is complete and synced, so at least one recent, validated
//! copy survives power loss mid-write.
//!
//! Invariant: at most two slots hold real files at any time (the previous
//! valid file and, transiently during a commit, its replacement). The scan
//! in `active_slot` depends on this and on commits always advancing in
//! forward ring order.

use crate::media::Media;

/// Number of slots in the rotation ring.
pub const RING_LEN: usize = 3;

/// The fixed set of candidate filenames for one store.
#[derive(Debug, Clone)]
pub struct FileRing {
    dir: String,
    paths: [String; RING_LEN],
}

impl FileRing {
    /// Build the canonical ring paths under `dir`.
    pub fn new(dir: &str) -> Self {
        let paths = [0, 1, 2].map(|i| format!("{dir}/persist{i}.bin"));
        Self {
            dir: dir.to_string(),
            paths,
        }
    }

    /// The ring's directory on the medium.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Medium-relative path of a slot.
    pub fn path(&self, slot: usize) -> &str {
        &self.paths[slot % RING_LEN]
    }

    /// Slot written by the commit that follows `slot`.
    pub fn next(slot: usize) -> usize {
        (slot + 1) % RING_LEN
    }

    /// Slot superseded by `slot`.
    pub fn prev(slot: usize) -> usize {
        (slot + RING_LEN - 1) % RING_LEN
    }

    /// Determine which slot holds the most recent file.
    ///
    /// Forward scan: for the first existing file, if its forward
    /// (non-wrapping) neighbor also exists, the neighbor is more recent: it
    /// was written by a commit that started from the first. `None` when the
    /// ring is empty.
    ///
    /// This is not a general most-recent-modification detector: it assumes
    /// the ≤2-files invariant and strictly forward commit order.
    pub fn active_slot<M: Media>(&self, media: &M) -> Option<usize> {
        for slot in 0..RING_LEN {
            if media.exists(self.path(slot)) {
                let next = Self::next(slot);
                if next > slot && media.exists(self.path(next)) {
                    return Some(next);
                }
                return Some(slot);
            }
        }
        None
    }
}
