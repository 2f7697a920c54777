//! File-backed Value Store
//!
//! The block-storage persistence strategy that coordinates all components.
//!
//! ## Responsibilities
//! - Read-through/write-back access to values by index
//! - Batch pending writes in the cache, off the real-time path
//! - Rate-limited, motion-gated, failure-aware commit scheduling
//! - Commit algorithm: write-new-file-then-retire-old
//!
//! ## Crash-consistency model
//!
//! No atomic rename, no transaction log, only open/read/write/seek/sync/
//! delete. A commit streams the merged record space into the *next* ring
//! slot, syncing every block, and appends a checksum trailer; the previous
//! file is deleted only after the replacement is fully written, synced, and
//! closed. Power loss before the trailer lands leaves a file that fails
//! validation on next boot and is discarded, falling back to the old file,
//! which is still present.

use tracing::{debug, warn};

use crate::backend::{Backend, FlushOutcome, WriteStatus, VALUE_LEN};
use crate::cache::WriteCache;
use crate::checksum::{self, read_full, TRAILER_LEN};
use crate::clock::{SystemTicks, TickSource};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::guard::{MotionFlag, MotionGuard};
use crate::media::{DiskMedia, Media, MediaFile, IO_BUFFER_SIZE};
use crate::ring::FileRing;

/// The file-backed store.
///
/// Owns the media handle, the write cache, and all commit bookkeeping; no
/// external component mutates them directly. Single logical thread of
/// control: callers invoke `read_value`/`write_value` inline and drive
/// `flush` from a periodic tick.
pub struct FileStore<M: Media> {
    media: M,
    ring: FileRing,
    config: Config,
    guard: Box<dyn MotionGuard>,
    ticks: Box<dyn TickSource>,

    /// Pending writes not yet durable; authoritative over media.
    cache: WriteCache,

    /// Lazily-opened read handle on the active file. Revalidated (not
    /// unconditionally reopened) before each use: the medium can change
    /// state between calls, but reopening on every read costs too much.
    file: Option<M::File>,

    /// Ring slot the open handle came from.
    slot: usize,

    /// Tick of the last commit attempt, success or failure.
    last_commit_ms: u64,

    /// Consecutive commit failures since the last success.
    failures: u32,
}

impl FileStore<DiskMedia> {
    /// Convenience constructor over a host directory with wall-clock ticks
    /// and a motion flag that never trips.
    pub fn open_path(root: impl Into<std::path::PathBuf>, config: Config) -> Self {
        Self::new(
            DiskMedia::new(root),
            Box::new(MotionFlag::new()),
            Box::new(SystemTicks::new()),
            config,
        )
    }
}

impl<M: Media> FileStore<M> {
    /// Build a store over `media`. Nothing is opened until first use; the
    /// current tick is stamped so the very first flush is rate-limited too.
    pub fn new(
        media: M,
        guard: Box<dyn MotionGuard>,
        ticks: Box<dyn TickSource>,
        config: Config,
    ) -> Self {
        let last_commit_ms = ticks.now_ms();
        let ring = FileRing::new(&config.dir);
        Self {
            media,
            ring,
            config,
            guard,
            ticks,
            cache: WriteCache::new(),
            file: None,
            slot: 0,
            last_commit_ms,
            failures: 0,
        }
    }

    // =========================================================================
    // Value access
    // =========================================================================

    /// Read the value for `index`: pending cache entry first, then media.
    ///
    /// Callers see the last requested write even before it is durable. Index
    /// range enforcement belongs to the configuration layer above.
    pub fn read_value(&mut self, index: u16) -> Result<f32> {
        if let Some(value) = self.cache.get(index) {
            return Ok(value);
        }
        self.read_media(index)
    }

    /// Request that `index` hold `value`.
    ///
    /// Returns `Busy` while motion executes: inline media I/O has unbounded
    /// latency and must stay out of the control loop. Otherwise the stored
    /// value is compared bitwise (the stored pattern may carry non-numeric
    /// sentinels, so approximate float equality is wrong here); NaN and Inf
    /// are always forced through since the caller explicitly wants the
    /// overwrite. Accepted values land in the cache and become durable at a
    /// later flush.
    pub fn write_value(&mut self, index: u16, value: f32) -> Result<WriteStatus> {
        if self.guard.in_motion() {
            return Ok(WriteStatus::Busy);
        }
        let force = value.is_nan() || value.is_infinite();
        if !force {
            // Read-through compare; an unreadable stored value forces the
            // write just like a differing one.
            if let Ok(current) = self.read_value(index) {
                if current.to_bits() == value.to_bits() {
                    return Ok(WriteStatus::Unchanged);
                }
            }
        }
        self.cache.insert(index, value);
        Ok(WriteStatus::Accepted)
    }

    // =========================================================================
    // Commit scheduling
    // =========================================================================

    /// Periodic entry point: flush pending writes into a freshly rotated
    /// file, subject to rate limiting and the motion guard.
    ///
    /// Failure accounting: a failed commit deletes the half-written output
    /// slot, bumps the failure counter, and stamps the clock so repeated
    /// failures are rate-limited too. At the threshold the pending cache is
    /// dropped and the counter reset; losing the unwritten updates beats
    /// retrying forever against a dead medium; operation continues on
    /// in-memory values.
    pub fn flush(&mut self) -> Result<FlushOutcome> {
        if self.cache.is_empty() {
            return Ok(FlushOutcome::NothingToDo);
        }
        let now = self.ticks.now_ms();
        if now.saturating_sub(self.last_commit_ms) < self.config.min_commit_interval_ms {
            return Ok(FlushOutcome::NothingToDo);
        }
        // Guarded at the point of request (write_value) and again here, the
        // point of commit. Busy is a deferral, not a failure: no counter or
        // timestamp updates.
        if self.guard.in_motion() {
            return Ok(FlushOutcome::Busy);
        }

        match self.commit() {
            Ok(()) => {
                self.cache.clear();
                self.failures = 0;
                self.last_commit_ms = self.ticks.now_ms();
                Ok(FlushOutcome::Committed)
            }
            Err(e) => {
                // Never leave a half-written candidate in the ring.
                let next = self.ring.path(FileRing::next(self.slot)).to_string();
                let _ = self.media.remove(&next);
                self.failures += 1;
                self.last_commit_ms = self.ticks.now_ms();
                if self.failures >= self.config.max_commit_failures {
                    warn!(
                        pending = self.cache.len(),
                        failures = self.failures,
                        "dropping pending writes after repeated commit failures"
                    );
                    self.cache.clear();
                    self.failures = 0;
                }
                Err(e)
            }
        }
    }

    /// Number of writes awaiting durability.
    pub fn pending_writes(&self) -> usize {
        self.cache.len()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Validate the active file (opening it if necessary).
    pub fn verify(&mut self) -> Result<()> {
        self.prepare()
    }

    /// Number of records in the active file.
    pub fn record_count(&mut self) -> Result<u64> {
        self.prepare()?;
        let file = self.file.as_ref().ok_or(StoreError::NoData)?;
        Ok(file.len().saturating_sub(TRAILER_LEN as u64) / VALUE_LEN as u64)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Ensure an open, validated handle on the active file.
    ///
    /// Idempotent: a handle that still passes validation is reused. The full
    /// path mounts the medium if needed, derives the active slot from media
    /// state, opens it read-only, and validates. A file failing validation
    /// is deleted: it is "no data", never partially trusted. Only after the
    /// current file validates is the superseded previous slot deleted, since
    /// validation proves the rotation that wrote it completed.
    fn prepare(&mut self) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            if checksum::verify_trailer(file).is_ok() {
                return Ok(());
            }
            // Stale handle (medium changed under us); reopen from scratch.
            self.file = None;
        }

        if !self.media.is_mounted() {
            self.media.mount()?;
        }
        let _ = self.media.create_dir(self.ring.dir());

        let slot = self.ring.active_slot(&self.media).ok_or(StoreError::NoData)?;
        let mut file = self.media.open_read(self.ring.path(slot))?;
        self.slot = slot;
        debug!(slot, "opened persistence file");

        if let Err(e) = checksum::verify_trailer(&mut file) {
            warn!(slot, error = %e, "integrity failure, discarding file");
            drop(file);
            let _ = self.media.remove(self.ring.path(slot));
            self.slot = 0;
            return Err(e);
        }

        let prev = self.ring.path(FileRing::prev(slot)).to_string();
        if self.media.exists(&prev) {
            // Safe now that the current file validated.
            let _ = self.media.remove(&prev);
        }
        self.file = Some(file);
        Ok(())
    }

    fn read_media(&mut self, index: u16) -> Result<f32> {
        self.prepare()?;
        let file = self.file.as_mut().ok_or(StoreError::NoData)?;
        file.seek(u64::from(index) * VALUE_LEN as u64)?;
        let mut buf = [0u8; VALUE_LEN];
        read_full(file, &mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    /// Write-new-file-then-retire-old.
    ///
    /// Streams the record space in buffer-sized blocks: old bytes first
    /// (zero-padded where the old file falls short or is absent), pending
    /// values overlaid from a snapshot of the cache, each block written and
    /// synced, the checksum folded as it goes. The trailer lands last; only
    /// then is the old file deleted and the tracked slot reset to the ring
    /// origin so the next `prepare` re-derives the active slot from media
    /// state instead of trusting a cached one.
    fn commit(&mut self) -> Result<()> {
        // Best-effort open of the previous file; absence means an all-zero
        // baseline.
        let old_open = match self.prepare() {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "no baseline file for commit");
                self.file = None;
                false
            }
        };
        let old_data_len = match self.file.as_mut() {
            Some(file) => {
                file.seek(0)?;
                file.len().saturating_sub(TRAILER_LEN as u64)
            }
            None => 0,
        };

        let next_slot = FileRing::next(self.slot);
        let out_path = self.ring.path(next_slot).to_string();
        let mut out = self.media.open_write(&out_path)?;
        // Sync immediately after creation to surface I/O errors early.
        out.sync()?;
        debug!(path = %out_path, "opened output slot");

        // Stable snapshot: a mid-commit failure must leave the live cache
        // intact and retryable.
        let mut working = self.cache.snapshot();

        // The record space covers whichever reaches further: the old file's
        // data or the highest pending index. A pending index past the old
        // file's end is zero-padded into existence, never dropped. With no
        // baseline, pad to whole blocks as a fresh file would occupy.
        let mut total = old_data_len.max(working.byte_extent());
        if !old_open {
            let block = IO_BUFFER_SIZE as u64;
            total = (total + block - 1) / block * block;
        }

        let mut hasher = crc32fast::Hasher::new();
        let mut buf = [0u8; IO_BUFFER_SIZE];
        let mut offset = 0u64;
        while offset < total {
            let block_len = (total - offset).min(IO_BUFFER_SIZE as u64) as usize;
            buf[..block_len].fill(0);

            // Pull forward whatever the old file still holds for this block.
            if let Some(file) = self.file.as_mut() {
                let avail = old_data_len.saturating_sub(offset).min(block_len as u64) as usize;
                if avail > 0 {
                    read_full(file, &mut buf[..avail])?;
                }
            }

            // Overlay pending values whose offsets fall inside this block,
            // consuming them from the working copy.
            let records = block_len / VALUE_LEN;
            if records > 0 {
                let lo = u16::try_from(offset / VALUE_LEN as u64).unwrap_or(u16::MAX);
                let hi = u16::try_from(offset / VALUE_LEN as u64 + records as u64 - 1)
                    .unwrap_or(u16::MAX);
                for (index, value) in working.drain_range(lo, hi) {
                    let rel = (u64::from(index) * VALUE_LEN as u64 - offset) as usize;
                    buf[rel..rel + VALUE_LEN].copy_from_slice(&value.to_le_bytes());
                    debug!(index, value, rel, "merged pending value");
                }
            }

            let written = out.write(&buf[..block_len])?;
            if written != block_len {
                return Err(StoreError::Media(format!(
                    "short write: {written} of {block_len} bytes"
                )));
            }
            out.sync()?;
            hasher.update(&buf[..block_len]);
            offset += block_len as u64;
        }

        // Trailer last: until it lands, the new file fails validation and the
        // old file remains authoritative.
        let crc = hasher.finalize();
        let written = out.write(&crc.to_le_bytes())?;
        if written != TRAILER_LEN {
            return Err(StoreError::Media("short trailer write".to_string()));
        }
        out.sync()?;
        drop(out);
        debug!(crc, "wrote trailer");

        if old_open {
            // Close before delete; the replacement is confirmed complete.
            self.file = None;
            self.media.remove(self.ring.path(self.slot))?;
            debug!(slot = self.slot, "retired obsolete file");
            self.slot = 0;
        }
        Ok(())
    }
}

impl<M: Media> Backend for FileStore<M> {
    fn read_value(&mut self, index: u16) -> Result<f32> {
        FileStore::read_value(self, index)
    }

    fn write_value(&mut self, index: u16, value: f32) -> Result<WriteStatus> {
        FileStore::write_value(self, index, value)
    }

    fn flush(&mut self) -> Result<FlushOutcome> {
        FileStore::flush(self)
    }
}
