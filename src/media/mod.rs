//! Storage Media Module
//!
//! The block-storage seam the store sits on. Everything the store ever asks
//! of the medium goes through [`Media`] and [`MediaFile`], so the same code
//! runs against a real filesystem ([`DiskMedia`]) or a deterministic
//! in-memory medium with fault injection ([`MemMedia`]).
//!
//! ## Responsibilities
//! - Mount / directory management
//! - Open (read-existing or create-or-truncate), read, write, seek, sync
//! - Existence checks and deletion for ring rotation
//!
//! Removable media can change state between calls (card pulled and
//! reinserted), which is why callers revalidate handles instead of trusting
//! them across uses.

mod disk;
mod mem;

pub use disk::DiskMedia;
pub use mem::MemMedia;

use std::io;

/// Transfer granularity for streamed reads/writes and checksum folding.
/// Sized to one SD sector; record data may exceed available RAM in
/// aggregate, so nothing ever buffers a whole file.
pub const IO_BUFFER_SIZE: usize = 512;

/// A storage medium holding named files under named directories.
///
/// Paths are medium-relative, forward-slash separated (e.g.
/// `"persist/persist0.bin"`).
pub trait Media {
    type File: MediaFile;

    /// Whether a previous `mount` succeeded and the medium is usable.
    fn is_mounted(&self) -> bool;

    /// Make the medium usable. Idempotent.
    fn mount(&mut self) -> io::Result<()>;

    /// Create a directory. Succeeds if it already exists.
    fn create_dir(&mut self, path: &str) -> io::Result<()>;

    /// Whether a file exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Open an existing file for reading. Fails if absent.
    fn open_read(&mut self, path: &str) -> io::Result<Self::File>;

    /// Open a file for writing, creating it or truncating an existing one.
    fn open_write(&mut self, path: &str) -> io::Result<Self::File>;

    /// Delete a file.
    fn remove(&mut self, path: &str) -> io::Result<()>;
}

/// An open file handle on a [`Media`].
///
/// Handles track their own cursor; `remaining`/`eof` are cheap queries, not
/// I/O operations.
pub trait MediaFile {
    /// Read up to `buf.len()` bytes at the cursor. Returns bytes read;
    /// 0 means end of file.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write `buf` at the cursor, extending the file as needed.
    /// Returns bytes written.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Move the cursor to an absolute byte offset.
    fn seek(&mut self, pos: u64) -> io::Result<()>;

    /// Flush buffered data to the physical medium.
    fn sync(&mut self) -> io::Result<()>;

    /// Current file length in bytes.
    fn len(&self) -> u64;

    /// Bytes between the cursor and end of file.
    fn remaining(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn eof(&self) -> bool {
        self.remaining() == 0
    }
}
