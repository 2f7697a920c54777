//! Backend contract and the byte-addressable strategy
//!
//! Two persistence strategies sit behind one logical interface, selected at
//! startup:
//! - [`crate::FileStore`]: block-storage backend with rotating-file
//!   integrity and batched write-back (the interesting one).
//! - [`EepromStore`]: byte-addressable NVM on simpler hardware; writes are
//!   synchronous, so its `flush` is a no-op.

use std::io;

use crate::error::Result;
use crate::guard::MotionGuard;

/// Width of one stored record in bytes (`f32`, little-endian).
pub const VALUE_LEN: usize = 4;

/// Outcome of a write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The value differed (or was forced) and is now pending or stored.
    Accepted,
    /// The stored bit pattern already matches; nothing to do.
    Unchanged,
    /// Refused: the machine is executing motion. Not an error; retry when
    /// motion stops.
    Busy,
}

/// Outcome of a flush request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// A new file was written, synced, and rotated in.
    Committed,
    /// Nothing pending, or the rate limiter deferred the attempt.
    NothingToDo,
    /// Refused: the machine is executing motion.
    Busy,
}

/// The read/write/flush contract both strategies implement.
///
/// Index range enforcement belongs to the configuration layer above; indices
/// here are trusted.
pub trait Backend {
    /// Read the stored value for `index`.
    fn read_value(&mut self, index: u16) -> Result<f32>;

    /// Request that `index` hold `value`. Visibility is immediate;
    /// durability may be deferred.
    fn write_value(&mut self, index: u16, value: f32) -> Result<WriteStatus>;

    /// Drive deferred writes toward durability. Called periodically.
    fn flush(&mut self) -> Result<FlushOutcome>;
}

// =============================================================================
// Byte-addressable backend
// =============================================================================

/// Raw byte-addressable non-volatile memory.
pub trait ByteNvm {
    fn read_bytes(&self, addr: usize, buf: &mut [u8]) -> io::Result<()>;
    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> io::Result<()>;
}

/// In-memory [`ByteNvm`] for tests and host-side simulation.
#[derive(Debug, Clone)]
pub struct MemEeprom {
    bytes: Vec<u8>,
}

impl MemEeprom {
    /// Zero-filled NVM of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }
}

impl ByteNvm for MemEeprom {
    fn read_bytes(&self, addr: usize, buf: &mut [u8]) -> io::Result<()> {
        let end = addr + buf.len();
        if end > self.bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("read past NVM end: {end} > {}", self.bytes.len()),
            ));
        }
        buf.copy_from_slice(&self.bytes[addr..end]);
        Ok(())
    }

    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> io::Result<()> {
        let end = addr + data.len();
        if end > self.bytes.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("write past NVM end: {end} > {}", self.bytes.len()),
            ));
        }
        self.bytes[addr..end].copy_from_slice(data);
        Ok(())
    }
}

/// Immediate-write store over byte-addressable NVM.
///
/// Same change-detection rule as the file store (bitwise compare, NaN/Inf
/// forced through), but the write happens inline, acceptable because NVM
/// access latency is bounded, unlike removable media.
pub struct EepromStore<N: ByteNvm> {
    nvm: N,
    base_addr: usize,
    guard: Box<dyn MotionGuard>,
}

impl<N: ByteNvm> EepromStore<N> {
    pub fn new(nvm: N, base_addr: usize, guard: Box<dyn MotionGuard>) -> Self {
        Self {
            nvm,
            base_addr,
            guard,
        }
    }

    fn addr(&self, index: u16) -> usize {
        self.base_addr + usize::from(index) * VALUE_LEN
    }
}

impl<N: ByteNvm> Backend for EepromStore<N> {
    fn read_value(&mut self, index: u16) -> Result<f32> {
        let mut buf = [0u8; VALUE_LEN];
        self.nvm.read_bytes(self.addr(index), &mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn write_value(&mut self, index: u16, value: f32) -> Result<WriteStatus> {
        if self.guard.in_motion() {
            return Ok(WriteStatus::Busy);
        }
        let force = value.is_nan() || value.is_infinite();
        if !force {
            if let Ok(current) = self.read_value(index) {
                if current.to_bits() == value.to_bits() {
                    return Ok(WriteStatus::Unchanged);
                }
            }
        }
        self.nvm.write_bytes(self.addr(index), &value.to_le_bytes())?;
        Ok(WriteStatus::Accepted)
    }

    /// No-op: writes are synchronous on this strategy.
    fn flush(&mut self) -> Result<FlushOutcome> {
        Ok(FlushOutcome::NothingToDo)
    }
}
