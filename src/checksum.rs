//! Integrity Validator
//!
//! Every persistence file ends in a 4-byte CRC32 trailer (IEEE polynomial,
//! seed 0, little-endian) computed over all preceding bytes. Verification
//! streams the file in fixed-size blocks; record data may exceed available
//! RAM in aggregate, so nothing loads a file whole.
//!
//! A mismatching trailer means the file is treated as nonexistent, never
//! partially trusted.

use crc32fast::Hasher;

use crate::error::{Result, StoreError};
use crate::media::{MediaFile, IO_BUFFER_SIZE};

/// Length of the checksum trailer in bytes.
pub const TRAILER_LEN: usize = 4;

/// Fill `buf` completely from `file`, treating early end-of-file as a media
/// error.
pub(crate) fn read_full<F: MediaFile>(file: &mut F, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            return Err(StoreError::Media(format!(
                "short read: {filled} of {} bytes",
                buf.len()
            )));
        }
        filled += n;
    }
    Ok(())
}

/// Verify `file`'s trailer against a checksum recomputed over the rest of
/// the file. Leaves the cursor at end of file on success.
///
/// Files shorter than the trailer itself are integrity failures, not I/O
/// errors: a truncated artifact of a power loss is "no valid data."
pub fn verify_trailer<F: MediaFile>(file: &mut F) -> Result<()> {
    let len = file.len();
    if len < TRAILER_LEN as u64 {
        return Err(StoreError::Integrity(format!(
            "file too short for trailer: {len} bytes"
        )));
    }

    file.seek(0)?;
    let mut hasher = Hasher::new();
    let mut buf = [0u8; IO_BUFFER_SIZE];
    let mut left = len - TRAILER_LEN as u64;
    while left > 0 {
        let want = left.min(IO_BUFFER_SIZE as u64) as usize;
        read_full(file, &mut buf[..want])?;
        hasher.update(&buf[..want]);
        left -= want as u64;
    }

    let mut trailer = [0u8; TRAILER_LEN];
    read_full(file, &mut trailer)?;
    let stored = u32::from_le_bytes(trailer);
    let computed = hasher.finalize();
    if stored != computed {
        return Err(StoreError::Integrity(format!(
            "trailer {stored:#010x} != computed {computed:#010x}"
        )));
    }
    Ok(())
}
