//! # nvstore
//!
//! Crash-safe non-volatile parameter store for motion-control firmware:
//! - Sparse numeric machine parameters keyed by small integer indices
//! - Rotating-file integrity: survive power loss at any point with only
//!   plain file primitives (no atomic rename, no transaction log)
//! - Batched write-back: caller-visible writes return immediately; a
//!   rate-limited, motion-gated scheduler makes them durable
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Configuration Layer                         │
//! │            (read / write / periodic flush)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Value Store                              │
//! │      reads: cache ▸ media      writes: cache (deferred)     │
//! └────────┬────────────────────────────────────────┬───────────┘
//!          │                                        │
//!          ▼                                        ▼
//!   ┌─────────────┐   periodic tick        ┌─────────────┐
//!   │ Write Cache │ ─────────────────────▶ │  Committer  │
//!   │ (index→val) │                        │ (rotate ring)│
//!   └─────────────┘                        └──────┬──────┘
//!                                                 │
//!                              ┌──────────────────┼──────────────┐
//!                              ▼                  ▼              ▼
//!                        ┌──────────┐      ┌──────────┐   ┌──────────┐
//!                        │ File Ring│      │ Checksum │   │  Media   │
//!                        │ (3 slots)│      │ (trailer)│   │ (blocks) │
//!                        └──────────┘      └──────────┘   └──────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod backend;
pub mod cache;
pub mod checksum;
pub mod clock;
pub mod guard;
pub mod media;
pub mod ring;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use backend::{Backend, ByteNvm, EepromStore, FlushOutcome, MemEeprom, WriteStatus, VALUE_LEN};
pub use clock::{ManualTicks, SystemTicks, TickSource};
pub use config::Config;
pub use error::{Result, StoreError};
pub use guard::{MotionFlag, MotionGuard};
pub use media::{DiskMedia, Media, MediaFile, MemMedia, IO_BUFFER_SIZE};
pub use store::FileStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of nvstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
