//! In-memory media with fault injection
//!
//! A deterministic [`Media`] for tests, benches, and host-side simulation.
//! Cloned handles share the same underlying state, so a test can keep one
//! handle to inspect or corrupt files while a store owns another, and can
//! "reboot" a store over surviving state by constructing a new one from a
//! clone.
//!
//! ## Fault injection
//! `fail_after_ops(n)` grants a budget of `n` further mutating operations
//! (create, write, sync, delete); the (n+1)th and every one after it fail
//! with an I/O error and leave the medium unchanged, which models power loss
//! at that boundary. `clear_faults` restores power.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use super::{Media, MediaFile};

#[derive(Default)]
struct MemState {
    files: HashMap<String, Vec<u8>>,
    mounted: bool,
    /// Remaining mutating operations before injected failure; `None` = no fault.
    op_budget: Option<u64>,
}

impl MemState {
    /// Charge one mutating operation against the fault budget.
    fn charge(&mut self) -> io::Result<()> {
        match self.op_budget {
            Some(0) => Err(io::Error::new(io::ErrorKind::Other, "injected media fault")),
            Some(ref mut n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Shared-state in-memory medium.
#[derive(Clone, Default)]
pub struct MemMedia {
    state: Arc<Mutex<MemState>>,
}

impl MemMedia {
    /// New, unmounted, empty medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every mutating operation after the next `ops` succeed.
    pub fn fail_after_ops(&self, ops: u64) {
        self.lock().op_budget = Some(ops);
    }

    /// Remove any injected fault.
    pub fn clear_faults(&self) {
        self.lock().op_budget = None;
    }

    /// Names of files currently present, unordered.
    pub fn file_names(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Raw contents of a file, if present.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    /// Overwrite a file's raw contents (for crafting corruption in tests).
    pub fn set_contents(&self, path: &str, bytes: Vec<u8>) {
        self.lock().files.insert(path.to_string(), bytes);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemState> {
        // A poisoned lock means a prior test panicked; the state is still
        // consistent for inspection.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Media for MemMedia {
    type File = MemFile;

    fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    fn mount(&mut self) -> io::Result<()> {
        self.lock().mounted = true;
        Ok(())
    }

    fn create_dir(&mut self, _path: &str) -> io::Result<()> {
        // Directories are implicit: files are keyed by full path.
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    fn open_read(&mut self, path: &str) -> io::Result<MemFile> {
        let state = self.lock();
        if !state.files.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()));
        }
        drop(state);
        Ok(MemFile {
            state: Arc::clone(&self.state),
            path: path.to_string(),
            pos: 0,
        })
    }

    fn open_write(&mut self, path: &str) -> io::Result<MemFile> {
        let mut state = self.lock();
        state.charge()?;
        state.files.insert(path.to_string(), Vec::new());
        drop(state);
        Ok(MemFile {
            state: Arc::clone(&self.state),
            path: path.to_string(),
            pos: 0,
        })
    }

    fn remove(&mut self, path: &str) -> io::Result<()> {
        let mut state = self.lock();
        state.charge()?;
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

/// Open handle on a [`MemMedia`] file.
pub struct MemFile {
    state: Arc<Mutex<MemState>>,
    path: String,
    pos: usize,
}

impl MemFile {
    fn with_state<T>(&self, f: impl FnOnce(&mut MemState) -> io::Result<T>) -> io::Result<T> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    fn file_len(&self) -> u64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.files.get(&self.path).map(|b| b.len() as u64).unwrap_or(0)
    }
}

impl MediaFile for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.pos;
        let path = self.path.clone();
        let n = self.with_state(|state| {
            let bytes = state
                .files
                .get(&path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.clone()))?;
            let n = buf.len().min(bytes.len().saturating_sub(pos));
            buf[..n].copy_from_slice(bytes.get(pos..pos + n).unwrap_or(&[]));
            Ok(n)
        })?;
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let pos = self.pos;
        let path = self.path.clone();
        self.with_state(|state| {
            state.charge()?;
            let bytes = state
                .files
                .get_mut(&path)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.clone()))?;
            if bytes.len() < pos + buf.len() {
                bytes.resize(pos + buf.len(), 0);
            }
            bytes[pos..pos + buf.len()].copy_from_slice(buf);
            Ok(())
        })?;
        self.pos += buf.len();
        Ok(buf.len())
    }

    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.pos = pos as usize;
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.with_state(|state| state.charge())
    }

    fn len(&self) -> u64 {
        self.file_len()
    }

    fn remaining(&self) -> u64 {
        self.file_len().saturating_sub(self.pos as u64)
    }
}
