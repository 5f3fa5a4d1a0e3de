//! Per-line tokenization memoization.
//!
//! The cache is an explicit object: the parser side creates it, similarity
//! differs share it through an `Arc`, and the benchmark controller clears it
//! between measurements so one measurement never benefits from another's
//! warm entries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Memoized line tokens, keyed by line value.
///
/// Guarded by a mutex because a cancelled worker may still be reading from it
/// while the controller moves on to the next measurement.
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: Mutex<HashMap<String, Arc<[String]>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens of `line`, computed on first use.
    ///
    /// A token is a maximal run of alphanumeric characters.
    pub fn tokens(&self, line: &str) -> Arc<[String]> {
        let mut entries = self.lock();
        if let Some(tokens) = entries.get(line) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(tokens);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let tokens: Arc<[String]> = tokenize(line).into();
        entries.insert(line.to_string(), Arc::clone(&tokens));
        tokens
    }

    /// Drop every memoized entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        tracing::trace!(dropped, "token cache cleared");
    }

    /// Clear and release the backing allocation.
    pub fn release(&self) {
        let mut entries = self.lock();
        entries.clear();
        entries.shrink_to_fit();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<[String]>>> {
        // A worker that panicked mid-insert leaves a usable map behind.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn tokenize(line: &str) -> Vec<String> {
    line.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
