//! Fetch failure statistics.
//!
//! Thread-safe counters for per-host fetch failures, one per
//! [`FetchErrorKind`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FetchErrorKind;

/// Thread-safe fetch failure tracker.
///
/// All kinds are initialized to zero on creation, so the struct can be shared
/// across fetch tasks behind an `Arc` without further locking.
pub struct FetchStats {
    errors: HashMap<FetchErrorKind, AtomicUsize>,
}

impl FetchStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for kind in FetchErrorKind::iter() {
            errors.insert(kind, AtomicUsize::new(0));
        }
        FetchStats { errors }
    }

    pub fn increment(&self, kind: FetchErrorKind) {
        if let Some(counter) = self.errors.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment fetch error counter for {:?} which is not in the map",
                kind
            );
        }
    }

    pub fn get(&self, kind: FetchErrorKind) -> usize {
        self.errors
            .get(&kind)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.errors
            .values()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Non-zero counters in declaration order.
    pub fn non_zero(&self) -> Vec<(FetchErrorKind, usize)> {
        FetchErrorKind::iter()
            .map(|kind| (kind, self.get(kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn reset(&self) {
        for counter in self.errors.values() {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}
