//! Transfer-decision diffing between a remote listing and recorded state.
//!
//! The persisted state, not remote presence, is the source of truth for
//! idempotence: a name already recorded as transferred is never reported
//! again, even if the remote source still lists it.

use std::collections::HashSet;

use crate::remote::RemoteFile;

/// Computes which listed files still need to be transferred
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    skip_empty: bool,
}

impl DiffEngine {
    /// Create a diff engine. With `skip_empty`, zero-byte listing entries
    /// (placeholder and lock files) are excluded from consideration.
    pub fn new(skip_empty: bool) -> Self {
        Self { skip_empty }
    }

    /// Set subtraction: listed names minus already-transferred names.
    ///
    /// The result is sorted so a partial failure leaves reproducible state
    /// across runs.
    pub fn diff(&self, listing: &[RemoteFile], transferred: &HashSet<String>) -> Vec<String> {
        let mut pending: Vec<String> = listing
            .iter()
            .filter(|file| !(self.skip_empty && file.size == 0))
            .filter(|file| !transferred.contains(&file.name))
            .map(|file| file.name.clone())
            .collect();
        pending.sort();
        pending.dedup();
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(entries: &[(&str, u64)]) -> Vec<RemoteFile> {
        entries
            .iter()
            .map(|(name, size)| RemoteFile {
                name: name.to_string(),
                size: *size,
            })
            .collect()
    }

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn subtracts_transferred_names() {
        let engine = DiffEngine::new(false);
        let remote = listing(&[("a.csv", 1), ("b.csv", 2), ("c.csv", 3)]);

        let pending = engine.diff(&remote, &set(&["b.csv"]));
        assert_eq!(pending, vec!["a.csv", "c.csv"]);
    }

    #[test]
    fn everything_transferred_yields_empty_diff() {
        let engine = DiffEngine::new(false);
        let remote = listing(&[("a.csv", 1), ("b.csv", 2)]);
        assert!(engine.diff(&remote, &set(&["a.csv", "b.csv"])).is_empty());
    }

    #[test]
    fn empty_state_yields_full_listing() {
        let engine = DiffEngine::new(false);
        let remote = listing(&[("b.csv", 2), ("a.csv", 1)]);
        assert_eq!(engine.diff(&remote, &HashSet::new()), vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn result_is_sorted_regardless_of_listing_order() {
        let engine = DiffEngine::new(false);
        let remote = listing(&[("zebra.txt", 1), ("apple.txt", 1), ("mango.txt", 1)]);
        assert_eq!(
            engine.diff(&remote, &HashSet::new()),
            vec!["apple.txt", "mango.txt", "zebra.txt"]
        );
    }

    #[test]
    fn zero_byte_entries_are_skipped_when_configured() {
        let remote = listing(&[("lock.tmp", 0), ("data.csv", 500)]);

        let filtering = DiffEngine::new(true);
        assert_eq!(filtering.diff(&remote, &HashSet::new()), vec!["data.csv"]);

        // Off by default
        let plain = DiffEngine::new(false);
        assert_eq!(
            plain.diff(&remote, &HashSet::new()),
            vec!["data.csv", "lock.tmp"]
        );
    }
}
