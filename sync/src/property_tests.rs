//! Property tests for diffing and state round-trips using proptest

use std::collections::HashSet;

use proptest::prelude::*;

use crate::diff::DiffEngine;
use crate::remote::RemoteFile;
use crate::state::StateStore;

/// Strategy for generating plausible remote file names
fn file_name() -> impl Strategy<Value = String> {
    "[a-z0-9_\\-]{1,12}\\.[a-z]{1,4}"
}

fn name_set() -> impl Strategy<Value = HashSet<String>> {
    prop::collection::hash_set(file_name(), 0..16)
}

fn listing_for(names: &HashSet<String>) -> Vec<RemoteFile> {
    names
        .iter()
        .map(|name| RemoteFile {
            name: name.clone(),
            size: 1,
        })
        .collect()
}

proptest! {
    #[test]
    fn diff_is_set_subtraction(remote in name_set(), transferred in name_set()) {
        let result: HashSet<String> = DiffEngine::new(false)
            .diff(&listing_for(&remote), &transferred)
            .into_iter()
            .collect();
        let expected: HashSet<String> = remote.difference(&transferred).cloned().collect();
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn diff_of_a_listing_against_itself_is_empty(remote in name_set()) {
        let result = DiffEngine::new(false).diff(&listing_for(&remote), &remote);
        prop_assert!(result.is_empty());
    }

    #[test]
    fn diff_against_empty_state_is_the_full_listing(remote in name_set()) {
        let result: HashSet<String> = DiffEngine::new(false)
            .diff(&listing_for(&remote), &HashSet::new())
            .into_iter()
            .collect();
        prop_assert_eq!(result, remote);
    }

    #[test]
    fn state_round_trips_as_a_set(names in name_set()) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::in_dir(dir.path(), "prop");
        store.save(&names).unwrap();
        prop_assert_eq!(store.load().unwrap(), names);
    }
}
