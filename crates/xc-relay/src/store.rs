//! # Cancellation Record Store
//!
//! `(CancellationId, ClientId) -> canceled` map owned by the relay actor.
//!
//! ## Invariants
//!
//! - A record that is present with `true` is the only "canceled" signal.
//! - Absence reads as "not canceled": never set, already deleted and purged
//!   are indistinguishable.
//! - Ids are keyed by their textual form, so `7` and `"7"` name one record.

use relay_telemetry::{metric_inc, CANCELLATIONS_DELETED, CANCELLATIONS_SET, STORE_PURGES, STORE_RECORDS};
use shared_types::{CancellationId, ClientId};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    id: String,
    client: ClientId,
}

impl RecordKey {
    fn new(id: &CancellationId, client: ClientId) -> Self {
        Self {
            id: id.record_key(),
            client,
        }
    }
}

/// In-memory record store. Not shared; the relay actor is its only owner.
#[derive(Debug, Default)]
pub struct CancellationStore {
    records: HashMap<RecordKey, bool>,
}

impl CancellationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `(id, client)` canceled. Setting twice is a no-op.
    pub fn set(&mut self, id: &CancellationId, client: ClientId) {
        let previous = self.records.insert(RecordKey::new(id, client), true);
        if previous != Some(true) {
            metric_inc!(CANCELLATIONS_SET);
        }
        self.update_gauge();
        debug!(id = %id, client = %client, "Record set canceled");
    }

    /// Remove `(id, client)`. Returns whether a record was present.
    pub fn delete(&mut self, id: &CancellationId, client: ClientId) -> bool {
        let removed = self.records.remove(&RecordKey::new(id, client)).is_some();
        if removed {
            metric_inc!(CANCELLATIONS_DELETED);
            self.update_gauge();
        }
        debug!(id = %id, client = %client, removed, "Record deleted");
        removed
    }

    #[must_use]
    pub fn is_canceled(&self, id: &CancellationId, client: ClientId) -> bool {
        matches!(self.records.get(&RecordKey::new(id, client)), Some(true))
    }

    /// Drop every record. Returns how many were held.
    pub fn purge(&mut self) -> usize {
        let count = self.records.len();
        self.records.clear();
        metric_inc!(STORE_PURGES);
        self.update_gauge();
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn update_gauge(&self) {
        STORE_RECORDS.set(self.records.len() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_query_before_set() {
        let store = CancellationStore::new();
        assert!(!store.is_canceled(&CancellationId::from(1), ClientId::new()));
    }

    #[test]
    fn test_set_is_scoped_to_client() {
        let mut store = CancellationStore::new();
        let id = CancellationId::from(3);
        let (a, b) = (ClientId::new(), ClientId::new());

        store.set(&id, a);

        assert!(store.is_canceled(&id, a));
        assert!(!store.is_canceled(&id, b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_reverses_set_and_is_idempotent() {
        let mut store = CancellationStore::new();
        let id = CancellationId::from("req-9");
        let client = ClientId::new();

        store.set(&id, client);
        assert!(store.delete(&id, client));
        assert!(!store.is_canceled(&id, client));
        assert!(!store.delete(&id, client));
        assert!(store.is_empty());
    }

    #[test]
    fn test_numeric_and_string_ids_share_a_record() {
        let mut store = CancellationStore::new();
        let client = ClientId::new();

        store.set(&CancellationId::from(7), client);

        assert!(store.is_canceled(&CancellationId::from("7"), client));
    }

    #[test]
    fn test_purge() {
        let mut store = CancellationStore::new();
        let client = ClientId::new();
        store.set(&CancellationId::from(1), client);
        store.set(&CancellationId::from(2), client);

        assert_eq!(store.purge(), 2);
        assert!(!store.is_canceled(&CancellationId::from(1), client));
    }

    proptest! {
        #[test]
        fn prop_never_set_reads_not_canceled(id in any::<i64>(), name in "[a-z0-9-]{1,12}") {
            let store = CancellationStore::new();
            let client = ClientId::new();
            prop_assert!(!store.is_canceled(&CancellationId::from(id), client));
            prop_assert!(!store.is_canceled(&CancellationId::from(name), client));
        }

        #[test]
        fn prop_set_only_affects_its_own_pair(set_id in any::<i64>(), other_id in any::<i64>()) {
            let mut store = CancellationStore::new();
            let (owner, stranger) = (ClientId::new(), ClientId::new());
            let set = CancellationId::from(set_id);
            let other = CancellationId::from(other_id);

            store.set(&set, owner);

            prop_assert!(store.is_canceled(&set, owner));
            prop_assert!(!store.is_canceled(&set, stranger));
            prop_assert_eq!(store.is_canceled(&other, owner), set_id == other_id);
        }

        #[test]
        fn prop_delete_after_set_reads_not_canceled(id in any::<i64>()) {
            let mut store = CancellationStore::new();
            let client = ClientId::new();
            let id = CancellationId::from(id);

            store.set(&id, client);
            store.delete(&id, client);

            prop_assert!(!store.is_canceled(&id, client));
        }
    }
}
