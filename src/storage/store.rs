//! In-memory store of opportunities.
//!
//! The [`OpportunityStore`] is the authoritative, ordered collection of
//! records. Readers get either a borrowed slice or an owned snapshot; the
//! only way to change the collection is through [`OpportunityStore::add`],
//! [`OpportunityStore::update`] and [`OpportunityStore::remove`].

use std::num::NonZeroUsize;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::domain::{IdPolicy, NewOpportunity, Opportunity, OpportunityPatch};

/// Errors that can occur when mutating the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No record carries the requested id.
    #[error("opportunity {0} not found")]
    NotFound(NonZeroUsize),
}

/// The authoritative collection of opportunities, in insertion order.
///
/// Every successful mutation bumps the [revision](Self::revision), which
/// lets derived views detect that they are stale.
#[derive(Debug, Clone, Default)]
pub struct OpportunityStore {
    records: Vec<Opportunity>,

    id_policy: IdPolicy,

    /// The highest id ever handed out. Only consulted by
    /// [`IdPolicy::Monotonic`].
    high_water: usize,

    revision: u64,
}

impl OpportunityStore {
    /// Creates an empty store using the given id policy.
    #[must_use]
    pub const fn new(id_policy: IdPolicy) -> Self {
        Self {
            records: Vec::new(),
            id_policy,
            high_water: 0,
            revision: 0,
        }
    }

    /// Creates a store pre-populated with the given records.
    ///
    /// Records receive ids 1, 2, 3... in order. The resulting store is at
    /// revision zero.
    #[must_use]
    pub fn from_records(
        id_policy: IdPolicy,
        records: impl IntoIterator<Item = NewOpportunity>,
    ) -> Self {
        let mut store = Self::new(id_policy);
        for record in records {
            store.add(record);
        }
        store.revision = 0;
        store
    }

    /// Returns every record, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Opportunity] {
        &self.records
    }

    /// Returns an owned copy of every record, in insertion order.
    ///
    /// The snapshot does not change when the store is later mutated.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Opportunity> {
        self.records.clone()
    }

    /// Finds the first record with the given id.
    #[must_use]
    pub fn get(&self, id: NonZeroUsize) -> Option<&Opportunity> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the change counter.
    ///
    /// This starts at zero and increases by one on every add, every
    /// non-empty successful update and every remove that deleted something.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the id policy in use.
    #[must_use]
    pub const fn id_policy(&self) -> IdPolicy {
        self.id_policy
    }

    /// Returns the id the next [`add`](Self::add) will assign.
    #[must_use]
    pub fn next_id(&self) -> NonZeroUsize {
        match self.id_policy {
            IdPolicy::Count => NonZeroUsize::MIN.saturating_add(self.records.len()),
            IdPolicy::Monotonic => NonZeroUsize::MIN.saturating_add(self.high_water),
        }
    }

    /// Adds a new record and returns it with its assigned id.
    ///
    /// No validation is performed on the fields.
    ///
    /// With [`IdPolicy::Count`] the assigned id is the current number of
    /// records plus one. After deletions this may repeat an earlier id, or
    /// even an id that is still live; a warning is logged in the latter case.
    #[instrument(skip(self, opportunity), fields(customer = %opportunity.customer))]
    pub fn add(&mut self, opportunity: NewOpportunity) -> Opportunity {
        let id = self.next_id();

        if self.get(id).is_some() {
            warn!(%id, "assigned id is already held by a live opportunity");
        }

        let record = Opportunity::new(id, opportunity);
        self.records.push(record.clone());
        self.high_water = self.high_water.max(id.get());
        self.revision += 1;

        debug!(%id, "opportunity added");
        record
    }

    /// Merges the supplied fields into the record with the given id.
    ///
    /// Fields absent from the patch are left unchanged; the id itself can
    /// never change. If several live records share the id, all of them are
    /// patched and the first is returned.
    ///
    /// An empty patch returns the record as it is and leaves the revision
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no record has that id. The store is
    /// left unchanged in that case.
    #[instrument(skip(self, patch))]
    pub fn update(
        &mut self,
        id: NonZeroUsize,
        patch: &OpportunityPatch,
    ) -> Result<Opportunity, StoreError> {
        if patch.is_empty() {
            return self.get(id).cloned().ok_or(StoreError::NotFound(id));
        }

        let mut updated = None;
        for record in self.records.iter_mut().filter(|record| record.id() == id) {
            patch.apply(record);
            updated.get_or_insert_with(|| record.clone());
        }

        let updated = updated.ok_or(StoreError::NotFound(id))?;
        self.revision += 1;

        debug!(%id, "opportunity updated");
        Ok(updated)
    }

    /// Deletes every record with the given id.
    ///
    /// Returns whether anything was deleted. Removing an absent id is a
    /// no-op.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: NonZeroUsize) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id() != id);

        let removed = self.records.len() != before;
        if removed {
            self.revision += 1;
            debug!(%id, "opportunity removed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Stage, Value};

    fn id(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn ids(store: &OpportunityStore) -> Vec<usize> {
        store.list().iter().map(|record| record.id().get()).collect()
    }

    fn sample_store() -> OpportunityStore {
        OpportunityStore::from_records(
            IdPolicy::Count,
            [
                NewOpportunity::new("ABC Ltd", 20000),
                NewOpportunity::new("XYZ Corp", 50000).with_stage(Stage::Negotiation),
            ],
        )
    }

    #[test]
    fn add_assigns_distinct_increasing_ids() {
        let mut store = OpportunityStore::default();
        let assigned: Vec<usize> = (0..10)
            .map(|i| store.add(NewOpportunity::new(format!("C{i}"), i)).id().get())
            .collect();

        assert_eq!(assigned, (1..=10).collect::<Vec<_>>());
        assert_eq!(ids(&store), assigned);
    }

    #[test]
    fn add_returns_stored_record() {
        let mut store = OpportunityStore::default();
        let created = store.add(
            NewOpportunity::new("ABC Ltd", "20000")
                .with_stage(Stage::Qualified)
                .with_notes("warm lead"),
        );

        assert_eq!(store.get(created.id()), Some(&created));
        assert_eq!(created.display_id().to_string(), "O-001");
        assert_eq!(created.stage, Stage::Qualified);
    }

    #[test]
    fn add_performs_no_validation() {
        let mut store = OpportunityStore::default();
        let created = store.add(NewOpportunity::new("", ""));
        assert_eq!(created.id().get(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn from_records_starts_at_revision_zero() {
        let store = sample_store();
        assert_eq!(ids(&store), vec![1, 2]);
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn update_merges_and_preserves_id() {
        let mut store = sample_store();
        let updated = store
            .update(id(1), &OpportunityPatch::default().value(99999))
            .unwrap();

        assert_eq!(updated.id().get(), 1);
        assert_eq!(updated.customer, "ABC Ltd");
        assert_eq!(updated.value, Value::from(99999));
        assert_eq!(updated.stage, Stage::Prospecting);
        assert_eq!(store.get(id(1)), Some(&updated));
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn update_missing_id_is_not_found() {
        let mut store = sample_store();
        let before = store.snapshot();

        let err = store
            .update(id(3), &OpportunityPatch::default().customer("Nobody"))
            .unwrap_err();

        assert_eq!(err, StoreError::NotFound(id(3)));
        assert_eq!(store.list(), before.as_slice());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn empty_update_keeps_revision() {
        let mut store = sample_store();

        let unchanged = store.update(id(2), &OpportunityPatch::default()).unwrap();

        assert_eq!(store.get(id(2)), Some(&unchanged));
        assert_eq!(store.revision(), 0);
        assert_eq!(
            store.update(id(9), &OpportunityPatch::default()),
            Err(StoreError::NotFound(id(9)))
        );
    }

    #[test]
    fn remove_reports_whether_deleted() {
        let mut store = sample_store();
        assert!(store.remove(id(1)));
        assert_eq!(ids(&store), vec![2]);
        assert!(!store.remove(id(1)));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = sample_store();
        store.remove(id(2));
        let after_first = store.snapshot();
        let revision = store.revision();

        assert!(!store.remove(id(2)));
        assert_eq!(store.list(), after_first.as_slice());
        assert!(!store.remove(id(2)));
        assert_eq!(store.list(), after_first.as_slice());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn count_policy_reuses_deleted_id() {
        let mut store = sample_store();
        store.remove(id(2));

        let created = store.add(NewOpportunity::new("New Co", 1));

        // count (1) + 1
        assert_eq!(created.id().get(), 2);
        assert_eq!(ids(&store), vec![1, 2]);
    }

    #[test]
    fn count_policy_can_collide_with_live_id() {
        let mut store = sample_store();
        store.add(NewOpportunity::new("Third", 3));
        store.remove(id(1));

        let created = store.add(NewOpportunity::new("Fourth", 4));

        assert_eq!(created.id().get(), 3);
        assert_eq!(ids(&store), vec![2, 3, 3]);

        // both records carrying the id are affected
        store
            .update(id(3), &OpportunityPatch::default().stage(Stage::ClosedLost))
            .unwrap();
        assert!(
            store
                .list()
                .iter()
                .filter(|record| record.id() == id(3))
                .all(|record| record.stage == Stage::ClosedLost)
        );
        assert!(store.remove(id(3)));
        assert_eq!(ids(&store), vec![2]);
    }

    #[test]
    fn monotonic_policy_never_reuses_ids() {
        let mut store = OpportunityStore::from_records(
            IdPolicy::Monotonic,
            [
                NewOpportunity::new("ABC Ltd", 20000),
                NewOpportunity::new("XYZ Corp", 50000),
            ],
        );
        store.remove(id(2));
        store.remove(id(1));

        assert_eq!(store.next_id().get(), 3);
        assert_eq!(store.add(NewOpportunity::new("New Co", 1)).id().get(), 3);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut store = sample_store();
        let snapshot = store.snapshot();
        store.remove(id(1));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.len(), 1);
    }
}
