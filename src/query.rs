//! The query engine.
//!
//! A record is visible when the lower-cased search text occurs in any of its
//! display identifier, customer, numeric id or value, and its stage passes
//! the [`StageFilter`]. Filtering is a pure function of the records and the
//! [`Query`]; [`FilteredView`] caches the result until either input changes.

use tracing::{debug, instrument};

use crate::{
    domain::{
        Config, DisplayId, Opportunity, StageFilter,
        display_id::{DEFAULT_DIGITS, DEFAULT_PREFIX},
    },
    storage::OpportunityStore,
};

/// Returns the records matching `query` and `stage`, preserving their order.
///
/// Display identifiers are matched in their default `O-001` form.
#[must_use]
pub fn filter<'a>(
    records: &'a [Opportunity],
    query: &str,
    stage: StageFilter,
) -> Vec<&'a Opportunity> {
    Query::new(query, stage).apply(records)
}

/// Search criteria: free text plus a stage selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The search text, lower-cased.
    needle: String,
    stage: StageFilter,
    prefix: String,
    digits: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self::new("", StageFilter::All)
    }
}

impl Query {
    /// Creates a query matching display identifiers in the default format.
    #[must_use]
    pub fn new(text: &str, stage: StageFilter) -> Self {
        Self {
            needle: text.to_lowercase(),
            stage,
            prefix: DEFAULT_PREFIX.to_string(),
            digits: DEFAULT_DIGITS,
        }
    }

    /// Creates a query matching display identifiers as formatted by `config`.
    #[must_use]
    pub fn with_config(text: &str, stage: StageFilter, config: &Config) -> Self {
        Self {
            prefix: config.prefix().to_string(),
            digits: config.digits(),
            ..Self::new(text, stage)
        }
    }

    /// Returns the normalized search text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.needle
    }

    /// Returns the stage selector.
    #[must_use]
    pub const fn stage(&self) -> StageFilter {
        self.stage
    }

    /// Replaces the search text.
    pub fn set_text(&mut self, text: &str) {
        self.needle = text.to_lowercase();
    }

    /// Replaces the stage selector.
    pub const fn set_stage(&mut self, stage: StageFilter) {
        self.stage = stage;
    }

    /// Checks whether a single record passes both predicates.
    #[must_use]
    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        self.stage.admits(opportunity.stage) && self.matches_text(opportunity)
    }

    fn matches_text(&self, opportunity: &Opportunity) -> bool {
        let needle = self.needle.as_str();
        if needle.is_empty() {
            return true;
        }

        let display_id = DisplayId::with_format(opportunity.id(), &self.prefix, self.digits);

        display_id.to_string().to_lowercase().contains(needle)
            || opportunity.customer.to_lowercase().contains(needle)
            || opportunity.id().to_string().contains(needle)
            || opportunity.value.to_string().to_lowercase().contains(needle)
    }

    /// Returns the matching records, preserving their order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [Opportunity]) -> Vec<&'a Opportunity> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

/// A cached filtered view over an [`OpportunityStore`].
///
/// The view stores positions into the store rather than copies of records.
/// Positions are only valid for the store revision they were computed at, so
/// [`rows`](Self::rows) takes the query and refreshes first; a mutation
/// between two calls never shifts a non-matching record into view.
///
/// A view tracks a single store; refreshing it against a different store
/// that happens to share a revision number will not trigger a recompute.
#[derive(Debug, Default)]
pub struct FilteredView {
    /// The store revision and query the positions were computed from.
    inputs: Option<(u64, Query)>,
    positions: Vec<usize>,
}

impl FilteredView {
    /// Creates a view that will compute on its first refresh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the view if the store or the query changed.
    ///
    /// Returns whether a recompute took place.
    #[instrument(level = "debug", skip_all)]
    pub fn refresh(&mut self, store: &OpportunityStore, query: &Query) -> bool {
        let revision = store.revision();
        let unchanged = self
            .inputs
            .as_ref()
            .is_some_and(|(last_revision, last_query)| {
                *last_revision == revision && last_query == query
            });
        if unchanged {
            return false;
        }

        self.positions = store
            .list()
            .iter()
            .enumerate()
            .filter(|(_, record)| query.matches(record))
            .map(|(position, _)| position)
            .collect();
        self.inputs = Some((revision, query.clone()));

        debug!(
            revision,
            visible = self.positions.len(),
            total = store.len(),
            "filtered view recomputed"
        );
        true
    }

    /// Returns the visible records, in store order.
    ///
    /// Recomputes first if the store or the query changed since the last
    /// refresh.
    pub fn rows<'a>(
        &mut self,
        store: &'a OpportunityStore,
        query: &Query,
    ) -> Vec<&'a Opportunity> {
        self.refresh(store, query);
        let records = store.list();
        self.positions
            .iter()
            .filter_map(|&position| records.get(position))
            .collect()
    }

    /// Returns the number of visible records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether no records are visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
