//! In-memory Sales Opportunity Tracking
//!
//! Opportunities are held in an [`OpportunityStore`] and searched with a
//! [`Query`], either directly via [`query::filter`] or through a cached
//! [`FilteredView`].

pub mod domain;
pub use domain::{
    Config, DisplayId, Draft, IdPolicy, InvalidStageError, NewOpportunity, Opportunity,
    OpportunityPatch, Stage, StageFilter, Submission, Value,
};

/// The authoritative in-memory collection of opportunities.
pub mod storage;
pub use storage::{OpportunityStore, StoreError};

/// Free-text and stage filtering over a sequence of opportunities.
pub mod query;
pub use query::{FilteredView, Query};
