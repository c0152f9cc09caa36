//! Domain models for opportunity tracking.
//!
//! This module contains the core domain types including opportunities,
//! pipeline stages, display identifiers, drafts, and configuration.

/// Opportunity domain model.
pub mod opportunity;
pub use opportunity::{NewOpportunity, Opportunity, OpportunityPatch, Value};

/// Pipeline stages and the stage selector.
pub mod stage;
pub use stage::{InvalidStageError, Stage, StageFilter};

/// Display identifier (`O-007`) formatting and parsing.
pub mod display_id;
pub use display_id::DisplayId;

/// Raw form input awaiting submission.
pub mod draft;
pub use draft::{Draft, Submission};

mod config;
pub use config::{Config, ConfigError, IdPolicy};
