//! Raw form input and the presence guard applied before it reaches the store.

use std::num::NonZeroUsize;

use tracing::{debug, instrument};

use crate::{
    domain::{InvalidStageError, NewOpportunity, Opportunity, OpportunityPatch, Stage, Value},
    storage::{OpportunityStore, StoreError},
};

/// The transient state of a create or edit form.
///
/// Every field is held as the text the user typed. Nothing is validated
/// until [`Draft::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Customer name.
    pub customer: String,
    /// Expected value, as typed.
    pub value: String,
    /// Stage label.
    pub stage: String,
    /// Expected closing date, as typed. Empty means absent.
    pub closing_date: String,
    /// Notes. Empty means absent.
    pub notes: String,
}

impl Default for Draft {
    fn default() -> Self {
        Self {
            customer: String::new(),
            value: String::new(),
            stage: Stage::default().label().to_string(),
            closing_date: String::new(),
            notes: String::new(),
        }
    }
}

impl From<&Opportunity> for Draft {
    /// Pre-fill an edit form from an existing record.
    fn from(opportunity: &Opportunity) -> Self {
        Self {
            customer: opportunity.customer.clone(),
            value: opportunity.value.to_string(),
            stage: opportunity.stage.label().to_string(),
            closing_date: opportunity.closing_date.clone().unwrap_or_default(),
            notes: opportunity.notes.clone().unwrap_or_default(),
        }
    }
}

/// The outcome of submitting a [`Draft`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The customer or value was blank, so nothing happened.
    Skipped,
    /// A new record was added.
    Created(Opportunity),
    /// An existing record was updated.
    Updated(Opportunity),
    /// The record being edited no longer exists.
    NotFound(NonZeroUsize),
}

impl Draft {
    /// Whether the draft passes the presence guard.
    ///
    /// Both customer and value must be non-empty. No other validation is
    /// performed.
    #[must_use]
    pub fn is_submittable(&self) -> bool {
        !self.customer.is_empty() && !self.value.is_empty()
    }

    /// Submit the draft to the store.
    ///
    /// With `editing` set, every field of the record with that id is
    /// replaced by the draft's fields. Otherwise a new record is added.
    /// A value whose text is unchanged from the stored record keeps its
    /// stored form, so a numeric value stays numeric.
    ///
    /// A draft with a blank customer or value is skipped without touching
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage text does not name a pipeline stage.
    #[instrument(skip(store))]
    pub fn submit(
        &self,
        store: &mut OpportunityStore,
        editing: Option<NonZeroUsize>,
    ) -> Result<Submission, InvalidStageError> {
        if !self.is_submittable() {
            debug!("draft is missing customer or value; skipping");
            return Ok(Submission::Skipped);
        }

        let stage: Stage = self.stage.parse()?;

        let submission = match editing {
            None => Submission::Created(store.add(self.to_new_opportunity(stage))),
            Some(id) => {
                let value_unchanged = store
                    .get(id)
                    .is_some_and(|existing| existing.value.to_string() == self.value);
                match store.update(id, &self.to_patch(stage, value_unchanged)) {
                    Ok(updated) => Submission::Updated(updated),
                    Err(StoreError::NotFound(id)) => Submission::NotFound(id),
                }
            }
        };

        Ok(submission)
    }

    fn to_new_opportunity(&self, stage: Stage) -> NewOpportunity {
        NewOpportunity {
            customer: self.customer.clone(),
            value: Value::from(self.value.as_str()),
            stage,
            closing_date: non_empty(&self.closing_date),
            notes: non_empty(&self.notes),
        }
    }

    fn to_patch(&self, stage: Stage, keep_value: bool) -> OpportunityPatch {
        let patch = OpportunityPatch::default()
            .customer(self.customer.as_str())
            .stage(stage)
            .closing_date(non_empty(&self.closing_date))
            .notes(non_empty(&self.notes));
        if keep_value {
            patch
        } else {
            patch.value(self.value.as_str())
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}
