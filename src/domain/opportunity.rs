use std::{fmt, num::NonZeroUsize};

use serde::{Deserialize, Serialize};

use crate::domain::{DisplayId, Stage};

/// The expected value of an opportunity.
///
/// Values are accepted either as numbers or as raw text (as typed into a
/// form). No currency parsing is performed; the text form is passed through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A numeric value.
    Number(f64),
    /// A value as entered, e.g. `"99999"`.
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A sales-pipeline record.
///
/// The id is assigned by the [`OpportunityStore`](crate::OpportunityStore)
/// and cannot be changed afterwards. All other fields are replaceable through
/// [`OpportunityStore::update`](crate::OpportunityStore::update).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    id: NonZeroUsize,
    /// Name of the customer.
    pub customer: String,
    /// Expected value of the deal.
    pub value: Value,
    /// Current pipeline stage.
    #[serde(default)]
    pub stage: Stage,
    /// Expected closing date, as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_date: Option<String>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Opportunity {
    pub(crate) fn new(id: NonZeroUsize, fields: NewOpportunity) -> Self {
        let NewOpportunity {
            customer,
            value,
            stage,
            closing_date,
            notes,
        } = fields;

        Self {
            id,
            customer,
            value,
            stage,
            closing_date,
            notes,
        }
    }

    /// Returns the numeric id.
    #[must_use]
    pub const fn id(&self) -> NonZeroUsize {
        self.id
    }

    /// Returns the display identifier with the default format, e.g. `O-007`.
    #[must_use]
    pub const fn display_id(&self) -> DisplayId<'static> {
        DisplayId::new(self.id)
    }
}

/// The fields supplied when creating an opportunity.
///
/// The store accepts these as given; presence checks on `customer` and
/// `value` are the caller's responsibility (see [`Draft`](crate::Draft)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewOpportunity {
    /// Name of the customer.
    pub customer: String,
    /// Expected value of the deal.
    pub value: Value,
    /// Initial stage (defaults to [`Stage::Prospecting`]).
    pub stage: Stage,
    /// Expected closing date.
    pub closing_date: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl NewOpportunity {
    /// Creates the fields for a prospecting opportunity.
    #[must_use]
    pub fn new(customer: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            customer: customer.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// Sets the initial stage.
    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Sets the expected closing date.
    #[must_use]
    pub fn with_closing_date(mut self, closing_date: impl Into<String>) -> Self {
        self.closing_date = Some(closing_date.into());
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A partial set of fields to merge into an existing opportunity.
///
/// Fields left as `None` are not touched. The optional fields use a nested
/// option so that a patch can clear them (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpportunityPatch {
    /// Replacement customer name.
    pub customer: Option<String>,
    /// Replacement value.
    pub value: Option<Value>,
    /// Replacement stage.
    pub stage: Option<Stage>,
    /// Replacement closing date.
    pub closing_date: Option<Option<String>>,
    /// Replacement notes.
    pub notes: Option<Option<String>>,
}

impl OpportunityPatch {
    /// Replace the customer.
    #[must_use]
    pub fn customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    /// Replace the value.
    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Replace the stage.
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Replace (or clear, with `None`) the closing date.
    #[must_use]
    pub fn closing_date(mut self, closing_date: Option<String>) -> Self {
        self.closing_date = Some(closing_date);
        self
    }

    /// Replace (or clear, with `None`) the notes.
    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.customer.is_none()
            && self.value.is_none()
            && self.stage.is_none()
            && self.closing_date.is_none()
            && self.notes.is_none()
    }

    /// Merge the supplied fields into `opportunity`. The id is never touched.
    pub(crate) fn apply(&self, opportunity: &mut Opportunity) {
        if let Some(customer) = &self.customer {
            opportunity.customer.clone_from(customer);
        }
        if let Some(value) = &self.value {
            opportunity.value.clone_from(value);
        }
        if let Some(stage) = self.stage {
            opportunity.stage = stage;
        }
        if let Some(closing_date) = &self.closing_date {
            opportunity.closing_date.clone_from(closing_date);
        }
        if let Some(notes) = &self.notes {
            opportunity.notes.clone_from(notes);
        }
    }
}
