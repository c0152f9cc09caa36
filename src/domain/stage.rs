use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The position of an opportunity in the sales pipeline.
///
/// This is a closed set. Text that does not name one of the six stages
/// exactly is rejected with an [`InvalidStageError`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Initial contact; the default for new opportunities.
    #[default]
    Prospecting,
    /// The customer has a confirmed need.
    Qualified,
    /// A proposal has been sent.
    Proposal,
    /// Terms are being negotiated.
    Negotiation,
    /// The deal was won.
    #[serde(rename = "Closed Won")]
    ClosedWon,
    /// The deal was lost.
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl Stage {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Prospecting,
        Self::Qualified,
        Self::Proposal,
        Self::Negotiation,
        Self::ClosedWon,
        Self::ClosedLost,
    ];

    /// Returns the canonical label, e.g. `"Closed Won"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Prospecting => "Prospecting",
            Self::Qualified => "Qualified",
            Self::Proposal => "Proposal",
            Self::Negotiation => "Negotiation",
            Self::ClosedWon => "Closed Won",
            Self::ClosedLost => "Closed Lost",
        }
    }

    /// Whether the opportunity has left the pipeline.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::ClosedWon | Self::ClosedLost)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = InvalidStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.label() == s)
            .ok_or_else(|| InvalidStageError(s.to_string()))
    }
}

/// Error returned when text does not name one of the pipeline stages.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "Invalid stage '{0}': expected one of Prospecting, Qualified, Proposal, Negotiation, Closed \
     Won, Closed Lost"
)]
pub struct InvalidStageError(pub String);

/// The stage selector applied when filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StageFilter {
    /// Every stage passes.
    #[default]
    All,
    /// Only opportunities in exactly this stage pass.
    Only(Stage),
}

impl StageFilter {
    /// The label of the catch-all selector.
    pub const ALL_LABEL: &'static str = "All";

    /// Checks whether a stage passes this selector.
    #[must_use]
    pub fn admits(self, stage: Stage) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == stage,
        }
    }
}

impl From<Stage> for StageFilter {
    fn from(stage: Stage) -> Self {
        Self::Only(stage)
    }
}

impl fmt::Display for StageFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL_LABEL),
            Self::Only(stage) => stage.fmt(f),
        }
    }
}

impl FromStr for StageFilter {
    type Err = InvalidStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::ALL_LABEL {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}
