use std::{io, num::NonZeroUsize, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::display_id::{self, DisplayId};

/// Configuration for opportunity tracking.
///
/// This struct holds settings that control how display identifiers are
/// formatted and how the store assigns new ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The prefix of the display identifier.
    ///
    /// For example, 'O' in 'O-007'.
    prefix: String,

    /// The number of digits in the display identifier.
    ///
    /// Ids are padded to this width with leading zeros.
    /// For example, '007' (3 digits) or '0007' (4 digits).
    digits: usize,

    /// How the store picks the id of a new opportunity.
    pub id_policy: IdPolicy,
}

/// How the store picks the id of a new opportunity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdPolicy {
    /// The new id is the current number of records plus one.
    ///
    /// After a deletion this can hand out an id that was used before, or one
    /// that is still held by a live record.
    #[default]
    Count,
    /// The new id is one more than the highest id ever assigned.
    Monotonic,
}

/// Errors that can occur while loading or saving a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] io::Error),

    /// The file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] io::Error),

    /// The file is not a valid configuration.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            digits: default_digits(),
            id_policy: IdPolicy::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// A blank file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Returns the display identifier prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the number of digits for padding display identifiers.
    #[must_use]
    pub const fn digits(&self) -> usize {
        self.digits
    }

    /// Formats an id as a display identifier using this configuration.
    #[must_use]
    pub fn display_id(&self, id: NonZeroUsize) -> DisplayId<'_> {
        DisplayId::with_format(id, &self.prefix, self.digits)
    }

    /// Parses an id typed by a user, in either bare or display form.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid id for this configuration.
    pub fn parse_id(&self, s: &str) -> Result<NonZeroUsize, display_id::Error> {
        display_id::parse(s, &self.prefix)
    }
}

fn default_prefix() -> String {
    display_id::DEFAULT_PREFIX.to_string()
}

const fn default_digits() -> usize {
    display_id::DEFAULT_DIGITS
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_prefix")]
        prefix: String,

        #[serde(default = "default_digits")]
        digits: usize,

        #[serde(default)]
        id_policy: IdPolicy,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                prefix,
                digits,
                id_policy,
            } => Self {
                prefix,
                digits,
                id_policy,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            prefix: config.prefix,
            digits: config.digits,
            id_policy: config.id_policy,
        }
    }
}
