use std::{fmt, num::NonZeroUsize};

/// The prefix used when no configuration overrides it.
pub const DEFAULT_PREFIX: &str = "O";

/// The zero-padded width used when no configuration overrides it.
pub const DEFAULT_DIGITS: usize = 3;

/// The human-readable identifier of an opportunity.
///
/// Format: `{PREFIX}-{ID}`, where `ID` is zero-padded to a minimum width.
/// Ids wider than the padding are printed in full.
///
/// A display identifier is derived from the numeric id on demand. It is used
/// for presentation and as a search target, never as a storage key.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use opportunities::DisplayId;
///
/// let id = NonZeroUsize::new(7).unwrap();
/// assert_eq!(DisplayId::new(id).to_string(), "O-007");
/// assert_eq!(DisplayId::with_format(id, "OPP", 5).to_string(), "OPP-00007");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayId<'a> {
    prefix: &'a str,
    id: NonZeroUsize,
    digits: usize,
}

impl DisplayId<'static> {
    /// Create a display identifier with the default prefix and width.
    #[must_use]
    pub const fn new(id: NonZeroUsize) -> Self {
        Self::with_format(id, DEFAULT_PREFIX, DEFAULT_DIGITS)
    }
}

impl<'a> DisplayId<'a> {
    /// Create a display identifier with the given prefix and width.
    #[must_use]
    pub const fn with_format(id: NonZeroUsize, prefix: &'a str, digits: usize) -> Self {
        Self { prefix, id, digits }
    }
}

impl fmt::Display for DisplayId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{:0width$}", self.prefix, self.id, width = self.digits)
    }
}

/// Errors that can occur while parsing an id typed by a user.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The prefix did not match.
    #[error("Invalid identifier '{0}': expected a number or {1}-<number>")]
    Prefix(String, String),

    /// The numeric part was not a non-zero integer.
    #[error("Invalid ID in '{0}': expected a non-zero integer, got '{1}'")]
    Id(String, String),
}

/// Parse an id from either its bare numeric form (`7`) or its display form
/// (`O-007`). The prefix is matched case-insensitively.
///
/// # Errors
///
/// Returns an error if the text carries a different prefix or if the numeric
/// part is not a positive integer.
pub fn parse(s: &str, prefix: &str) -> Result<NonZeroUsize, Error> {
    let s = s.trim();
    let digits = match s.split_once('-') {
        None => s,
        Some((head, tail)) if head.eq_ignore_ascii_case(prefix) => tail,
        Some(_) => return Err(Error::Prefix(s.to_string(), prefix.to_string())),
    };

    digits
        .parse::<usize>()
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| Error::Id(s.to_string(), digits.to_string()))
}
