//! Account identifier normalization
//!
//! Identifiers arrive from CLI arguments and spreadsheet cells with stray
//! whitespace and mixed case. They are normalized once at that boundary; the
//! lookup layer only ever sees [`Identifier`] values.

use crate::IdentifierError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A normalized account identifier (IBAN)
///
/// Always upper-case, free of whitespace, and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Normalizes a raw identifier
    ///
    /// Removes all whitespace (leading, trailing, and interior) and converts
    /// the remaining characters to upper case.
    ///
    /// # Example
    ///
    /// ```
    /// use iban_probe::Identifier;
    ///
    /// let id = Identifier::normalize(" ro49 aaaa 1b31 0075 9384 0000 ").unwrap();
    /// assert_eq!(id.as_str(), "RO49AAAA1B31007593840000");
    /// ```
    pub fn normalize(raw: &str) -> Result<Self, IdentifierError> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect();

        if normalized.is_empty() {
            return Err(IdentifierError::Empty);
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
