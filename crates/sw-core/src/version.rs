//! Dotted version numbers used to name migration directories.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A migration version such as `1.2` or `16.12.1`.
///
/// Equality, ordering and hashing only look at the parsed integer components,
/// so `1.02` and `1.2` are the same version. The original string is kept for
/// display and for rendering file name templates.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
    original: String,
}

impl Version {
    /// Parse a dot-separated version string.
    pub fn from_string(value: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidVersion {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if value.is_empty() {
            return Err(invalid("version is empty"));
        }

        let parts = value
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid(&format!("'{}' is not an integer", part)));
                }
                part.parse::<u64>()
                    .map_err(|e| invalid(&format!("'{}': {}", part, e)))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self {
            parts,
            original: value.to_string(),
        })
    }

    /// Returns `true` when `value` parses as a version.
    pub fn is_version(value: &str) -> bool {
        Self::from_string(value).is_ok()
    }

    /// The string this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Integer components of the version.
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Canonical rendering without leading zeros (`0.01.2` -> `0.1.2`).
    pub fn normalized(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Vec ordering is lexicographic and treats a strict prefix as smaller
        self.parts.cmp(&other.parts)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for Version {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
