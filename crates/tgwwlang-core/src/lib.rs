use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod placeholders;

pub use placeholders::{scan_placeholders, PlaceholderSet};

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Typed failures that are not data anomalies. Anomalies in langfiles are
/// reported as diagnostics and never end up here.
#[derive(Debug, Error)]
pub enum TgwwError {
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Which input a document was loaded as. Used to route diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Model,
    Base,
    Target,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileRole::Model => "model",
            FileRole::Base => "base",
            FileRole::Target => "target",
        })
    }
}

/// Deprecation status of a key, aggregated over all its definitions.
///
/// The discriminants double as a two-bit set: bit 0 is "an active definition
/// exists", bit 1 is "a deprecated definition exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deprecation {
    Active = 1,
    Deprecated = 2,
    Both = 3,
}

impl Deprecation {
    /// Status contributed by a single definition.
    pub fn of_flag(deprecated: bool) -> Self {
        if deprecated {
            Deprecation::Deprecated
        } else {
            Deprecation::Active
        }
    }

    /// Status of a key given which of its two flags are present. `None` when
    /// neither is.
    pub fn from_presence(active: bool, deprecated: bool) -> Option<Self> {
        match (active, deprecated) {
            (true, true) => Some(Deprecation::Both),
            (true, false) => Some(Deprecation::Active),
            (false, true) => Some(Deprecation::Deprecated),
            (false, false) => None,
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn union(self, other: Deprecation) -> Deprecation {
        match self.rank() | other.rank() {
            1 => Deprecation::Active,
            2 => Deprecation::Deprecated,
            _ => Deprecation::Both,
        }
    }
}

/// Immutable header of a langfile (`<language>` element).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub name: String,
    /// Parent language identifier.
    pub base: String,
    pub variant: String,
    /// Empty means the langfile is public.
    pub owner: String,
    pub is_default: bool,
}

impl LanguageSummary {
    pub fn is_closed(&self) -> bool {
        !self.owner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_bitwise() {
        use Deprecation::*;
        assert_eq!(Active.union(Active), Active);
        assert_eq!(Active.union(Deprecated), Both);
        assert_eq!(Deprecated.union(Deprecated), Deprecated);
        assert_eq!(Both.union(Active), Both);
    }

    #[test]
    fn presence_roundtrips_through_flags() {
        assert_eq!(Deprecation::from_presence(false, false), None);
        assert_eq!(Deprecation::from_presence(true, true), Some(Deprecation::Both));
        assert_eq!(Deprecation::from_presence(false, true), Some(Deprecation::Deprecated));
        assert!(Deprecation::of_flag(true).rank() > Deprecation::of_flag(false).rank());
    }
}
