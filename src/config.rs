//! Model configuration
//!
//! Both settings default to the behaviour of the plain check-then-write
//! design; stricter modes are opt-in.

use serde::{Deserialize, Serialize};

/// How uniqueness checks relate to concurrent saves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniquenessMode {
    /// Check, then commit, with no isolation. Two concurrent saves of new
    /// records with the same unique value can both pass the check and both
    /// commit.
    #[default]
    CheckThenWrite,
    /// Saves of new records through one `Model` hold a per-model lock from
    /// the uniqueness check until the batch commits. Saves issued through
    /// other handles or processes are not covered.
    Serialized,
}

/// What to do with keys a schema does not declare
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndeclaredFields {
    /// Drop them when the record is constructed
    #[default]
    Drop,
    /// Refuse to construct the record
    Reject,
}

/// Behaviour switches of a `Model`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub uniqueness: UniquenessMode,
    #[serde(default)]
    pub undeclared_fields: UndeclaredFields,
}

impl ModelConfig {
    /// Config with serialized uniqueness checks
    pub fn serialized() -> Self {
        Self {
            uniqueness: UniquenessMode::Serialized,
            ..Self::default()
        }
    }

    /// Config that rejects undeclared keys
    pub fn strict_fields(mut self) -> Self {
        self.undeclared_fields = UndeclaredFields::Reject;
        self
    }
}
