//! Shared types used across pipeline stages.
//!
//! [`MediaType`] is produced by path decomposition and read by derivation and
//! rendering. [`ReviewNote`] is the common currency for soft failures: any
//! stage may emit one, and the pipeline folds them into a single
//! "manual fix required" decision.

use serde::Serialize;
use std::fmt;

/// The two media classes a tape can carry.
///
/// Set and tape numbering downstream assume exactly these two, so any other
/// type segment in a manifest path is a hard error rather than a third variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MediaType {
    Camera,
    Sound,
}

impl MediaType {
    /// Parse the literal directory segment (`CAMERA` / `SOUND`). Case-sensitive.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "CAMERA" => Some(Self::Camera),
            "SOUND" => Some(Self::Sound),
            _ => None,
        }
    }

    /// Label used in rendered documents.
    pub fn label(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Sound => "Sound",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A soft failure: the document is still produced but needs a human pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewNote {
    /// Day token has no usable date or no unit/day suffix.
    UnparseableDay { token: String },
    /// Day token parsed, but its unit code is not in the unit table.
    UnknownUnit { token: String, code: String },
    /// Camera roll matched none of the project's format rules.
    UnmatchedRoll { roll: String },
}

impl fmt::Display for ReviewNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparseableDay { token } => write!(f, "could not parse shoot day '{token}'"),
            Self::UnknownUnit { token, code } => {
                write!(f, "unknown unit code '{code}' in shoot day '{token}'")
            }
            Self::UnmatchedRoll { roll } => {
                write!(f, "camera roll '{roll}' matches no format rule")
            }
        }
    }
}
