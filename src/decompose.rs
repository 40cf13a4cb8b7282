//! Positional path decomposition.
//!
//! Each manifest path is split on `/` and read at three fixed indices, the
//! [`Levels`]:
//!
//! ```text
//! KD0097/KINGDOM/DAILIES/ORIGINAL/KINGDOM_20240115-MU03/CAMERA/A001R1AB/A001C003.ari
//!   0       1       2       3              4 (day)        5 (media) 6 (roll)
//! ```
//!
//! The media segment must be exactly `CAMERA` or `SOUND`. Anything else is a
//! hard error: set and tape numbering assume those two classes only.
//! A roll is classified once; the same roll name under both media types
//! means the manifest is inconsistent.

use crate::config::Levels;
use crate::mhl::Manifest;
use crate::types::MediaType;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DecomposeError {
    #[error("Path has {found} segments, at least {needed} required: {path}")]
    PathTooShallow {
        path: String,
        found: usize,
        needed: usize,
    },
    #[error("Unrecognized media type '{segment}' (expected CAMERA or SOUND): {path}")]
    UnrecognizedMediaType { segment: String, path: String },
    #[error("Roll '{0}' appears under both CAMERA and SOUND")]
    ConflictingRoll(String),
}

/// Tokens pulled out of every path in a manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decomposition {
    /// Distinct day tokens, first-seen order.
    pub days: Vec<String>,
    /// Distinct roll names, first-seen order.
    pub rolls: Vec<String>,
    /// Roll name → media class.
    pub classification: BTreeMap<String, MediaType>,
    /// Lower-cased extensions of the listed files.
    pub extensions: BTreeSet<String>,
}

impl Decomposition {
    /// Rolls of one media class, sorted.
    pub fn rolls_of(&self, media: MediaType) -> BTreeSet<String> {
        self.classification
            .iter()
            .filter(|&(_, &m)| m == media)
            .map(|(roll, _)| roll.clone())
            .collect()
    }

    /// Media classes present on the tape.
    pub fn media_types(&self) -> BTreeSet<MediaType> {
        self.classification.values().copied().collect()
    }
}

/// Lower-cased suffix after the last `.`; `None` for names without one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

pub fn decompose(manifest: &Manifest, levels: &Levels) -> Result<Decomposition, DecomposeError> {
    let needed = levels.required_depth();
    let mut out = Decomposition::default();
    let mut seen_days = HashSet::new();
    let mut seen_rolls = HashSet::new();

    for record in &manifest.records {
        let segments = &record.segments;
        if segments.len() < needed {
            return Err(DecomposeError::PathTooShallow {
                path: record.path(),
                found: segments.len(),
                needed,
            });
        }

        let day = &segments[levels.day];
        let media_segment = &segments[levels.media];
        let roll = &segments[levels.roll];

        let media = MediaType::from_segment(media_segment).ok_or_else(|| {
            DecomposeError::UnrecognizedMediaType {
                segment: media_segment.clone(),
                path: record.path(),
            }
        })?;

        match out.classification.get(roll) {
            Some(&existing) if existing != media => {
                return Err(DecomposeError::ConflictingRoll(roll.clone()));
            }
            Some(_) => {}
            None => {
                out.classification.insert(roll.clone(), media);
            }
        }

        if seen_days.insert(day.as_str()) {
            out.days.push(day.clone());
        }
        if seen_rolls.insert(roll.as_str()) {
            out.rolls.push(roll.clone());
        }
        if let Some(ext) = extension_of(record.file_name()) {
            out.extensions.insert(ext);
        }
    }

    tracing::debug!(
        days = out.days.len(),
        rolls = out.rolls.len(),
        extensions = out.extensions.len(),
        "decomposed manifest paths"
    );
    Ok(out)
}
