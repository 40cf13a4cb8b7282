//! Camera roll → camera type / extraction format mapping.
//!
//! Each project supplies an ordered table of [`FormatRule`]s. A rule's
//! pattern is matched against the start of a camera roll name (`A001R1AB`
//! matches `A\d{3}R`). Every matching rule contributes, so a roll that
//! matches two rules reports both camera types. The collected values are
//! deduplicated and sorted.
//!
//! A roll that matches nothing is reported as a [`ReviewNote`] so a human can
//! fill in the blanks. The rest of the document is still produced.

use crate::types::ReviewNote;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

/// One row of a project's format mapping table.
#[derive(Debug, Clone)]
pub struct FormatRule {
    /// Anchored at the start of the roll name.
    pattern: Regex,
    source: String,
    pub camera_type: String,
    pub extraction_format: String,
}

impl FormatRule {
    /// Compile a rule. The pattern only needs to match a prefix of the roll.
    pub fn new(
        pattern: &str,
        camera_type: impl Into<String>,
        extraction_format: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{pattern})"))?,
            source: pattern.to_string(),
            camera_type: camera_type.into(),
            extraction_format: extraction_format.into(),
        })
    }

    /// The pattern as written in the preset.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, roll: &str) -> bool {
        self.pattern.is_match(roll)
    }
}

/// Result of mapping every camera roll through the rule table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatMapping {
    pub camera_types: BTreeSet<String>,
    pub extraction_formats: BTreeSet<String>,
    /// Rolls no rule matched, sorted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

impl FormatMapping {
    pub fn review_notes(&self) -> Vec<ReviewNote> {
        self.unmatched
            .iter()
            .map(|roll| ReviewNote::UnmatchedRoll { roll: roll.clone() })
            .collect()
    }
}

pub fn map_rolls<'a>(
    rolls: impl IntoIterator<Item = &'a String>,
    rules: &[FormatRule],
) -> FormatMapping {
    let mut mapping = FormatMapping::default();

    for roll in rolls {
        let mut matched = false;
        for rule in rules.iter().filter(|r| r.matches(roll)) {
            matched = true;
            mapping.camera_types.insert(rule.camera_type.clone());
            mapping
                .extraction_formats
                .insert(rule.extraction_format.clone());
        }
        if !matched {
            tracing::warn!(roll = %roll, "camera roll matches no format rule");
            mapping.unmatched.push(roll.clone());
        }
    }

    mapping.unmatched.sort();
    mapping.unmatched.dedup();
    mapping
}
