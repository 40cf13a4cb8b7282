//! Tape barcode parsing and the A/B set numbering scheme.
//!
//! A tape's barcode is its manifest's file stem: `KD0097.mhl` → `KD0097`.
//! Barcodes are four ASCII word characters followed by two ASCII digits.
//! The leading letters name the project (`KD`), and the final digit places
//! the tape in one of two alternating delivery sets:
//!
//! | last digit | set | tape in set |
//! |-----------:|:---:|------------:|
//! | 1          | A   | 1           |
//! | 2          | B   | 1           |
//! | 3          | A   | 2           |
//! | 4          | B   | 2           |
//! | 7          | A   | 4           |
//! | 0          | B   | 0           |
//!
//! The scheme assumes digits cycle 1–9 per physical set, so a trailing `0`
//! yields tape 0. That is reported as-is rather than corrected.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

static BARCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?-u:\w){4}[0-9]{2}$").expect("barcode pattern is valid"));

#[derive(Error, Debug, PartialEq)]
pub enum BarcodeError {
    #[error("Invalid barcode '{0}': expected four ASCII word characters followed by two ASCII digits")]
    Invalid(String),
}

/// Which of the two alternating delivery sets a tape belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SetId {
    A,
    B,
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SetId::A => "A",
            SetId::B => "B",
        })
    }
}

/// A validated tape barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    value: String,
    last_digit: u32,
}

impl Barcode {
    /// Accepts ASCII only: four `[A-Za-z0-9_]` characters, then two `0-9` digits.
    pub fn parse(value: &str) -> Result<Self, BarcodeError> {
        let invalid = || BarcodeError::Invalid(value.to_string());
        if !BARCODE.is_match(value) {
            return Err(invalid());
        }
        let last_digit = value
            .chars()
            .next_back()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(invalid)?;
        Ok(Self {
            value: value.to_string(),
            last_digit,
        })
    }

    /// Barcode from a manifest path: the file name with its extension stripped.
    pub fn from_manifest_path(path: &Path) -> Result<Self, BarcodeError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::parse(&stem)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn set_id(&self) -> SetId {
        if self.last_digit % 2 == 1 {
            SetId::A
        } else {
            SetId::B
        }
    }

    pub fn tape_in_set(&self) -> u32 {
        let digit = self.last_digit;
        match self.set_id() {
            SetId::A => (digit + 1) / 2,
            SetId::B => digit / 2,
        }
    }

    /// Leading ASCII letters, used as the project identifier (`KD0097` → `KD`).
    pub fn project_prefix(&self) -> Option<&str> {
        let end = self
            .value
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.value.len());
        (end > 0).then(|| &self.value[..end])
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
