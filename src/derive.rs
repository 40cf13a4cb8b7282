//! Summary derivation.
//!
//! Reduces a parsed manifest and its path decomposition into the sorted,
//! deduplicated values the delivery document needs: total size, set and
//! tape numbering, shoot dates, day numbers, unit references, rolls and
//! file formats.
//!
//! ## Shoot day tokens
//!
//! Day folders carry a date and a `<UNIT><day>` suffix, in either order:
//!
//! ```text
//! KINGDOM_20240115-MU03   → 01/15/2024, MU03, Main Unit
//! DAY_MU03-20240115       → 01/15/2024, MU03, Main Unit
//! 20240116_2U01           → 01/16/2024, 2U01, Second Unit
//! ```
//!
//! The date is the first run of eight digits. The suffix is the `-` or `_`
//! separated component right after the date, else the one right before it,
//! and must be a two-character unit code followed by digits. Its first two
//! characters are the unit code. Day folders come from years of legacy
//! tapes, so a token that does not fit is a [`ReviewNote`], not an error.

use crate::barcode::{Barcode, SetId};
use crate::config::ToolConfig;
use crate::decompose::Decomposition;
use crate::mhl::Manifest;
use crate::types::{MediaType, ReviewNote};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static DATE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{8}").expect("date pattern is valid"));

/// Two-character unit code followed by the day number: `MU03`, `2U01`.
static DAY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{2}[0-9]+$").expect("suffix pattern is valid"));

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with decimal (1000-based) units.
///
/// Picks the smallest unit whose value, once rounded to two decimals, is
/// below 1000 (capped at TB): `999` → `999B`, `1000` → `1.0KB`,
/// `2_500_000` → `2.5MB`, `1_234_567_890` → `1.23GB`.
pub fn scale_size(bytes: u64) -> String {
    if bytes < 1000 {
        return format!("{bytes}B");
    }
    let round2 = |v: f64| (v * 100.0).round() / 100.0;
    let mut value = bytes as f64;
    let mut unit = 0;
    let mut rounded = round2(value);
    // Compare after rounding so 999.996KB shows as 1.0MB, not 1000.0KB
    while rounded >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
        rounded = round2(value);
    }
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}{}", SIZE_UNITS[unit])
    } else {
        format!("{rounded}{}", SIZE_UNITS[unit])
    }
}

/// A decomposed shoot day folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShootDay {
    pub date: NaiveDate,
    /// Unit code plus day number, e.g. `MU03`.
    pub day_number: String,
    pub unit_code: String,
    /// Unit reference, `None` when the code is not in the unit table.
    pub unit: Option<String>,
}

impl ShootDay {
    /// Date as `MM/DD/YYYY`.
    pub fn formatted_date(&self) -> String {
        self.date.format("%m/%d/%Y").to_string()
    }
}

/// Decompose a day token. `None` if it has no valid date or no suffix.
pub fn parse_shoot_day(token: &str, units: &BTreeMap<String, String>) -> Option<ShootDay> {
    let digits = DATE_RUN.find(token)?.as_str();
    let date = NaiveDate::parse_from_str(digits, "%Y%m%d").ok()?;

    let parts: Vec<&str> = token.split(['-', '_']).collect();
    let date_at = parts.iter().position(|part| part.contains(digits))?;
    let after = parts.get(date_at + 1);
    let before = date_at.checked_sub(1).and_then(|i| parts.get(i));
    let suffix = *[after, before]
        .into_iter()
        .flatten()
        .find(|part| DAY_SUFFIX.is_match(part))?;
    let unit_code: String = suffix.chars().take(2).collect();

    Some(ShootDay {
        date,
        day_number: suffix.to_string(),
        unit: units.get(&unit_code).cloned(),
        unit_code,
    })
}

/// Everything the document needs, computed once per manifest.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedSummary {
    pub barcode: String,
    pub set_id: SetId,
    pub tape_in_set: u32,
    pub write_date: Option<NaiveDate>,
    pub software: Option<String>,
    pub total_files: usize,
    pub total_bytes: u64,
    pub total_size: String,
    pub file_formats: BTreeSet<String>,
    pub day_tokens: BTreeSet<String>,
    pub shoot_dates: BTreeSet<String>,
    pub shoot_day_numbers: BTreeSet<String>,
    pub units: BTreeSet<String>,
    pub camera_rolls: BTreeSet<String>,
    pub sound_rolls: BTreeSet<String>,
    pub media_types: BTreeSet<MediaType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub review: Vec<ReviewNote>,
}

impl DerivedSummary {
    /// Write date as `MM/DD/YYYY`, empty when the manifest had none.
    pub fn formatted_write_date(&self) -> String {
        self.write_date
            .map(|d| d.format("%m/%d/%Y").to_string())
            .unwrap_or_default()
    }
}

pub fn derive(
    manifest: &Manifest,
    decomposition: &Decomposition,
    barcode: &Barcode,
    config: &ToolConfig,
) -> DerivedSummary {
    let mut review = Vec::new();
    let mut shoot_dates = BTreeSet::new();
    let mut shoot_day_numbers = BTreeSet::new();
    let mut units = BTreeSet::new();

    for token in &decomposition.days {
        let Some(day) = parse_shoot_day(token, &config.units) else {
            tracing::warn!(token = %token, "could not parse shoot day");
            review.push(ReviewNote::UnparseableDay {
                token: token.clone(),
            });
            continue;
        };
        shoot_dates.insert(day.formatted_date());
        shoot_day_numbers.insert(day.day_number.clone());
        match day.unit {
            Some(unit) => {
                units.insert(unit);
            }
            None => {
                tracing::warn!(token = %token, code = %day.unit_code, "unknown unit code");
                review.push(ReviewNote::UnknownUnit {
                    token: token.clone(),
                    code: day.unit_code,
                });
            }
        }
    }

    let mut file_formats = config.delivery.fixed_extension_set();
    file_formats.extend(decomposition.extensions.iter().cloned());

    let total_bytes = manifest.total_bytes();

    DerivedSummary {
        barcode: barcode.to_string(),
        set_id: barcode.set_id(),
        tape_in_set: barcode.tape_in_set(),
        write_date: manifest.header.write_date,
        software: manifest.header.tool.clone(),
        total_files: manifest.records.len() + config.delivery.companion_files,
        total_bytes,
        total_size: scale_size(total_bytes),
        file_formats,
        day_tokens: decomposition.days.iter().cloned().collect(),
        shoot_dates,
        shoot_day_numbers,
        units,
        camera_rolls: decomposition.rolls_of(MediaType::Camera),
        sound_rolls: decomposition.rolls_of(MediaType::Sound),
        media_types: decomposition.media_types(),
        review,
    }
}
