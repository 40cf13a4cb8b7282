//! Template rendering.
//!
//! Substitutes a fixed set of `{PLACEHOLDER}` tokens in a project template
//! with derived values. Substitution is literal and single-pass: the template
//! is scanned once, left to right, and substituted text is never rescanned,
//! so a roll named `{DATE}` stays `{DATE}`. Unknown tokens are copied through
//! untouched.
//!
//! | Token | Value |
//! |-------|-------|
//! | `{BARCODE}` | tape barcode (`KD0097`) |
//! | `{DATE}` | manifest write date, `MM/DD/YYYY` |
//! | `{SOFTWARE}` | write tool from the manifest |
//! | `{TOTALSIZE}` | scaled total (`1.42TB`) |
//! | `{TOTALFILES}` | listed files plus companion files |
//! | `{SETID}` / `{TAPEINSET}` | A/B set and tape number within it |
//! | `{FILEFORMAT}` | file extensions |
//! | `{SHOOTDATE}` / `{SHOOTDAYNUMBER}` / `{UNITREFERENCE}` | from day folders |
//! | `{CAMERASOUNDROLLNUMBERS}` | camera rolls, then sound rolls |
//! | `{CAMERASOUND}` | media classes present (`Camera, Sound`) |
//! | `{CAMERATYPES}` / `{CAMERAFILEEXTRACTION}` | from format mapping |
//!
//! Multi-valued fields are joined with `", "`.

use crate::derive::DerivedSummary;
use crate::format_map::FormatMapping;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[A-Z][A-Z0-9_]*\}").expect("token pattern is valid"));

/// Separator for multi-valued fields.
pub const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    Barcode,
    Date,
    TotalSize,
    SetId,
    TapeInSet,
    TotalFiles,
    CameraSoundRollNumbers,
    FileFormat,
    ShootDayNumber,
    ShootDate,
    UnitReference,
    CameraTypes,
    CameraFileExtraction,
    CameraSound,
    Software,
}

impl Placeholder {
    pub const ALL: [Placeholder; 15] = [
        Placeholder::Barcode,
        Placeholder::Date,
        Placeholder::TotalSize,
        Placeholder::SetId,
        Placeholder::TapeInSet,
        Placeholder::TotalFiles,
        Placeholder::CameraSoundRollNumbers,
        Placeholder::FileFormat,
        Placeholder::ShootDayNumber,
        Placeholder::ShootDate,
        Placeholder::UnitReference,
        Placeholder::CameraTypes,
        Placeholder::CameraFileExtraction,
        Placeholder::CameraSound,
        Placeholder::Software,
    ];

    /// The literal token as it appears in templates.
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Barcode => "{BARCODE}",
            Placeholder::Date => "{DATE}",
            Placeholder::TotalSize => "{TOTALSIZE}",
            Placeholder::SetId => "{SETID}",
            Placeholder::TapeInSet => "{TAPEINSET}",
            Placeholder::TotalFiles => "{TOTALFILES}",
            Placeholder::CameraSoundRollNumbers => "{CAMERASOUNDROLLNUMBERS}",
            Placeholder::FileFormat => "{FILEFORMAT}",
            Placeholder::ShootDayNumber => "{SHOOTDAYNUMBER}",
            Placeholder::ShootDate => "{SHOOTDATE}",
            Placeholder::UnitReference => "{UNITREFERENCE}",
            Placeholder::CameraTypes => "{CAMERATYPES}",
            Placeholder::CameraFileExtraction => "{CAMERAFILEEXTRACTION}",
            Placeholder::CameraSound => "{CAMERASOUND}",
            Placeholder::Software => "{SOFTWARE}",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }
}

/// Placeholder values for one manifest.
pub type Values = BTreeMap<Placeholder, String>;

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Compute every placeholder's value.
pub fn values(summary: &DerivedSummary, mapping: &FormatMapping) -> Values {
    let media = summary
        .media_types
        .iter()
        .map(|m| m.label())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR);

    Placeholder::ALL
        .into_iter()
        .map(|p| {
            let value = match p {
                Placeholder::Barcode => summary.barcode.clone(),
                Placeholder::Date => summary.formatted_write_date(),
                Placeholder::TotalSize => summary.total_size.clone(),
                Placeholder::SetId => summary.set_id.to_string(),
                Placeholder::TapeInSet => summary.tape_in_set.to_string(),
                Placeholder::TotalFiles => summary.total_files.to_string(),
                Placeholder::CameraSoundRollNumbers => {
                    join(summary.camera_rolls.iter().chain(&summary.sound_rolls))
                }
                Placeholder::FileFormat => join(&summary.file_formats),
                Placeholder::ShootDayNumber => join(&summary.shoot_day_numbers),
                Placeholder::ShootDate => join(&summary.shoot_dates),
                Placeholder::UnitReference => join(&summary.units),
                Placeholder::CameraTypes => join(&mapping.camera_types),
                Placeholder::CameraFileExtraction => join(&mapping.extraction_formats),
                Placeholder::CameraSound => media.clone(),
                Placeholder::Software => summary.software.clone().unwrap_or_default(),
            };
            (p, value)
        })
        .collect()
}

/// Replace every recognized token in `template`. Unknown tokens pass through.
pub fn render(template: &str, values: &Values) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let candidate = &rest[open..];
        let hit = values
            .iter()
            .find(|(p, _)| candidate.starts_with(p.token()));
        match hit {
            Some((p, value)) => {
                out.push_str(value);
                rest = &candidate[p.token().len()..];
            }
            None => {
                out.push('{');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Placeholder-shaped tokens left in rendered text, in order of appearance.
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
