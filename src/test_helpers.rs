//! Shared test utilities for the metablock test suite.
//!
//! Builders for hash-list text, canonical tape paths, and a sample preset,
//! so module tests describe their input in a line or two instead of pasting
//! XML.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let text = HashList::new()
//!     .tool("YoYotta 4.1")
//!     .start_date("2024-01-16T09:12:44Z")
//!     .file(&tape_path("KINGDOM_20240115-MU03", "CAMERA", "A001R1AB", "a.ari"), 42)
//!     .build();
//! ```

use std::fs;
use std::path::Path;

use crate::barcode::SetId;
use crate::derive::DerivedSummary;
use crate::types::MediaType;
use chrono::NaiveDate;

// =========================================================================
// Hash-list text
// =========================================================================

/// Builds hash-list text line by line.
///
/// Line 1 is the XML declaration and line 2 the version marker. The creator
/// block is only emitted when a tool or date is set, so without one the
/// first item lands on line 3.
#[derive(Default)]
pub struct HashList {
    tool: Option<String>,
    start_date: Option<String>,
    finish_date: Option<String>,
    items: Vec<String>,
}

impl HashList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(mut self, tool: &str) -> Self {
        self.tool = Some(tool.to_string());
        self
    }

    pub fn start_date(mut self, date: &str) -> Self {
        self.start_date = Some(date.to_string());
        self
    }

    pub fn finish_date(mut self, date: &str) -> Self {
        self.finish_date = Some(date.to_string());
        self
    }

    /// A complete `<hash>` block with file and size.
    pub fn file(mut self, path: &str, size: u64) -> Self {
        self.items.push("  <hash>".to_string());
        self.items.push(format!("    <file>{path}</file>"));
        self.items.push(format!("    <size>{size}</size>"));
        self.items
            .push("    <md5>d41d8cd98f00b204e9800998ecf8427e</md5>".to_string());
        self.items.push("  </hash>".to_string());
        self
    }

    /// A single verbatim line.
    pub fn raw(mut self, line: &str) -> Self {
        self.items.push(line.to_string());
        self
    }

    pub fn build(self) -> String {
        let mut lines = vec![
            r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
            r#"<hashlist version="1.1">"#.to_string(),
        ];
        if self.tool.is_some() || self.start_date.is_some() || self.finish_date.is_some() {
            lines.push("  <creatorinfo>".to_string());
            if let Some(tool) = &self.tool {
                lines.push(format!("    <tool>{tool}</tool>"));
            }
            if let Some(date) = &self.start_date {
                lines.push(format!("    <startdate>{date}</startdate>"));
            }
            if let Some(date) = &self.finish_date {
                lines.push(format!("    <finishdate>{date}</finishdate>"));
            }
            lines.push("  </creatorinfo>".to_string());
        }
        lines.extend(self.items);
        lines.push("</hashlist>".to_string());
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// Hash-list text with the given files and no creator block.
pub fn hashlist(files: &[(&str, u64)]) -> String {
    files
        .iter()
        .fold(HashList::new(), |list, (path, size)| list.file(path, *size))
        .build()
}

/// A path in the standard tape layout, day/media/roll at levels 4/5/6.
pub fn tape_path(day: &str, media: &str, roll: &str, file: &str) -> String {
    format!("KD0097/KINGDOM/DAILIES/ORIGINAL/{day}/{media}/{roll}/{file}")
}

// =========================================================================
// Presets
// =========================================================================

pub const SAMPLE_PRESET: &str = "\
TITLE: Kingdom S01
FACILITY BARCODE: {BARCODE}L7
DATE WRITTEN: {DATE}
SOFTWARE: {SOFTWARE}
SET: {SETID} TAPE: {TAPEINSET}
TOTAL SIZE: {TOTALSIZE} ({TOTALFILES} files)
SHOOT DATES: {SHOOTDATE}
SHOOT DAYS: {SHOOTDAYNUMBER}
UNITS: {UNITREFERENCE}
CONTENT: {CAMERASOUND}
ROLLS: {CAMERASOUNDROLLNUMBERS}
FORMATS: {FILEFORMAT}
CAMERAS: {CAMERATYPES}
EXTRACTION: {CAMERAFILEEXTRACTION}

<FORMAT MAPPING>
# regex,camera type,extraction format
[A-F]\\d{3}R,ARRI Alexa 35,ARRIRAW (HDE)
[G-K]\\d{3},RED V-Raptor,REDCODE RAW
A\\d{3}R1,ARRI Alexa Mini LF,ARRIRAW
";

/// Write `KD.txt` with [`SAMPLE_PRESET`] into `dir`.
pub fn write_presets(dir: &Path) {
    fs::write(dir.join("KD.txt"), SAMPLE_PRESET).unwrap();
}

// =========================================================================
// Derived values
// =========================================================================

fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Summary of a two-day, two-camera, one-sound tape.
pub fn sample_summary() -> DerivedSummary {
    DerivedSummary {
        barcode: "KD0097".into(),
        set_id: SetId::A,
        tape_in_set: 4,
        write_date: NaiveDate::from_ymd_opt(2024, 1, 16),
        software: Some("YoYotta 4.1".into()),
        total_files: 7,
        total_bytes: 2_500_500,
        total_size: "2.5MB".into(),
        file_formats: set(&["ari", "md5", "mhl", "txt", "wav"]),
        day_tokens: set(&["KINGDOM_20240115-MU03", "KINGDOM_20240116-MU04"]),
        shoot_dates: set(&["01/15/2024", "01/16/2024"]),
        shoot_day_numbers: set(&["MU03", "MU04"]),
        units: set(&["Main Unit"]),
        camera_rolls: set(&["A001R1AB", "B002R1CD"]),
        sound_rolls: set(&["SR001"]),
        media_types: [MediaType::Camera, MediaType::Sound].into_iter().collect(),
        review: vec![],
    }
}
