//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each manifest is shown by its identity (positional index and barcode),
//! with the source path and derived values as indented context lines. Review
//! notes are listed last so the lines a human has to act on stand out.
//!
//! ## Build
//!
//! ```text
//! 001 KD0097 → KINGDOM_A001_KD0097L7_METADATA.txt
//!     Source: tapes/KD0097.mhl
//!     Set A, tape 4: 2.5MB in 7 files
//!     Shoot days: MU03, MU04
//!     Rolls: A001R1AB, G002 | SR001
//! 002 KD0098 → KINGDOM_A001_KD0098L7_METADATA - Manual Fix.txt
//!     Source: tapes/KD0098.mhl
//!     Set B, tape 4: 1.1GB in 12 files
//!     Shoot days: MU05
//!     Rolls: Z900
//!     Review: camera roll 'Z900' matches no format rule
//! 003 KD0099 FAILED
//!     Source: tapes/KD0099.mhl
//!     Error: Roll 'R01' appears under both CAMERA and SOUND
//!
//! Processed 3 manifests: 2 ok, 1 need manual fix, 1 failed
//! ```
//!
//! `check` prints the same blocks without the `→ filename` part, plus any
//! `Unresolved:` template tokens.
//!
//! # Architecture
//!
//! Each block has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::Outcome;
use std::fmt::Display;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Running tally for the batch footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub flagged: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &Outcome) {
        self.processed += 1;
        if outcome.needs_review() {
            self.flagged += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    pub fn succeeded(&self) -> usize {
        self.processed - self.failed
    }
}

// ============================================================================
// Per-manifest blocks
// ============================================================================

/// Format one processed manifest.
///
/// `written` is the output filename for `build`, `None` for `check`.
pub fn format_outcome(
    index: usize,
    source: &Path,
    outcome: &Outcome,
    written: Option<&str>,
) -> Vec<String> {
    let s = &outcome.summary;
    let header = match written {
        Some(name) => format!("{} {} \u{2192} {}", format_index(index), s.barcode, name),
        None => format!("{} {}", format_index(index), s.barcode),
    };

    let mut lines = vec![
        header,
        format!("{}Source: {}", indent(1), source.display()),
        format!(
            "{}Set {}, tape {}: {} in {} files",
            indent(1),
            s.set_id,
            s.tape_in_set,
            s.total_size,
            s.total_files
        ),
    ];
    if !s.shoot_day_numbers.is_empty() {
        lines.push(format!(
            "{}Shoot days: {}",
            indent(1),
            join(&s.shoot_day_numbers)
        ));
    }

    let rolls = match (s.camera_rolls.is_empty(), s.sound_rolls.is_empty()) {
        (true, true) => None,
        (false, true) => Some(join(&s.camera_rolls)),
        (true, false) => Some(join(&s.sound_rolls)),
        (false, false) => Some(format!(
            "{} | {}",
            join(&s.camera_rolls),
            join(&s.sound_rolls)
        )),
    };
    if let Some(rolls) = rolls {
        lines.push(format!("{}Rolls: {}", indent(1), rolls));
    }

    for note in &outcome.notes {
        lines.push(format!("{}Review: {}", indent(1), note));
    }
    if written.is_none() {
        for token in &outcome.unresolved {
            lines.push(format!("{}Unresolved: {}", indent(1), token));
        }
    }
    lines
}

pub fn print_outcome(index: usize, source: &Path, outcome: &Outcome, written: Option<&str>) {
    for line in format_outcome(index, source, outcome, written) {
        println!("{}", line);
    }
}

/// Format a manifest that failed with a hard error.
pub fn format_failure(index: usize, source: &Path, error: &dyn Display) -> Vec<String> {
    let name = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());
    vec![
        format!("{} {} FAILED", format_index(index), name),
        format!("{}Source: {}", indent(1), source.display()),
        format!("{}Error: {}", indent(1), error),
    ]
}

pub fn print_failure(index: usize, source: &Path, error: &dyn Display) {
    for line in format_failure(index, source, error) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch footer
// ============================================================================

pub fn format_batch_footer(stats: &BatchStats) -> String {
    let noun = if stats.processed == 1 {
        "manifest"
    } else {
        "manifests"
    };
    let mut footer = format!(
        "Processed {} {}: {} ok",
        stats.processed,
        noun,
        stats.succeeded() - stats.flagged
    );
    if stats.flagged > 0 {
        footer.push_str(&format!(", {} need manual fix", stats.flagged));
    }
    if stats.failed > 0 {
        footer.push_str(&format!(", {} failed", stats.failed));
    }
    footer
}

pub fn print_batch_footer(stats: &BatchStats) {
    println!();
    println!("{}", format_batch_footer(stats));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format_map::FormatMapping;
    use crate::test_helpers::sample_summary;
    use crate::types::ReviewNote;

    fn outcome() -> Outcome {
        Outcome {
            name: "KD".into(),
            deliverable: "A001".into(),
            medium: "L7".into(),
            summary: sample_summary(),
            mapping: FormatMapping::default(),
            document: String::new(),
            notes: vec![],
            unresolved: vec![],
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // format_outcome
    // =========================================================================

    #[test]
    fn build_block_shows_written_name() {
        let lines = format_outcome(
            1,
            Path::new("tapes/KD0097.mhl"),
            &outcome(),
            Some("KD_A001_KD0097L7_METADATA.txt"),
        );
        assert_eq!(
            lines,
            vec![
                "001 KD0097 \u{2192} KD_A001_KD0097L7_METADATA.txt",
                "    Source: tapes/KD0097.mhl",
                "    Set A, tape 4: 2.5MB in 7 files",
                "    Shoot days: MU03, MU04",
                "    Rolls: A001R1AB, B002R1CD | SR001",
            ]
        );
    }

    #[test]
    fn review_notes_listed_last() {
        let mut o = outcome();
        o.notes = vec![ReviewNote::UnmatchedRoll { roll: "Z900".into() }];
        let lines = format_outcome(2, Path::new("KD0097.mhl"), &o, Some("x.txt"));
        assert_eq!(
            lines.last().unwrap(),
            "    Review: camera roll 'Z900' matches no format rule"
        );
    }

    #[test]
    fn check_block_lists_unresolved_tokens() {
        let mut o = outcome();
        o.unresolved = vec!["{TITLE}".into()];
        let lines = format_outcome(1, Path::new("KD0097.mhl"), &o, None);
        assert_eq!(lines[0], "001 KD0097");
        assert!(lines.contains(&"    Unresolved: {TITLE}".to_string()));
    }

    #[test]
    fn sound_only_tape_shows_sound_rolls() {
        let mut o = outcome();
        o.summary.camera_rolls.clear();
        o.summary.shoot_day_numbers.clear();
        let lines = format_outcome(1, Path::new("KD0097.mhl"), &o, None);
        assert!(lines.contains(&"    Rolls: SR001".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Shoot days")));
    }

    #[test]
    fn failure_block_uses_file_stem() {
        let lines = format_failure(3, Path::new("tapes/KD0099.mhl"), &"boom");
        assert_eq!(
            lines,
            vec![
                "003 KD0099 FAILED",
                "    Source: tapes/KD0099.mhl",
                "    Error: boom",
            ]
        );
    }

    // =========================================================================
    // Batch footer
    // =========================================================================

    #[test]
    fn footer_clean_batch() {
        let mut stats = BatchStats::default();
        stats.record(&outcome());
        assert_eq!(format_batch_footer(&stats), "Processed 1 manifest: 1 ok");
    }

    #[test]
    fn footer_mixed_batch() {
        let mut flagged = outcome();
        flagged.notes = vec![ReviewNote::UnparseableDay { token: "X".into() }];

        let mut stats = BatchStats::default();
        stats.record(&outcome());
        stats.record(&flagged);
        stats.record_failure();
        assert_eq!(
            format_batch_footer(&stats),
            "Processed 3 manifests: 1 ok, 1 need manual fix, 1 failed"
        );
    }

    #[test]
    fn footer_empty_batch() {
        assert_eq!(
            format_batch_footer(&BatchStats::default()),
            "Processed 0 manifests: 0 ok"
        );
    }
}
