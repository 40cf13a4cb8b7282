//! Per-manifest pipeline and document persistence.
//!
//! ```text
//! KD0097.mhl ──► mhl::parse ──► decompose ──► derive ──► map_rolls ──► render
//!                                                                       │
//!        KINGDOM_A001_KD0097L7_METADATA.txt ◄── write_document ◄────────┘
//! ```
//!
//! [`process`] is pure: text in, [`Outcome`] out. [`run`] adds the file
//! system: it reads the manifest, resolves the project through the
//! [`ProjectCache`], and hands back the outcome. Persisting is a separate
//! step ([`write_document`]) so `check` can run the full pipeline without
//! touching disk.

use crate::barcode::{Barcode, BarcodeError};
use crate::decompose::{self, DecomposeError};
use crate::derive::{self, DerivedSummary};
use crate::format_map::{self, FormatMapping};
use crate::mhl::{self, MhlError};
use crate::preset::{PresetError, Project, ProjectCache};
use crate::render;
use crate::types::{MediaType, ReviewNote};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Appended to the output stem when the document needs a human pass.
pub const MANUAL_FIX_SUFFIX: &str = " - Manual Fix";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Manifest(#[from] MhlError),
    #[error(transparent)]
    Decompose(#[from] DecomposeError),
    #[error(transparent)]
    Barcode(#[from] BarcodeError),
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error("Cannot derive a project id from barcode '{0}'; pass --project")]
    UnknownProject(String),
}

/// Everything produced for one manifest.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Codename or project id, used in the output filename.
    pub name: String,
    pub deliverable: String,
    pub medium: String,
    pub summary: DerivedSummary,
    pub mapping: FormatMapping,
    pub document: String,
    /// Soft failures from derivation and format mapping.
    pub notes: Vec<ReviewNote>,
    /// Template tokens that survived rendering.
    pub unresolved: Vec<String>,
}

impl Outcome {
    pub fn needs_review(&self) -> bool {
        !self.notes.is_empty()
    }

    pub fn filename(&self) -> String {
        output_filename(
            &self.name,
            &self.deliverable,
            &self.summary.barcode,
            &self.medium,
            self.needs_review(),
        )
    }
}

/// Run parse → decompose → derive → map → render over manifest text.
pub fn process(text: &str, barcode: &Barcode, project: &Project) -> Result<Outcome, PipelineError> {
    let manifest = mhl::parse(text)?;
    let decomposition = decompose::decompose(&manifest, &project.config.levels)?;
    let summary = derive::derive(&manifest, &decomposition, barcode, &project.config);
    let mapping = format_map::map_rolls(
        &decomposition.rolls_of(MediaType::Camera),
        &project.preset.rules,
    );

    let values = render::values(&summary, &mapping);
    let document = render::render(&project.preset.template, &values);
    let unresolved = render::unresolved_placeholders(&document);
    if !unresolved.is_empty() {
        tracing::debug!(barcode = %barcode, tokens = ?unresolved, "template tokens left unresolved");
    }

    let mut notes = summary.review.clone();
    notes.extend(mapping.review_notes());

    Ok(Outcome {
        name: project.display_name().to_string(),
        deliverable: project.config.delivery.deliverable.clone(),
        medium: project.config.delivery.medium.clone(),
        summary,
        mapping,
        document,
        notes,
        unresolved,
    })
}

/// Project id for a barcode: the override if given, else its letter prefix.
pub fn project_id(barcode: &Barcode, project_override: Option<&str>) -> Result<String, PipelineError> {
    match project_override {
        Some(id) => Ok(id.to_string()),
        None => barcode
            .project_prefix()
            .map(str::to_string)
            .ok_or_else(|| PipelineError::UnknownProject(barcode.to_string())),
    }
}

/// Read a manifest file and run it through the pipeline.
pub fn run(
    path: &Path,
    projects: &mut ProjectCache,
    project_override: Option<&str>,
) -> Result<Outcome, PipelineError> {
    let barcode = Barcode::from_manifest_path(path)?;
    let id = project_id(&barcode, project_override)?;
    let project = projects.get(&id)?;
    tracing::debug!(path = %path.display(), project = %id, "processing manifest");

    let text = fs::read_to_string(path)?;
    process(&text, &barcode, project)
}

/// `{name}_{deliverable}_{barcode}{medium}_METADATA[ - Manual Fix].txt`
pub fn output_filename(
    name: &str,
    deliverable: &str,
    barcode: &str,
    medium: &str,
    needs_review: bool,
) -> String {
    let suffix = if needs_review { MANUAL_FIX_SUFFIX } else { "" };
    format!("{name}_{deliverable}_{barcode}{medium}_METADATA{suffix}.txt")
}

/// Write the rendered document beside its manifest. Returns the written path.
pub fn write_document(manifest_path: &Path, outcome: &Outcome) -> Result<PathBuf, PipelineError> {
    let dir = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let target = dir.join(outcome.filename());
    fs::write(&target, &outcome.document)?;
    tracing::info!(path = %target.display(), "wrote metadata document");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolConfig;
    use crate::preset::Preset;
    use crate::test_helpers::{HashList, SAMPLE_PRESET, tape_path, write_presets};
    use tempfile::TempDir;

    fn project() -> Project {
        Project {
            id: "KD".into(),
            config: ToolConfig::default(),
            preset: Preset::parse(SAMPLE_PRESET).unwrap(),
        }
    }

    fn clean_tape() -> String {
        HashList::new()
            .tool("YoYotta 4.1")
            .start_date("2024-01-16T09:12:44Z")
            .file(
                &tape_path("KINGDOM_20240115-MU03", "CAMERA", "A001R1AB", "A001C001.ari"),
                1_000_000,
            )
            .file(
                &tape_path("KINGDOM_20240116-MU04", "CAMERA", "G002", "G002_C001.R3D"),
                1_500_000,
            )
            .file(
                &tape_path("KINGDOM_20240115-MU03", "SOUND", "SR001", "T001.wav"),
                500,
            )
            .build()
    }

    fn barcode() -> Barcode {
        Barcode::parse("KD0097").unwrap()
    }

    // =========================================================================
    // process
    // =========================================================================

    #[test]
    fn clean_tape_renders_every_field() {
        let outcome = process(&clean_tape(), &barcode(), &project()).unwrap();
        let doc = &outcome.document;

        assert!(doc.contains("FACILITY BARCODE: KD0097L7"), "{doc}");
        assert!(doc.contains("DATE WRITTEN: 01/16/2024"));
        assert!(doc.contains("SOFTWARE: YoYotta 4.1"));
        assert!(doc.contains("SET: A TAPE: 4"));
        assert!(doc.contains("TOTAL SIZE: 2.5MB (7 files)"));
        assert!(doc.contains("SHOOT DATES: 01/15/2024, 01/16/2024"));
        assert!(doc.contains("SHOOT DAYS: MU03, MU04"));
        assert!(doc.contains("UNITS: Main Unit"));
        assert!(doc.contains("CONTENT: Camera, Sound"));
        assert!(doc.contains("ROLLS: A001R1AB, G002, SR001"));
        assert!(doc.contains("FORMATS: ari, md5, mhl, r3d, txt, wav"));
        assert!(doc.contains("CAMERAS: ARRI Alexa 35, ARRI Alexa Mini LF, RED V-Raptor"));
        assert!(doc.contains("EXTRACTION: ARRIRAW, ARRIRAW (HDE), REDCODE RAW"));

        assert!(!outcome.needs_review());
        assert!(outcome.unresolved.is_empty());
        assert_eq!(outcome.filename(), "KD_A001_KD0097L7_METADATA.txt");
    }

    #[test]
    fn sound_rolls_are_not_format_mapped() {
        let text = HashList::new()
            .file(&tape_path("KINGDOM_20240115-MU03", "SOUND", "SR001", "T001.wav"), 1)
            .build();
        let outcome = process(&text, &barcode(), &project()).unwrap();
        assert!(outcome.mapping.unmatched.is_empty());
        assert!(!outcome.needs_review());
    }

    #[test]
    fn unmatched_roll_needs_review_but_renders() {
        let text = HashList::new()
            .file(&tape_path("KINGDOM_20240115-MU03", "CAMERA", "Z900", "z.mov"), 1)
            .build();
        let outcome = process(&text, &barcode(), &project()).unwrap();
        assert!(outcome.needs_review());
        assert_eq!(
            outcome.notes,
            vec![ReviewNote::UnmatchedRoll { roll: "Z900".into() }]
        );
        assert!(outcome.document.contains("CAMERAS: \n"));
        assert_eq!(
            outcome.filename(),
            "KD_A001_KD0097L7_METADATA - Manual Fix.txt"
        );
    }

    #[test]
    fn derive_and_mapping_notes_are_combined() {
        let text = HashList::new()
            .file(&tape_path("PICKUPS", "CAMERA", "Z900", "z.mov"), 1)
            .build();
        let outcome = process(&text, &barcode(), &project()).unwrap();
        assert_eq!(outcome.notes.len(), 2);
    }

    #[test]
    fn unknown_template_tokens_are_reported() {
        let mut project = project();
        project.preset.template = "{BARCODE} {TITLE}\n".into();
        let outcome = process(&clean_tape(), &barcode(), &project).unwrap();
        assert_eq!(outcome.document, "KD0097 {TITLE}\n");
        assert_eq!(outcome.unresolved, vec!["{TITLE}"]);
        // Leftover tokens are diagnostics, not review notes
        assert!(!outcome.needs_review());
    }

    #[test]
    fn codename_and_delivery_constants_shape_filename() {
        let mut project = project();
        project.config.delivery.codename = Some("KINGDOM".into());
        project.config.delivery.deliverable = "B002".into();
        project.config.delivery.medium = "L8".into();
        let outcome = process(&clean_tape(), &barcode(), &project).unwrap();
        assert_eq!(outcome.filename(), "KINGDOM_B002_KD0097L8_METADATA.txt");
    }

    #[test]
    fn unreadable_write_date_still_renders() {
        let text = HashList::new()
            .tool("YoYotta 4.1")
            .start_date("16/01/2024 09:12")
            .file(
                &tape_path("KINGDOM_20240115-MU03", "CAMERA", "A001R1AB", "A001C001.ari"),
                1,
            )
            .build();
        let outcome = process(&text, &barcode(), &project()).unwrap();
        assert!(outcome.document.contains("DATE WRITTEN: \n"));
        assert!(outcome.document.contains("SOFTWARE: YoYotta 4.1"));
    }

    #[test]
    fn hard_errors_propagate() {
        let bad = "<?xml version=\"1.0\"?>\n<hashlist version=\"1.0\">\n";
        assert!(matches!(
            process(bad, &barcode(), &project()),
            Err(PipelineError::Manifest(MhlError::InvalidFormat))
        ));

        let mezzanine = HashList::new()
            .file(&tape_path("D1", "MEZZANINE", "M01", "a.mov"), 1)
            .build();
        assert!(matches!(
            process(&mezzanine, &barcode(), &project()),
            Err(PipelineError::Decompose(_))
        ));
    }

    // =========================================================================
    // project resolution
    // =========================================================================

    #[test]
    fn project_id_from_barcode_prefix() {
        assert_eq!(project_id(&barcode(), None).unwrap(), "KD");
        assert_eq!(project_id(&barcode(), Some("HJ")).unwrap(), "HJ");
    }

    #[test]
    fn barcode_without_letter_prefix_needs_override() {
        let numeric = Barcode::parse("123456").unwrap();
        assert!(matches!(
            project_id(&numeric, None),
            Err(PipelineError::UnknownProject(_))
        ));
        assert_eq!(project_id(&numeric, Some("KD")).unwrap(), "KD");
    }

    // =========================================================================
    // run + write_document
    // =========================================================================

    #[test]
    fn run_reads_file_and_writes_beside_it() {
        let presets = TempDir::new().unwrap();
        write_presets(presets.path());
        let tapes = TempDir::new().unwrap();
        let manifest = tapes.path().join("KD0097.mhl");
        fs::write(&manifest, clean_tape()).unwrap();

        let mut cache = ProjectCache::new(presets.path());
        let outcome = run(&manifest, &mut cache, None).unwrap();
        let written = write_document(&manifest, &outcome).unwrap();

        assert_eq!(written, tapes.path().join("KD_A001_KD0097L7_METADATA.txt"));
        assert_eq!(fs::read_to_string(&written).unwrap(), outcome.document);
    }

    #[test]
    fn run_rejects_bad_barcode_before_reading() {
        let presets = TempDir::new().unwrap();
        let mut cache = ProjectCache::new(presets.path());
        let err = run(Path::new("/nowhere/tape.mhl"), &mut cache, None).unwrap_err();
        assert!(matches!(err, PipelineError::Barcode(_)));
    }

    #[test]
    fn run_missing_preset_is_error() {
        let presets = TempDir::new().unwrap();
        let tapes = TempDir::new().unwrap();
        let manifest = tapes.path().join("HJ0001.mhl");
        fs::write(&manifest, clean_tape()).unwrap();

        let mut cache = ProjectCache::new(presets.path());
        assert!(matches!(
            run(&manifest, &mut cache, None),
            Err(PipelineError::Preset(PresetError::Missing { .. }))
        ));
    }

    #[test]
    fn output_filename_shape() {
        assert_eq!(
            output_filename("KD", "A001", "KD0097", "L7", false),
            "KD_A001_KD0097L7_METADATA.txt"
        );
        assert_eq!(
            output_filename("KD", "A001", "KD0094", "L7", true),
            "KD_A001_KD0094L7_METADATA - Manual Fix.txt"
        );
    }
}
