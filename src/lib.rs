//! # metablock
//!
//! Generates the delivery metadata block that accompanies an LTO tape.
//! The tape's hash-list (`.mhl`) is the data source: its file paths encode
//! shoot days, camera and sound rolls, and its sizes give the total. A
//! per-project template turns those values into the document a facility
//! hands over with the tape.
//!
//! # Architecture: Per-Manifest Pipeline
//!
//! ```text
//! 1. Parse      KD0097.mhl   →  Manifest          (file records + header)
//! 2. Decompose  Manifest     →  Decomposition     (days, rolls, media, extensions)
//! 3. Derive     …            →  DerivedSummary    (sizes, set/tape, dates, units)
//! 4. Map        camera rolls →  FormatMapping     (camera types, extraction formats)
//! 5. Render     template     →  document text
//! 6. Persist    document     →  KD_A001_KD0097L7_METADATA.txt
//! ```
//!
//! Stages 1 to 5 are pure functions over in-memory values, so the unit tests
//! exercise them without touching the filesystem. Only manifest discovery,
//! preset loading, and persistence do I/O.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`mhl`] | Line-oriented hash-list parser with a single pending-record slot |
//! | [`decompose`] | Positional path split, CAMERA / SOUND classification, extensions |
//! | [`barcode`] | Barcode validation and the A/B set numbering scheme |
//! | [`derive`] | Size scaling, shoot day decomposition, sorted summary values |
//! | [`format_map`] | Ordered regex table from camera roll to camera type and format |
//! | [`render`] | Literal single-pass `{PLACEHOLDER}` substitution |
//! | [`preset`] | Project template + format table files, cached per project |
//! | [`config`] | Layered `config.toml` loading, validation, and merging |
//! | [`pipeline`] | Runs the stages for one manifest and writes the document |
//! | [`scan`] | Expands CLI arguments into the `.mhl` files to process |
//! | [`types`] | Shared types (`MediaType`, `ReviewNote`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Soft Failures Still Produce a Document
//!
//! Day folders and roll names come from years of hand-named tapes. A day
//! token without a date, a unit code nobody registered, or a roll no format
//! rule knows about does not stop the tape. The document is written with
//! the affected fields left short, the file name gets a ` - Manual Fix`
//! suffix, and the reason is printed. Structural problems (bad header,
//! unpaired sizes, unknown media folders) are hard errors for that manifest
//! only; the rest of the batch continues.
//!
//! ## Configuration Is Data
//!
//! Path levels, the unit table, and delivery constants live in `config.toml`
//! layers beside the presets, not in code:
//!
//! ```text
//! presets/config.toml   ← shared (overrides stock defaults)
//! presets/KD.toml       ← project (overrides shared)
//! ```

pub mod barcode;
pub mod config;
pub mod decompose;
pub mod derive;
pub mod format_map;
pub mod mhl;
pub mod output;
pub mod pipeline;
pub mod preset;
pub mod render;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
