//! Project presets: the delivery template and its format mapping table.
//!
//! A preset is a plain text file named after the project, `presets/KD.txt`.
//! The template comes first, then the literal delimiter line, then one format
//! rule per line:
//!
//! ```text
//! TITLE: Kingdom S01
//! FACILITY BARCODE: {BARCODE}L7
//! DATE WRITTEN: {DATE}
//! ...
//! <FORMAT MAPPING>
//! # regex,camera type,extraction format
//! [A-F]\d{3}R,ARRI Alexa 35,ARRIRAW (HDE)
//! [G-K]\d{3},RED V-Raptor,REDCODE RAW
//! ```
//!
//! Rule rows split on the last two commas, so a pattern may contain commas
//! (`A\d{2,3}`). Blank lines and `#` comments are skipped.
//!
//! [`ProjectCache`] resolves a project id to its [`Project`] (preset plus
//! layered [`ToolConfig`]) once per batch.

use crate::config::{self, ToolConfig};
use crate::format_map::FormatRule;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Separates the template from the format mapping rows.
pub const FORMAT_MAPPING_DELIMITER: &str = "<FORMAT MAPPING>";

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("No preset for project '{project}' (looked for {path})")]
    Missing { project: String, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preset has no <FORMAT MAPPING> section")]
    MissingDelimiter,
    #[error("Format rule on line {line} needs 'regex,camera type,extraction format': {row}")]
    InvalidRule { line: usize, row: String },
    #[error("Format rule on line {line} has an invalid pattern: {source}")]
    Pattern {
        line: usize,
        #[source]
        source: regex::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Template and format rules of one project.
#[derive(Debug, Clone)]
pub struct Preset {
    pub template: String,
    pub rules: Vec<FormatRule>,
}

impl Preset {
    pub fn parse(text: &str) -> Result<Self, PresetError> {
        let (template, table) = text
            .split_once(FORMAT_MAPPING_DELIMITER)
            .ok_or(PresetError::MissingDelimiter)?;

        // 1-based line of the delimiter, so rows report whole-file line numbers
        let offset = template.matches('\n').count() + 1;
        let rules = table
            .lines()
            .enumerate()
            .map(|(i, row)| (offset + i, row.trim()))
            .filter(|(_, row)| !row.is_empty() && !row.starts_with('#'))
            .map(|(line, row)| parse_rule(line, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            template: template.to_string(),
            rules,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PresetError> {
        Self::parse(&fs::read_to_string(path)?)
    }
}

fn parse_rule(line: usize, row: &str) -> Result<FormatRule, PresetError> {
    let invalid = || PresetError::InvalidRule {
        line,
        row: row.to_string(),
    };
    let mut fields = row.rsplitn(3, ',');
    let extraction = fields.next().map(str::trim).ok_or_else(invalid)?;
    let camera = fields.next().map(str::trim).ok_or_else(invalid)?;
    let pattern = fields.next().map(str::trim).ok_or_else(invalid)?;
    if pattern.is_empty() || camera.is_empty() || extraction.is_empty() {
        return Err(invalid());
    }
    FormatRule::new(pattern, camera, extraction)
        .map_err(|source| PresetError::Pattern { line, source })
}

/// Everything needed to process one project's tapes.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: String,
    pub config: ToolConfig,
    pub preset: Preset,
}

impl Project {
    /// Load `{presets}/{id}.txt` and the layered config for `id`.
    pub fn load(presets_dir: &Path, id: &str) -> Result<Self, PresetError> {
        let path = presets_dir.join(format!("{id}.txt"));
        if !path.is_file() {
            return Err(PresetError::Missing {
                project: id.to_string(),
                path,
            });
        }
        let preset = Preset::load(&path)?;
        let config = config::load_config(presets_dir, id)?;
        tracing::debug!(project = id, rules = preset.rules.len(), "loaded preset");
        Ok(Self {
            id: id.to_string(),
            config,
            preset,
        })
    }

    /// Name used in output filenames: the configured codename, else the id.
    pub fn display_name(&self) -> &str {
        self.config.delivery.codename.as_deref().unwrap_or(&self.id)
    }
}

/// Read-only project cache keyed by project id.
#[derive(Debug)]
pub struct ProjectCache {
    presets_dir: PathBuf,
    projects: HashMap<String, Project>,
}

impl ProjectCache {
    pub fn new(presets_dir: impl Into<PathBuf>) -> Self {
        Self {
            presets_dir: presets_dir.into(),
            projects: HashMap::new(),
        }
    }

    pub fn presets_dir(&self) -> &Path {
        &self.presets_dir
    }

    /// Resolve a project, loading it on first use.
    ///
    /// Failed loads are not cached; a later call retries.
    pub fn get(&mut self, id: &str) -> Result<&Project, PresetError> {
        if !self.projects.contains_key(id) {
            let project = Project::load(&self.presets_dir, id)?;
            self.projects.insert(id.to_string(), project);
        }
        self.projects.get(id).ok_or_else(|| PresetError::Missing {
            project: id.to_string(),
            path: self.presets_dir.join(format!("{id}.txt")),
        })
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
