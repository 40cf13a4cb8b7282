//! Hash-list (`.mhl`) parsing.
//!
//! Stage 1 of the pipeline. Turns the raw manifest text into a [`Manifest`]:
//! an ordered list of [`FileRecord`]s plus a [`ManifestHeader`].
//!
//! ## Format
//!
//! Only the narrow, line-oriented subset that LTO write tools emit is
//! understood. One tag per line, no nesting awareness:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <hashlist version="1.1">
//!   <creatorinfo>
//!     <tool>YoYotta 4.1</tool>
//!     <startdate>2024-01-16T09:12:44Z</startdate>
//!   </creatorinfo>
//!   <hash>
//!     <file>KD0097/KINGDOM/DAILIES/ORIGINAL/KINGDOM_20240115-MU03/CAMERA/A001R1AB/clip.ari</file>
//!     <size>12582912</size>
//!     <md5>…</md5>
//!   </hash>
//! </hashlist>
//! ```
//!
//! Line 2 must be the version marker. Every other unrecognized line is
//! ignored.
//!
//! ## Pairing
//!
//! A `<size>` belongs to the most recent `<file>`. The parser keeps a single
//! pending-record slot: `<file>` closes the pending record and opens a new
//! one, `<size>` fills the slot. A size with no open record, a second size
//! for the same record, or a record closed without a size are all
//! [`MhlError::Malformed`].

use chrono::NaiveDate;
use thiserror::Error;

/// Line 2 of every supported hash-list.
pub const VERSION_MARKER: &str = r#"<hashlist version="1.1">"#;

#[derive(Error, Debug)]
pub enum MhlError {
    #[error("Invalid manifest format: expected <hashlist version=\"1.1\"> on line 2")]
    InvalidFormat,
    #[error("Malformed manifest at line {line}: {reason}")]
    Malformed { line: usize, reason: &'static str },
    #[error("Invalid size '{value}' at line {line}")]
    InvalidSize { line: usize, value: String },
}

/// One file written to the medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Slash-delimited path, split into its segments.
    pub segments: Vec<String>,
    /// Size in bytes.
    pub size: u64,
}

impl FileRecord {
    /// The path as it appeared in the manifest.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Final path segment (the filename).
    pub fn file_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

/// Session metadata from the manifest's creator block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestHeader {
    pub write_date: Option<NaiveDate>,
    pub tool: Option<String>,
}

/// A parsed hash-list.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub records: Vec<FileRecord>,
    pub header: ManifestHeader,
}

impl Manifest {
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }
}

/// The tags this parser reacts to.
enum Tag<'a> {
    File(&'a str),
    Size(&'a str),
    Tool(&'a str),
    StartDate(&'a str),
    FinishDate(&'a str),
}

impl<'a> Tag<'a> {
    fn classify(line: &'a str) -> Option<Self> {
        if let Some(v) = inner_text(line, "file") {
            Some(Tag::File(v))
        } else if let Some(v) = inner_text(line, "size") {
            Some(Tag::Size(v))
        } else if let Some(v) = inner_text(line, "tool") {
            Some(Tag::Tool(v))
        } else if let Some(v) = inner_text(line, "startdate") {
            Some(Tag::StartDate(v))
        } else {
            inner_text(line, "finishdate").map(Tag::FinishDate)
        }
    }
}

/// Text between `<tag>` and `</tag>` on a trimmed line.
fn inner_text<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix('<')?.strip_prefix(tag)?.strip_prefix('>')?;
    let end = rest.find("</")?;
    Some(rest[..end].trim())
}

/// Undo the five predefined XML entities. Anything else passes through.
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// A `<file>` seen but not yet closed.
struct Pending {
    path: String,
    size: Option<u64>,
    line: usize,
}

#[derive(Default)]
struct ParserState {
    records: Vec<FileRecord>,
    pending: Option<Pending>,
    tool: Option<String>,
    start_date: Option<String>,
    finish_date: Option<String>,
}

impl ParserState {
    fn open(&mut self, path: &str, line: usize) -> Result<(), MhlError> {
        self.close()?;
        self.pending = Some(Pending {
            path: unescape(path),
            size: None,
            line,
        });
        Ok(())
    }

    fn attach_size(&mut self, value: &str, line: usize) -> Result<(), MhlError> {
        let pending = self.pending.as_mut().ok_or(MhlError::Malformed {
            line,
            reason: "<size> without a preceding <file>",
        })?;
        if pending.size.is_some() {
            return Err(MhlError::Malformed {
                line,
                reason: "second <size> for the same <file>",
            });
        }
        let size = value.parse::<u64>().map_err(|_| MhlError::InvalidSize {
            line,
            value: value.to_string(),
        })?;
        pending.size = Some(size);
        Ok(())
    }

    fn close(&mut self) -> Result<(), MhlError> {
        if let Some(pending) = self.pending.take() {
            let size = pending.size.ok_or(MhlError::Malformed {
                line: pending.line,
                reason: "<file> has no <size>",
            })?;
            self.records.push(FileRecord {
                segments: pending.path.split('/').map(String::from).collect(),
                size,
            });
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Manifest, MhlError> {
        self.close()?;

        let mut write_date = None;
        for raw in [self.start_date, self.finish_date].into_iter().flatten() {
            match parse_write_date(&raw) {
                Some(date) => {
                    write_date = Some(date);
                    break;
                }
                None => tracing::warn!(value = %raw, "unrecognized write date, ignoring"),
            }
        }
        if write_date.is_none() {
            tracing::warn!("no write date found in manifest");
        }
        if self.tool.is_none() {
            tracing::warn!("no write software found in manifest");
        }

        Ok(Manifest {
            records: self.records,
            header: ManifestHeader {
                write_date,
                tool: self.tool,
            },
        })
    }
}

/// Parse a hash-list document.
pub fn parse(text: &str) -> Result<Manifest, MhlError> {
    if text.lines().nth(1).map(str::trim) != Some(VERSION_MARKER) {
        return Err(MhlError::InvalidFormat);
    }

    let mut state = ParserState::default();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        match Tag::classify(raw.trim()) {
            Some(Tag::File(path)) => state.open(path, line)?,
            Some(Tag::Size(value)) => state.attach_size(value, line)?,
            Some(Tag::Tool(tool)) => state.tool = Some(unescape(tool)).filter(|t| !t.is_empty()),
            Some(Tag::StartDate(date)) => state.start_date = Some(date.to_string()),
            Some(Tag::FinishDate(date)) => state.finish_date = Some(date.to_string()),
            None => {}
        }
    }

    let manifest = state.finish()?;
    tracing::debug!(records = manifest.records.len(), "parsed manifest");
    Ok(manifest)
}

/// Accepts `YYYY-MM-DD` (optionally followed by a time) or compact `YYYYMMDD`.
fn parse_write_date(raw: &str) -> Option<NaiveDate> {
    if let Some(day) = raw.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d")
    {
        return Some(date);
    }
    let compact = raw.get(..8)?;
    if !compact.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(compact, "%Y%m%d").ok()
}
