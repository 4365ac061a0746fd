//! Diagnostic model produced by the log interpreter.
//!
//! Rows and columns are zero-based. Source positions refer to the document
//! that caused a message; [`LogRange`] refers to the log lines it came from.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column used for the end of a range whose end column is unknown.
pub const END_OF_LINE: u32 = u32::MAX;

/// How serious a diagnostic is. Serialized as `error`, `warning` or `info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Display rank: errors first, then warnings, then info notices.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A zero-based `(row, column)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// Source span of a diagnostic; `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

impl Position {
    /// Whole-line span covering `start_row..=end_row`.
    ///
    /// The end row is clamped so that `end >= start` always holds.
    pub fn rows(start_row: u32, end_row: u32) -> Self {
        Self {
            start: Point::new(start_row, 0),
            end: Point::new(end_row.max(start_row), END_OF_LINE),
        }
    }
}

/// Where in the sources a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Basename of [`full_path`](Self::full_path).
    pub file: String,
    pub full_path: PathBuf,
    pub position: Position,
}

impl Location {
    pub fn new(full_path: PathBuf, position: Position) -> Self {
        let file = full_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| full_path.to_string_lossy().into_owned());
        Self {
            file,
            full_path,
            position,
        }
    }
}

/// Span of raw log text that produced a diagnostic. Rows are 0-based log lines;
/// the end column is the character length of the last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRange {
    pub start: Point,
    pub end: Point,
}

/// One message extracted from a log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Single line, whitespace-normalized.
    pub excerpt: String,
    /// Source context captured from an `l.<N>` line, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_range: Option<LogRange>,
}

impl Diagnostic {
    /// Returns `true` when `other` reports the same thing at the same place.
    ///
    /// Only the file, start row and excerpt take part; severity and end
    /// position are ignored.
    pub fn repeats(&self, other: &Diagnostic) -> bool {
        self.location.position.start.row == other.location.position.start.row
            && self.excerpt == other.excerpt
            && self.location.full_path == other.location.full_path
    }

    pub fn full_path(&self) -> &Path {
        &self.location.full_path
    }

    pub fn start_row(&self) -> u32 {
        self.location.position.start.row
    }
}

/// Everything a single pass over a log yields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Artifact announced by `Output written on ...`, resolved against the document directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
}

impl LogReport {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

/// Stable sort by `(severity rank, start row)`.
pub fn sort_for_display(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by_key(|d| (d.severity.rank(), d.start_row()));
}
