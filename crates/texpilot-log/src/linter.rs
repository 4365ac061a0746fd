use crate::ir::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[[start_row, start_column], [end_row, end_column]]`
pub type Range = [[u32; 2]; 2];

/// A diagnostic in the flat shape editor linter integrations consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinterMessage {
    pub severity: Severity,
    pub location: LinterLocation,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Lines of the raw log, for "jump to log" actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_range: Option<Range>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinterLocation {
    pub file: PathBuf,
    pub position: Range,
}

impl From<&Diagnostic> for LinterMessage {
    fn from(diagnostic: &Diagnostic) -> Self {
        let position = diagnostic.location.position;
        Self {
            severity: diagnostic.severity,
            location: LinterLocation {
                file: diagnostic.location.full_path.clone(),
                position: [
                    [position.start.row, position.start.column],
                    [position.end.row, position.end.column],
                ],
            },
            excerpt: diagnostic.excerpt.clone(),
            description: diagnostic.description.clone(),
            log_range: diagnostic
                .log_range
                .map(|r| [[r.start.row, r.start.column], [r.end.row, r.end.column]]),
        }
    }
}

pub fn to_linter_messages(diagnostics: &[Diagnostic]) -> Vec<LinterMessage> {
    diagnostics.iter().map(LinterMessage::from).collect()
}
