use crate::file_stack::FileStack;
use crate::ir::{Diagnostic, Location, LogRange, LogReport, Point, Position};
use crate::patterns::{Draft, Found, RECOGNIZERS, Step, Target};
use std::path::{Path, PathBuf};

/// Turns the log of one engine run into diagnostics.
///
/// `LogInterpreter` scans the log line by line. Each line is offered to the
/// recognizers in priority order (output marker, `!` errors, `file:line:`
/// errors, box warnings, warnings and info notices); a line no recognizer
/// claims is scanned for `(file` / `)` tokens to keep track of the file the
/// engine is reading.
///
/// Every call to [`parse`](Self::parse) starts from scratch, so one
/// interpreter can be reused for any number of logs.
pub struct LogInterpreter {
    diagnostics: Vec<Diagnostic>,
    file_stack: FileStack,
    output_file: Option<PathBuf>,
}

impl Default for LogInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogInterpreter {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            file_stack: FileStack::new(Path::new("")),
            output_file: None,
        }
    }

    /// Parses `log` produced while compiling `root` and returns its diagnostics in log order.
    ///
    /// # Arguments
    ///
    /// * `log` - The full content of the engine log.
    /// * `root` - The document that was compiled. Relative paths printed in
    ///   the log are resolved against its directory.
    pub fn parse(&mut self, log: &str, root: &Path) -> Vec<Diagnostic> {
        self.parse_report(log, root).diagnostics
    }

    /// Like [`parse`](Self::parse), but also reports the output artifact.
    pub fn parse_report(&mut self, log: &str, root: &Path) -> LogReport {
        self.reset(root);

        let lines = split_lines(log);
        // The banner line routinely looks like a file token or a message.
        let mut idx = 1;
        while idx < lines.len() {
            match RECOGNIZERS.iter().find_map(|recognize| recognize(&lines, idx)) {
                Some(Step { found, next }) => {
                    let next = next.max(idx + 1);
                    self.record(found, &lines, idx, next);
                    idx = next;
                }
                None => {
                    self.file_stack.scan_line(lines[idx]);
                    idx += 1;
                }
            }
        }

        log::debug!(
            "interpreted {} log lines for {}: {} diagnostics",
            lines.len(),
            root.display(),
            self.diagnostics.len()
        );

        LogReport {
            diagnostics: std::mem::take(&mut self.diagnostics),
            output_file: self.output_file.take(),
        }
    }

    fn reset(&mut self, root: &Path) {
        self.diagnostics.clear();
        self.file_stack = FileStack::new(root);
        self.output_file = None;
    }

    fn record(&mut self, found: Found, lines: &[&str], start: usize, next: usize) {
        match found {
            Found::OutputFile(raw) => {
                let path = self.file_stack.resolve(&raw);
                log::debug!("output file: {}", path.display());
                self.output_file = Some(path);
            }
            Found::Suppressed => {}
            Found::Diagnostic(draft) => {
                let diagnostic = self.attribute(draft, lines, start, next);
                self.emit(diagnostic);
            }
        }
    }

    fn attribute(&self, draft: Draft, lines: &[&str], start: usize, next: usize) -> Diagnostic {
        let full_path = match &draft.target {
            Target::CurrentFile => self.file_stack.current().to_path_buf(),
            Target::Path(raw) => self.file_stack.resolve(raw),
        };
        let position = match draft.lines {
            Some((first, last)) => Position::rows(first.saturating_sub(1), last.saturating_sub(1)),
            None => Position::rows(0, 0),
        };
        let last = next - 1;
        let log_range = LogRange {
            start: Point::new(to_u32(start), 0),
            end: Point::new(to_u32(last), to_u32(lines[last].chars().count())),
        };
        Diagnostic {
            severity: draft.severity,
            excerpt: draft.excerpt,
            description: draft.description,
            location: Location::new(full_path, position),
            log_range: Some(log_range),
        }
    }

    /// Appends `diagnostic` unless it repeats the previous one.
    fn emit(&mut self, diagnostic: Diagnostic) {
        if let Some(previous) = self.diagnostics.last() {
            if previous.repeats(&diagnostic) {
                log::trace!("dropping repeated diagnostic: {}", diagnostic.excerpt);
                return;
            }
        }
        self.diagnostics.push(diagnostic);
    }
}

/// Parses a log with a throwaway [`LogInterpreter`].
pub fn parse(log: &str, root: &Path) -> Vec<Diagnostic> {
    LogInterpreter::new().parse(log, root)
}

/// Splits on `\n` and `\r\n`.
fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
