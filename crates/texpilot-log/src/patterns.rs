//! Line recognizers, one per message style the engine writes to its log.
//!
//! Every recognizer is a pure function over the line array. It either
//! declines (`None`) or consumes one or more lines starting at `idx` and
//! reports what it found together with the index of the first unconsumed
//! line. Continuation rules live in their own functions so they can be
//! tested in isolation.

use crate::ir::Severity;
use regex::Regex;

lazy_static::lazy_static! {
    static ref OUTPUT_FILE: Regex =
        Regex::new(r"^Output written on (.+?) \(.*\)\.?\s*$").unwrap();
    static ref FATAL: Regex = Regex::new(r"^!\s?(.*)$").unwrap();
    static ref SOURCE_CONTEXT: Regex = Regex::new(r"^l\.(\d+)(?:\s(.*))?$").unwrap();
    static ref FILE_LINE_ERROR: Regex = Regex::new(r"^(.+?\.tex):(\d+):\s*(.*)$").unwrap();
    static ref BOX_WARNING: Regex =
        Regex::new(r"^(?:Over|Under)full \\[hvd]box\b.*?\bat lines? (\d+)(?:--(\d+))?").unwrap();
    static ref WARNING_OR_INFO: Regex =
        Regex::new(r"^(LaTeX|Package|Class)(?:\s+(\S+))?\s+(Warning|Info):\s*(.*)$").unwrap();
    static ref TRAILING_LINE_NUMBER: Regex = Regex::new(r"\bline \d+$").unwrap();
    static ref LEADING_DIGITS: Regex = Regex::new(r"^(\d+)(.*)$").unwrap();
    static ref ON_INPUT_LINE: Regex = Regex::new(r"on input line (\d+)").unwrap();
}

/// Minimum indentation that marks a wrapped warning line.
const WARNING_CONTINUATION_INDENT: usize = 15;

/// Message prefixes TeX uses for its interactive help text.
const HELP_TEXT_MARKERS: [&str; 6] = ["The ", "This ", "You ", "See ", "Type ", "That makes "];

/// Where a diagnostic should be attributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Whatever file is on top of the file stack.
    CurrentFile,
    /// A path printed in the log, relative to the document directory.
    Path(String),
}

/// A diagnostic before file attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Draft {
    pub severity: Severity,
    pub excerpt: String,
    pub description: Option<String>,
    pub target: Target,
    /// 1-based source lines `(first, last)`.
    pub lines: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Found {
    OutputFile(String),
    Diagnostic(Draft),
    /// Consumed, but deliberately not reported.
    Suppressed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub found: Found,
    pub next: usize,
}

pub(crate) type Recognizer = fn(&[&str], usize) -> Option<Step>;

/// Recognizers in priority order; the first match wins.
pub(crate) const RECOGNIZERS: [Recognizer; 5] = [
    output_file,
    fatal_error,
    file_line_error,
    box_warning,
    warning_or_info,
];

/// Returns `true` for lines that open a message of their own.
pub(crate) fn is_structural(line: &str) -> bool {
    OUTPUT_FILE.is_match(line)
        || FATAL.is_match(line)
        || FILE_LINE_ERROR.is_match(line)
        || BOX_WARNING.is_match(line)
        || WARNING_OR_INFO.is_match(line)
}

/// Collapses runs of whitespace into single spaces.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn join_line(text: &mut String, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(line);
}

fn parse_line_number(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok()
}

/// `l.<N> <context>`: the engine showing where in the source it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceContext {
    pub line: u32,
    pub snippet: Option<String>,
}

pub(crate) fn source_context(line: &str) -> Option<SourceContext> {
    let caps = SOURCE_CONTEXT.captures(line)?;
    let line = parse_line_number(&caps[1])?;
    let snippet = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    Some(SourceContext { line, snippet })
}

/// Text gathered after the first line of a multi-line message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Continuation {
    pub text: String,
    pub context: Option<SourceContext>,
    pub next: usize,
}

pub(crate) fn output_file(lines: &[&str], idx: usize) -> Option<Step> {
    let caps = OUTPUT_FILE.captures(lines[idx])?;
    let path = caps[1].trim().trim_matches('"').to_string();
    Some(Step {
        found: Found::OutputFile(path),
        next: idx + 1,
    })
}

/// Type info such as `<recently read> \foo` or `<*> main.tex`, and `...` markers.
fn is_excluded_snippet(line: &str) -> bool {
    let trimmed = line.trim();
    (trimmed.starts_with('<') && trimmed.contains('>')) || trimmed.starts_with("...")
}

/// Absorbs lines after `! message` up to the `l.<N>` context line.
///
/// Stops without consuming at an empty line or at the start of another
/// message; the context line itself is consumed. Lines holding only spaces
/// are the lower half of TeX's context display and are skipped.
pub(crate) fn fatal_continuation(lines: &[&str], start: usize) -> Continuation {
    let mut cont = Continuation {
        next: start,
        ..Continuation::default()
    };
    while cont.next < lines.len() {
        let line = lines[cont.next];
        if let Some(context) = source_context(line) {
            cont.context = Some(context);
            cont.next += 1;
            break;
        }
        if line.is_empty() || is_structural(line) {
            break;
        }
        if !line.trim().is_empty() && !is_excluded_snippet(line) {
            join_line(&mut cont.text, line);
        }
        cont.next += 1;
    }
    cont
}

pub(crate) fn fatal_error(lines: &[&str], idx: usize) -> Option<Step> {
    let caps = FATAL.captures(lines[idx])?;
    let mut text = caps[1].trim().to_string();
    let cont = fatal_continuation(lines, idx + 1);
    join_line(&mut text, &cont.text);

    let (lines_range, description) = match cont.context {
        Some(ctx) => (Some((ctx.line, ctx.line)), ctx.snippet),
        None => (None, None),
    };
    Some(Step {
        found: Found::Diagnostic(Draft {
            severity: Severity::Error,
            excerpt: normalize_whitespace(&text),
            description,
            target: Target::CurrentFile,
            lines: lines_range,
        }),
        next: cont.next,
    })
}

/// Indented lines following `file.tex:N: message`.
///
/// Stops at a blank line, an unindented line or another message. A `l.<N>`
/// line right after the message is consumed as its source context.
pub(crate) fn file_line_continuation(lines: &[&str], start: usize) -> Continuation {
    let mut cont = Continuation {
        next: start,
        ..Continuation::default()
    };
    while cont.next < lines.len() {
        let line = lines[cont.next];
        if let Some(context) = source_context(line) {
            cont.context = Some(context);
            cont.next += 1;
            break;
        }
        let indented = line.starts_with(' ') || line.starts_with('\t');
        if line.trim().is_empty() || !indented || is_structural(line) {
            break;
        }
        join_line(&mut cont.text, line);
        cont.next += 1;
    }
    cont
}

pub(crate) fn file_line_error(lines: &[&str], idx: usize) -> Option<Step> {
    let caps = FILE_LINE_ERROR.captures(lines[idx])?;
    let line = parse_line_number(&caps[2])?;
    let message = caps[3].trim();
    let cont = file_line_continuation(lines, idx + 1);

    if HELP_TEXT_MARKERS.iter().any(|marker| message.starts_with(marker)) {
        return Some(Step {
            found: Found::Suppressed,
            next: cont.next,
        });
    }

    let mut text = message.to_string();
    join_line(&mut text, &cont.text);
    Some(Step {
        found: Found::Diagnostic(Draft {
            severity: Severity::Error,
            excerpt: normalize_whitespace(&text),
            description: cont.context.and_then(|ctx| ctx.snippet),
            target: Target::Path(caps[1].to_string()),
            lines: Some((line, line)),
        }),
        next: cont.next,
    })
}

pub(crate) fn box_warning(lines: &[&str], idx: usize) -> Option<Step> {
    let line = lines[idx];
    let caps = BOX_WARNING.captures(line)?;
    let first = parse_line_number(&caps[1])?;
    let last = caps
        .get(2)
        .and_then(|m| parse_line_number(m.as_str()))
        .unwrap_or(first);
    Some(Step {
        found: Found::Diagnostic(Draft {
            severity: Severity::Info,
            excerpt: normalize_whitespace(line),
            description: None,
            target: Target::CurrentFile,
            lines: Some((first, last)),
        }),
        next: idx + 1,
    })
}

/// Joins the wrapped lines of a `LaTeX|Package|Class ... Warning|Info:` message.
///
/// A line continues the message when:
/// - it is indented by at least 15 columns,
/// - it starts with `(<package>)` and the package name is known, or
/// - the text so far ends in `line <digits>` and the line starts with digits.
///   The engine split the number when it wrapped the line, so the digits are
///   glued on without a space.
///
/// The numeric rule can misfire on a coincidental digit-leading line.
pub(crate) fn warning_continuation(
    first: &str,
    package: Option<&str>,
    lines: &[&str],
    start: usize,
) -> Continuation {
    let mut cont = Continuation {
        text: first.trim_end().to_string(),
        context: None,
        next: start,
    };
    while cont.next < lines.len() {
        let line = lines[cont.next];

        if TRAILING_LINE_NUMBER.is_match(&cont.text) {
            if let Some(caps) = LEADING_DIGITS.captures(line) {
                cont.text.push_str(&caps[1]);
                cont.text.push_str(caps[2].trim_end());
                cont.next += 1;
                continue;
            }
        }

        let indent = line.chars().take_while(|c| c.is_whitespace()).count();
        if indent >= WARNING_CONTINUATION_INDENT && !line.trim().is_empty() {
            join_line(&mut cont.text, line);
            cont.next += 1;
            continue;
        }

        if let Some(rest) = package.and_then(|name| package_continuation(line, name)) {
            join_line(&mut cont.text, rest);
            cont.next += 1;
            continue;
        }

        break;
    }
    cont
}

/// `(<package>)  text` lines written by `\PackageWarning` and friends.
fn package_continuation<'a>(line: &'a str, package: &str) -> Option<&'a str> {
    let rest = line.strip_prefix('(')?.strip_prefix(package)?.strip_prefix(')')?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

pub(crate) fn warning_or_info(lines: &[&str], idx: usize) -> Option<Step> {
    let caps = WARNING_OR_INFO.captures(lines[idx])?;
    let origin = &caps[1];
    let package = caps.get(2).map(|m| m.as_str());
    let severity = if &caps[3] == "Warning" {
        Severity::Warning
    } else {
        Severity::Info
    };

    let cont = warning_continuation(&caps[4], package, lines, idx + 1);
    let message = normalize_whitespace(&cont.text);
    let excerpt = match (origin, package) {
        ("LaTeX", None) => message,
        (origin, Some(name)) => format!("{origin} {name}: {message}"),
        (origin, None) => format!("{origin}: {message}"),
    };
    let line = ON_INPUT_LINE
        .captures(&excerpt)
        .and_then(|caps| parse_line_number(&caps[1]));

    Some(Step {
        found: Found::Diagnostic(Draft {
            severity,
            excerpt,
            description: None,
            target: Target::CurrentFile,
            lines: line.map(|l| (l, l)),
        }),
        next: cont.next,
    })
}
