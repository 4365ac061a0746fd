//! # TexPilot Log Interpreter
//!
//! Turns the log of a LaTeX engine run (`*.log`, usually produced through
//! `latexmk`) into a flat, ordered list of [`Diagnostic`](ir::Diagnostic)s.
//!
//! ## Overview
//!
//! Engine logs are an ad-hoc mix of message styles written by different
//! parts of TeX and by individual packages. Instead of one grammar the
//! interpreter runs a set of independent recognizers, each with its own
//! continuation rule, in a fixed priority order:
//!
//! 1. `Output written on <file> (...)` - the produced artifact
//! 2. `! <message>` - fatal errors, optionally followed by `l.<N> <context>`
//! 3. `<file>.tex:<N>: <message>` - errors in `-file-line-error` mode
//! 4. `Overfull \hbox ... at lines N--M` - box warnings
//! 5. `LaTeX|Package|Class [name] Warning|Info: <message>`
//!
//! Lines no recognizer claims feed the **file stack**, which follows the
//! `(file.tex` / `)` tracing TeX prints while reading nested inputs, so that
//! messages without an explicit path are attributed to the right file.
//!
//! Consecutive repeats of the same diagnostic (same file, start row and
//! excerpt) are dropped.
//!
//! ## Examples
//!
//! ```
//! use std::path::Path;
//! use texpilot_log::{LogInterpreter, Severity};
//!
//! let log = "This is pdfTeX, Version 3.14159265\n\
//!            ! Undefined control sequence.\n\
//!            l.12 \\foo\n";
//!
//! let diagnostics = LogInterpreter::new().parse(log, Path::new("/doc/main.tex"));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].severity, Severity::Error);
//! assert_eq!(diagnostics[0].location.position.start.row, 11);
//! ```
//!
//! ### Exporting for a linter
//!
//! ```no_run
//! use std::path::Path;
//! use texpilot_log::linter::to_linter_messages;
//!
//! let log = std::fs::read_to_string("main.log")?;
//! let diagnostics = texpilot_log::parse(&log, Path::new("main.tex"));
//! let json = serde_json::to_string_pretty(&to_linter_messages(&diagnostics))?;
//! println!("{json}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Open-file tracking.
pub mod file_stack;
/// The interpreter driving the recognizers.
pub mod interpreter;
/// Diagnostic model.
pub mod ir;
/// Flat diagnostic shape for linter integrations.
pub mod linter;
mod patterns;


pub use interpreter::{LogInterpreter, parse};
pub use ir::{Diagnostic, END_OF_LINE, LogReport, Severity, has_errors, sort_for_display};
