use std::path::{Path, PathBuf};
use texpilot_log::{LogInterpreter, Severity};

#[test]
fn test_latexmk_noise() {
    let input = include_str!("fixtures/latexmk_noise.txt");
    let report = LogInterpreter::new().parse_report(input, Path::new("/home/me/paper/main.tex"));

    for diagnostic in &report.diagnostics {
        println!("{:?}", diagnostic);
    }

    // "Latexmk: (Info) ..." and "(TeX Live 2023)" must not be taken for files.
    assert!(report.diagnostics.iter().all(|d| d.location.file != "Info"));

    assert_eq!(report.diagnostics.len(), 2);

    let error = &report.diagnostics[0];
    assert_eq!(error.severity, Severity::Error);
    assert_eq!(error.location.full_path, PathBuf::from("/home/me/paper/chapter1.tex"));
    assert_eq!(error.location.position.start.row, 13);
    assert_eq!(error.description.as_deref(), Some("\\mymacro"));

    let warning = &report.diagnostics[1];
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.location.file, "chapter2.tex");
    assert_eq!(warning.location.position.start.row, 2);

    assert_eq!(report.output_file, Some(PathBuf::from("/home/me/paper/main.pdf")));
}

#[test]
fn test_truncated_log_keeps_partial_message() {
    let input = "banner\n(./main.tex\nPackage babel Warning: No hyphenation patterns were preloaded for\n(babel)                the language `ngerman'";
    let diagnostics = LogInterpreter::new().parse(input, Path::new("/doc/main.tex"));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].excerpt,
        "Package babel: No hyphenation patterns were preloaded for the language `ngerman'"
    );
}

#[test]
fn test_fatal_error_without_context_line() {
    let input = "banner\n! I can't find file `missing'.\n<*> missing\n";
    let diagnostics = LogInterpreter::new().parse(input, Path::new("/doc/main.tex"));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].excerpt, "I can't find file `missing'.");
    assert_eq!(diagnostics[0].location.position.start.row, 0);
}
