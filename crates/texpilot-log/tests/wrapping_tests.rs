use std::path::Path;
use texpilot_log::LogInterpreter;

fn parse(body: &str) -> Vec<texpilot_log::Diagnostic> {
    let log = format!("This is XeTeX, Version 3.141592653\n{body}");
    LogInterpreter::new().parse(&log, Path::new("/doc/main.tex"))
}

#[test]
fn test_wrapped_line_number_is_repaired() {
    // The engine wraps at 79 columns, splitting "on input line 123" in two.
    let diags = parse(
        "LaTeX Warning: Reference `sec:results-and-further-discussion' on page 4 undefined on input line 1\n23.\n",
    );
    assert_eq!(diags.len(), 1);
    assert!(diags[0].excerpt.ends_with("on input line 123."));
    assert_eq!(diags[0].location.position.start.row, 122);
}

#[test]
fn test_wrapped_line_number_with_trailing_text() {
    let diags = parse("Package foo Warning: problem near line 4\n2 of the table\n");
    assert_eq!(diags[0].excerpt, "Package foo: problem near line 42 of the table");
}

#[test]
fn test_numeric_wrap_misfires_on_digit_line() {
    // Known limitation: a coincidental digit-leading line is glued on.
    let diags = parse("LaTeX Warning: Oops on input line 5\n100 items follow\n");
    assert_eq!(diags[0].excerpt, "Oops on input line 5100 items follow");
}

#[test]
fn test_deeply_indented_continuations_are_joined() {
    let diags = parse(
        "LaTeX Font Warning: Font shape `OT1/cmr/bx/sc' undefined\n(Font)              using `OT1/cmr/bx/n' instead on input line 9.\n",
    );
    assert_eq!(
        diags[0].excerpt,
        "LaTeX Font: Font shape `OT1/cmr/bx/sc' undefined using `OT1/cmr/bx/n' instead on input line 9."
    );
    assert_eq!(diags[0].location.position.start.row, 8);
}

#[test]
fn test_continuation_stops_at_shallow_indent() {
    let diags = parse("LaTeX Warning: First part\n    not a continuation\n");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].excerpt, "First part");
}
