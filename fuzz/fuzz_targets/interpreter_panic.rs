#![no_main]
use libfuzzer_sys::fuzz_target;
use std::path::Path;
use texpilot_log::LogInterpreter;

fuzz_target!(|data: &[u8]| {
    // Lossy conversion keeps inputs that are almost text.
    let s = String::from_utf8_lossy(data);
    let mut interpreter = LogInterpreter::new();
    let diagnostics = interpreter.parse(&s, Path::new("/fuzz/main.tex"));
    for diagnostic in &diagnostics {
        assert!(diagnostic.location.position.end >= diagnostic.location.position.start);
    }
});
