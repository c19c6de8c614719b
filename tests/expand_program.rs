use keyseat::{BufferSink, CycleConfig, ProgramExpander, CYCLE_END_MARKER, CYCLE_START_MARKER};
use std::io::Write as _;
use std::sync::Arc;

const PROGRAM: &str = "\
G90                 ; absolute mode
G21                 ; units in millimeters
M5                  ; stop spindle
G0 X10 Z50          ; initial positioning
F1000               ; feed rate for cutting passes
M800 D2 Q10 S8 P0.5 R2 L1 H1
M30                 ; end of program
";

#[test]
fn test_expand_program_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(PROGRAM.as_bytes()).unwrap();

    let source = std::fs::read_to_string(file.path()).unwrap();
    let sink = Arc::new(BufferSink::new());
    let expander = ProgramExpander::new(sink.clone(), CycleConfig::default());
    let gcode = expander.expand(&source).unwrap();

    // the initial positioning move and the cycle both appear
    assert!(gcode.starts_with("; Expanded by keyseat\n"));
    assert!(gcode.contains("G0 X10.000 Z50.000"));
    // sag-compensated start for bore radius 10, tool width 8
    assert!(gcode.contains("G0 X9.165 Z52.000"));
    // final plunge at the true depth, then the return to start
    assert!(gcode.contains("G1 X12.000 Z52.000 F1000.0"));
    assert!(gcode.trim_end().ends_with("G0 X10.000 Z50.000"));

    let lines = sink.lines();
    assert!(lines.contains(&CYCLE_START_MARKER.to_string()));
    assert!(lines.contains(&CYCLE_END_MARKER.to_string()));
}

#[test]
fn test_expand_rejects_bad_cycle_words() {
    let sink = Arc::new(BufferSink::new());
    let expander = ProgramExpander::new(sink, CycleConfig::default());

    // P exceeds D: the cycle is rejected and the program run fails
    let err = expander
        .expand("G0 X10 Z50\nF1000\nM800 D0.4 Q10 S2 P0.5 R2\n")
        .unwrap_err();
    assert!(err.to_string().contains("invalid argument: step"));
}
