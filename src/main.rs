use anyhow::{bail, Context};
use keyseat::{init_logging, CycleConfig, ProgramExpander, StdoutSink};
use std::sync::Arc;

fn usage() -> ! {
    eprintln!(
        "keyseat {} ({})\n\n\
         Usage: keyseat [--trace] [--out <file>] <program.nc>\n\n\
         Expands keyway cycle commands (M800/M801) in a G-code program\n\
         into plain G0/G1 moves against a simulated lathe.",
        keyseat::VERSION,
        keyseat::BUILD_DATE
    );
    std::process::exit(2);
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let mut input = None;
    let mut output = None;
    let mut config = CycleConfig::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--trace" => config.trace_moves = true,
            "--out" => match args.next() {
                Some(path) => output = Some(path),
                None => usage(),
            },
            "--help" | "-h" => usage(),
            _ if input.is_none() => input = Some(arg),
            other => bail!("unexpected argument: {other}"),
        }
    }
    let Some(input) = input else { usage() };

    let source = std::fs::read_to_string(&input)
        .with_context(|| format!("reading program {input}"))?;

    let expander = ProgramExpander::new(Arc::new(StdoutSink), config);
    let gcode = expander.expand(&source)?;

    match output {
        Some(path) => std::fs::write(&path, gcode)
            .with_context(|| format!("writing expanded program {path}"))?,
        None => print!("{gcode}"),
    }
    Ok(())
}
