use std::process::ExitCode;

use clap::{Parser, Subcommand};

use hackem::{
    converter::{convert_file, dump, ConvertArgs, DumpArgs},
    emulator::{emulate, EmulationArgs},
    instrumentation,
};

/// Exit status for invalid arguments and for failures before the program starts running.
const SETUP_FAILURE: u8 = 100;
/// Exit status for failed conversions.
const CONVERT_FAILURE: u8 = 1;

#[derive(Parser)]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[clap(long)]
    #[clap(help = "Enable chrome tracing")]
    #[clap(long_help = "Enable chrome tracing which on program exit will generate
a json file to be opened with a chrome tracing compatible
viewer.")]
    chrome_trace: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[clap(about = "Run a ROM image in the emulator")]
    #[clap(long_about = "Run a ROM image in the emulator.

The tape reader reads from standard input, the tape punch writes to standard
output and the printer writes to standard error. The exit status is the low
byte of D when the program halts, or 0 when tracing.")]
    #[clap(aliases = &["r", "emu"])]
    Run(EmulationArgs),
    #[clap(about = "Convert .hack text into a ROM image")]
    #[clap(aliases = &["convert"])]
    Rom(ConvertArgs),
    #[clap(about = "Print a ROM image as annotated .hack text")]
    #[clap(aliases = &["d"])]
    Dump(DumpArgs),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help and version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(SETUP_FAILURE);
        }
    };
    let _trace_guard = cli.chrome_trace.then(instrumentation::chrome_trace);

    let result = match &cli.command {
        Command::Run(args) => emulate(args).map_err(|e| (e, SETUP_FAILURE)),
        Command::Rom(args) => convert_file(args)
            .map(|()| 0)
            .map_err(|e| (e, CONVERT_FAILURE)),
        Command::Dump(args) => dump(args).map(|()| 0).map_err(|e| (e, SETUP_FAILURE)),
    };

    match result {
        Ok(status) => ExitCode::from(status),
        Err((e, status)) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(status)
        }
    }
}
