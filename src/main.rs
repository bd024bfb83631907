//! Bnuuy CLI: run a script, evaluate an expression, or start the REPL.

use std::env;
use std::fs;
use std::process;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use bnuuy::error::{EXIT_IO_ERROR, EXIT_USAGE};
use bnuuy::repl::{format_error, run_repl};
use bnuuy::{Config, InterpretOutcome, Vm};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the log filter.
const LOG_ENV: &str = "BNUUY_LOG";

/// CLI command to execute.
enum Command {
    /// Run a script file
    Run { file: String },
    /// Evaluate a string
    Eval { code: String },
    /// Start the REPL
    Repl,
}

/// CLI options parsed from arguments.
struct Options {
    command: Command,
    print_code: bool,
    trace: bool,
}

fn print_usage() {
    eprintln!("Bnuuy {} - bytecode expression interpreter", VERSION);
    eprintln!();
    eprintln!("Usage: bnuuy [options] [script]");
    eprintln!("       bnuuy [options] -e <expr>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e <expr>       Evaluate an expression and print the result");
    eprintln!("  --print-code    Dump each compiled chunk before running it");
    eprintln!("  --trace         Trace the stack and every instruction executed");
    eprintln!("  --help, -h      Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  BNUUY_PRINT_CODE, BNUUY_TRACE_EXECUTION  Enable the switches above (1/true/yes/on)");
    eprintln!("  BNUUY_LOG                                Log filter (default: warn)");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  bnuuy                 Start interactive REPL");
    eprintln!("  bnuuy expr.bn         Run a script file");
    eprintln!("  bnuuy -e '1 + 2 * 3'  Evaluate an expression directly");
}

fn parse_args() -> Options {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut options = Options {
        command: Command::Repl,
        print_code: false,
        trace: false,
    };

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            "--print-code" => options.print_code = true,
            "--trace" => options.trace = true,
            "-e" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("-e requires an expression argument");
                    print_usage();
                    process::exit(EXIT_USAGE);
                }
                if !matches!(options.command, Command::Repl) {
                    eprintln!("Only one script or expression can be given");
                    print_usage();
                    process::exit(EXIT_USAGE);
                }
                options.command = Command::Eval {
                    code: args[i].clone(),
                };
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                print_usage();
                process::exit(EXIT_USAGE);
            }
            _ => {
                if !matches!(options.command, Command::Repl) {
                    eprintln!("Only one script or expression can be given");
                    print_usage();
                    process::exit(EXIT_USAGE);
                }
                options.command = Command::Run { file: arg.clone() };
            }
        }
        i += 1;
    }

    options
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let options = parse_args();

    let mut config = Config::from_env();
    if options.print_code {
        config.print_code = true;
    }
    if options.trace {
        config.trace_execution = true;
    }

    match &options.command {
        Command::Repl => run_repl(config),
        Command::Run { file } => run_file(file, config),
        Command::Eval { code } => run_source(code, config),
    }
}

fn run_file(path: &str, config: Config) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{} Could not read file '{}': {}", "Error:".red().bold(), path, e);
            process::exit(EXIT_IO_ERROR);
        }
    };
    run_source(&source, config);
}

fn run_source(source: &str, config: Config) {
    let mut vm = Vm::with_config(config);
    let result = vm.interpret(source);

    match &result {
        Ok(value) => println!("{}", value),
        Err(e) => eprintln!("{}", format_error(e)),
    }

    let code = InterpretOutcome::of(&result).exit_code();
    if code != 0 {
        process::exit(code);
    }
}
