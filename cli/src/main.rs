//! parrun: run the commands read from stdin in parallel with a live status.
//!
//! # Usage
//!
//! ```text
//! printf 'make lint\nmake test\ncargo doc\n' | parrun -n 3 -e
//! parrun -i payload.json -v < commands.txt
//! ```

mod args;
mod commands;
mod config;
mod process;
mod report;

use std::fs::File;
use std::io::{self, Read};
use std::process as proc;
use std::sync::Arc;
use std::thread;

use parrun_core::{BatchSummary, Fanout, Job};
use parrun_tui::{terminal, Batch, RunError, TerminalInfo};
use tracing_subscriber::EnvFilter;

use crate::args::{parse_args, Invocation};
use crate::config::{RunConfig, Settings};
use crate::process::{CommandTask, ProcessWork};

/// Environment variable holding the stderr log filter.
const LOG_ENV: &str = "PARRUN_LOG";

fn main() {
    init_logging();

    let argv: Vec<String> = std::env::args().collect();
    let arg_refs: Vec<&str> = argv.iter().skip(1).map(|s| s.as_str()).collect();

    let flags = match parse_args(&arg_refs) {
        Ok(Invocation::Run(flags)) => flags,
        Ok(Invocation::Help) => {
            print!("{}", args::USAGE);
            return;
        }
        Ok(Invocation::Version) => {
            println!("parrun {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Err(e) => {
            eprintln!("parrun: {}", e);
            eprintln!("Run 'parrun --help' for usage.");
            proc::exit(2);
        }
    };

    let settings = match config::resolve_path(flags.config.as_deref()) {
        Some(path) => match config::load(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("parrun: {}", e);
                proc::exit(2);
            }
        },
        None => Settings::default(),
    };

    proc::exit(execute(settings.merge(&flags)));
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Run the batch described by `run` and return the process exit status.
fn execute(run: RunConfig) -> i32 {
    let raw = match io::read_to_string(io::stdin()) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("parrun: cannot read commands from stdin: {}", e);
            return 1;
        }
    };
    let parsed = match commands::parse_commands(&raw) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("parrun: {}", e);
            return 2;
        }
    };
    if parsed.is_empty() {
        eprintln!("parrun: no commands given on stdin");
        return 2;
    }

    let source: Box<dyn Read + Send> = match &run.input {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(f),
            Err(e) => {
                eprintln!("parrun: cannot open {}: {}", path.display(), e);
                return 2;
            }
        },
        None => Box::new(io::empty()),
    };

    let mut fanout = Fanout::new(source);
    let mut jobs = Vec::with_capacity(parsed.len());
    for argv in parsed {
        let (sink, source) = parrun_core::channel();
        fanout.add_sink(sink);
        jobs.push(Job::new(commands::label(&argv), CommandTask::new(argv, Some(source))));
    }
    let jobs: Arc<[Job<CommandTask>]> = jobs.into();

    if let Err(e) = start_fanout(fanout) {
        eprintln!("parrun: cannot start input fanout: {}", e);
        return 1;
    }

    let workdir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("parrun: cannot resolve working directory: {}", e);
            return 1;
        }
    };

    let mut batch = Batch::new(
        io::stdout(),
        ProcessWork::new(workdir),
        run.options.clone(),
        TerminalInfo::detect(),
    );
    let result = batch.run(&jobs, run.workers);

    let mut status = match &result {
        Ok(()) => 0,
        Err(RunError::Failed(failures)) => {
            tracing::info!(failed = failures.len(), "batch failed");
            1
        }
        Err(e) => {
            eprintln!("parrun: {}", e);
            e.exit_code()
        }
    };

    if let Some(path) = &run.report {
        if let Err(e) = report::write_report(path, &BatchSummary::from_jobs(&jobs)) {
            eprintln!("parrun: {}", e);
            if status == 0 {
                status = 1;
            }
        }
    }
    status
}

/// Broadcast the input on a background thread. A broadcast failure is fatal
/// to the whole run: the cursor is restored and the process exits.
fn start_fanout<R: Read + Send + 'static>(fanout: Fanout<R>) -> io::Result<()> {
    let handle = fanout.spawn()?;
    thread::Builder::new()
        .name("parrun-fanout-watch".into())
        .spawn(move || {
            let failure = match handle.join() {
                Ok(Ok(bytes)) => {
                    tracing::debug!(bytes, "input delivered to every task");
                    return;
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => "input fanout thread panicked".to_string(),
            };
            terminal::restore_stdout_cursor();
            tracing::debug!(error = %failure, "input fanout failed");
            eprintln!("\nparrun: {}", failure);
            proc::exit(1);
        })?;
    Ok(())
}
