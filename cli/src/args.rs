//! Command-line flag parsing.

use std::path::PathBuf;

pub const USAGE: &str = "\
parrun - run the commands given on stdin in parallel

Usage: parrun [OPTIONS] < commands.txt

Each non-blank line of stdin is one command; lines starting with '#' are
skipped. Quoting follows POSIX shell rules. Commands run with pipes, not a
terminal, as their stdio, so tools that only color output on a terminal
print plain text.

Options:
  -v, --verbose              Show the output of every task when done
  -e, --only-errors          Show the output of failed tasks only
  -t, --tty                  Behave as if stdout were a terminal (colors)
  -d, --not-drawable         Do not redraw task states in place
  -c, --compact              Print a single Ok/Fail instead of task details
  -n, --number-worker <N>    Number of workers [default: 4]
  -i, --file-input <PATH>    File streamed to the stdin of every task
      --no-header            Do not print the 'Running all tasks' line
      --config <PATH>        YAML settings file (default: $PARRUN_CONFIG or ./parrun.yaml)
      --report <PATH>        Write a JSON report of all tasks to PATH
  -h, --help                 Show this help
  -V, --version              Show the version

Environment:
  PARRUN_CONFIG              Settings file used when --config is absent
  PARRUN_LOG                 Log filter for stderr diagnostics (default: warn)
";

/// Flags given on the command line. Booleans can only switch things on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flags {
    pub verbose: bool,
    pub only_errors: bool,
    pub tty: bool,
    pub not_drawable: bool,
    pub compact: bool,
    pub no_header: bool,
    pub workers: Option<usize>,
    pub input: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Run(Flags),
    Help,
    Version,
}

/// Parse CLI arguments, WITHOUT the program name.
///
/// Short boolean flags may be clustered (`-ve`); values may follow their flag
/// as the next argument, after `=` for long flags, or attached for short ones
/// (`-n8`).
pub fn parse_args(args: &[&str]) -> Result<Invocation, String> {
    let mut flags = Flags::default();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i];
        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (long, None),
            };
            match name {
                "help" => return Ok(Invocation::Help),
                "version" => return Ok(Invocation::Version),
                "verbose" => flags.verbose = true,
                "only-errors" => flags.only_errors = true,
                "tty" => flags.tty = true,
                "not-drawable" => flags.not_drawable = true,
                "compact" => flags.compact = true,
                "no-header" => flags.no_header = true,
                "number-worker" | "file-input" | "config" | "report" => {
                    let value = match inline {
                        Some(v) => v.to_string(),
                        None => {
                            i += 1;
                            take_arg(args, i, arg)?
                        }
                    };
                    set_value(&mut flags, name, &value)?;
                }
                _ => return Err(format!("Unknown flag: '{}'", arg)),
            }
            if inline.is_some() && !takes_value(name) {
                return Err(format!("Flag '--{}' does not take a value", name));
            }
        } else if let Some(shorts) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
            for (pos, c) in shorts.char_indices() {
                match c {
                    'h' => return Ok(Invocation::Help),
                    'V' => return Ok(Invocation::Version),
                    'v' => flags.verbose = true,
                    'e' => flags.only_errors = true,
                    't' => flags.tty = true,
                    'd' => flags.not_drawable = true,
                    'c' => flags.compact = true,
                    'n' | 'i' => {
                        let name = if c == 'n' { "number-worker" } else { "file-input" };
                        let attached = &shorts[pos + 1..];
                        let value = if attached.is_empty() {
                            i += 1;
                            take_arg(args, i, arg)?
                        } else {
                            attached.to_string()
                        };
                        set_value(&mut flags, name, &value)?;
                        break;
                    }
                    other => return Err(format!("Unknown flag: '-{}'", other)),
                }
            }
        } else {
            return Err(format!(
                "Unexpected argument: '{}' (commands are read from stdin)",
                arg
            ));
        }
        i += 1;
    }
    Ok(Invocation::Run(flags))
}

fn takes_value(name: &str) -> bool {
    matches!(name, "number-worker" | "file-input" | "config" | "report")
}

fn set_value(flags: &mut Flags, name: &str, value: &str) -> Result<(), String> {
    match name {
        "number-worker" => {
            let n: usize = value
                .parse()
                .map_err(|_| format!("Invalid worker count: '{}'", value))?;
            if n == 0 {
                return Err("Worker count must be at least 1".into());
            }
            flags.workers = Some(n);
        }
        "file-input" => flags.input = Some(PathBuf::from(value)),
        "config" => flags.config = Some(PathBuf::from(value)),
        "report" => flags.report = Some(PathBuf::from(value)),
        _ => return Err(format!("Flag '{}' does not take a value", name)),
    }
    Ok(())
}

/// Take the argument at index `i`, or report that `flag` is missing its value.
fn take_arg(args: &[&str], i: usize, flag: &str) -> Result<String, String> {
    args.get(i)
        .map(|s| s.to_string())
        .ok_or_else(|| format!("Missing value for {}", flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_flags(args: &[&str]) -> Flags {
        match parse_args(args).unwrap() {
            Invocation::Run(f) => f,
            other => panic!("expected Run, got {:?}", other),
        }
    }

    #[test]
    fn no_args_is_default_run() {
        assert_eq!(run_flags(&[]), Flags::default());
    }

    #[test]
    fn long_and_short_booleans() {
        let f = run_flags(&["--verbose", "-e", "--tty", "-d", "--compact", "--no-header"]);
        assert!(f.verbose && f.only_errors && f.tty && f.not_drawable && f.compact && f.no_header);
    }

    #[test]
    fn clustered_shorts() {
        let f = run_flags(&["-vc"]);
        assert!(f.verbose);
        assert!(f.compact);
        assert!(!f.tty);
    }

    #[test]
    fn worker_count_forms() {
        assert_eq!(run_flags(&["-n", "8"]).workers, Some(8));
        assert_eq!(run_flags(&["-n8"]).workers, Some(8));
        assert_eq!(run_flags(&["--number-worker=3"]).workers, Some(3));
        assert_eq!(run_flags(&["-vn", "2"]).workers, Some(2));
    }

    #[test]
    fn worker_count_must_be_positive_number() {
        assert!(parse_args(&["-n", "0"]).is_err());
        assert!(parse_args(&["-n", "many"]).is_err());
        assert!(parse_args(&["-n"]).unwrap_err().contains("Missing value"));
    }

    #[test]
    fn path_flags() {
        let f = run_flags(&["-i", "in.txt", "--config", "c.yaml", "--report=r.json"]);
        assert_eq!(f.input, Some(PathBuf::from("in.txt")));
        assert_eq!(f.config, Some(PathBuf::from("c.yaml")));
        assert_eq!(f.report, Some(PathBuf::from("r.json")));
    }

    #[test]
    fn help_and_version() {
        assert_eq!(parse_args(&["-v", "--help"]).unwrap(), Invocation::Help);
        assert_eq!(parse_args(&["-h"]).unwrap(), Invocation::Help);
        assert_eq!(parse_args(&["-V"]).unwrap(), Invocation::Version);
    }

    #[test]
    fn usage_explains_plain_stdio() {
        assert!(USAGE.contains("Commands run with pipes, not a\nterminal"));
    }

    #[test]
    fn unknown_and_positional_rejected() {
        assert!(parse_args(&["--bogus"]).unwrap_err().contains("Unknown flag"));
        assert!(parse_args(&["-x"]).unwrap_err().contains("Unknown flag"));
        assert!(parse_args(&["echo"]).unwrap_err().contains("stdin"));
        assert!(parse_args(&["--verbose=yes"]).is_err());
    }
}
