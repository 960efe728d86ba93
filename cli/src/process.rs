//! Subprocess work: run one command per job and capture its output.
//!
//! stdout and stderr are both copied into the job's output buffer as they
//! arrive. The job's input is its fanout channel, taken exactly once and
//! pumped into the child's stdin. A child that exits without reading all of
//! it is not an error: the rest of the input is drained and discarded so the
//! fanout never sees a broken pipe.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{ChildStdin, Command, ExitStatus, Stdio};
use std::sync::Mutex;
use std::thread;

use parrun_core::{ChannelSource, Job, JobError, Work};

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("empty command")]
    Empty,

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Exit(ExitStatus),
}

/// Payload of a command job.
#[derive(Debug)]
pub struct CommandTask {
    argv: Vec<String>,
    stdin: Mutex<Option<ChannelSource>>,
}

impl CommandTask {
    pub fn new(argv: Vec<String>, stdin: Option<ChannelSource>) -> Self {
        CommandTask {
            argv,
            stdin: Mutex::new(stdin),
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The input channel, if it has not been taken yet.
    fn take_stdin(&self) -> Option<ChannelSource> {
        match self.stdin.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// Runs each job's command in `workdir` with the inherited environment.
#[derive(Debug, Clone)]
pub struct ProcessWork {
    workdir: PathBuf,
}

impl ProcessWork {
    pub fn new(workdir: PathBuf) -> Self {
        ProcessWork { workdir }
    }
}

impl Work<CommandTask> for ProcessWork {
    fn execute(&self, job: &Job<CommandTask>) -> Result<(), JobError> {
        let task = job.payload();
        let (program, args) = task.argv.split_first().ok_or(ProcessError::Empty)?;
        let input = task.take_stdin();
        let stdin = if input.is_some() { Stdio::piped() } else { Stdio::null() };

        let spawned = Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                if let Some(input) = input {
                    discard(input, job);
                }
                return Err(ProcessError::Spawn {
                    program: program.clone(),
                    source,
                }
                .into());
            }
        };
        tracing::debug!(job = %job.name(), argv = ?task.argv(), pid = child.id(), "spawned");

        let child_stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        thread::scope(|s| {
            if let Some(input) = input {
                s.spawn(move || feed(input, child_stdin, job));
            }
            if let Some(out) = stdout {
                s.spawn(move || capture(out, job));
            }
            if let Some(err) = stderr {
                s.spawn(move || capture(err, job));
            }
        });

        let status = child.wait().map_err(|source| ProcessError::Wait {
            program: program.clone(),
            source,
        })?;
        tracing::debug!(job = %job.name(), %status, "exited");
        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::Exit(status).into())
        }
    }
}

/// Copy the job's input into the child's stdin, then discard whatever the
/// child did not read. Returns once the input stream has ended.
fn feed(mut input: ChannelSource, stdin: Option<ChildStdin>, job: &Job<CommandTask>) {
    if let Some(mut stdin) = stdin {
        match io::copy(&mut input, &mut stdin) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::debug!(job = %job.name(), "task closed stdin before the input ended");
            }
            Err(e) => {
                tracing::warn!(job = %job.name(), error = %e, "failed to feed task stdin");
            }
        }
    }
    discard(input, job);
}

/// Read the rest of the input and throw it away.
fn discard(mut input: ChannelSource, job: &Job<CommandTask>) {
    if let Err(e) = io::copy(&mut input, &mut io::sink()) {
        tracing::warn!(job = %job.name(), error = %e, "failed to drain task input");
    }
}

fn capture<R: Read>(mut stream: R, job: &Job<CommandTask>) {
    if let Err(e) = io::copy(&mut stream, &mut job.output()) {
        tracing::warn!(job = %job.name(), error = %e, "lost part of task output");
    }
}
