//! Batch runner: the render loop that drives a worker pool to completion.
//!
//! [`Batch::run`] aligns job names, starts the workers, and polls job state
//! until every job is Finished. When the output is a terminal tall enough to
//! hold one line per job (and redraw is allowed) the status block is redrawn
//! in place every [`Options::draw_interval`] with the cursor hidden;
//! otherwise the block is printed once at the end. It then prints the detail
//! section and returns the aggregated job failures.
//!
//! # Interruption
//!
//! While drawing live, termination signals are recorded instead of killing
//! the process. The loop checks for one on every tick, moves below the
//! block, shows the cursor again and returns [`RunError::Interrupted`].
//! Workers are not joined on that path; the caller is expected to exit.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;

use parrun_core::{collect_failures, Job, JobFailures, PoolError, Work, WorkerPool};

use crate::draw;
use crate::options::Options;
use crate::signals::{self, InterruptHandle};
use crate::style::Palette;
use crate::terminal::{self, Cursor, TerminalInfo};

/// Why a batch did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{0}")]
    Failed(#[from] JobFailures),

    #[error("interrupted by signal {signal}")]
    Interrupted { signal: i32 },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] io::Error),
}

impl RunError {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Interrupted { signal } => 128 + signal,
            _ => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Runs jobs through a [`Work`] and renders their progress to `output`.
pub struct Batch<W, T> {
    output: W,
    work: Arc<dyn Work<T>>,
    options: Options,
    terminal: TerminalInfo,
    palette: Palette,
    cursor: Cursor,
    interrupt: InterruptHandle,
}

impl<W: Write, T: Send + Sync + 'static> Batch<W, T> {
    /// Create a runner writing to `output`. `terminal` describes that
    /// output; `options.force_tty` overrides its tty flag.
    pub fn new(output: W, work: impl Work<T> + 'static, options: Options, terminal: TerminalInfo) -> Self {
        let terminal = TerminalInfo {
            is_tty: terminal.is_tty || options.force_tty,
            ..terminal
        };
        Batch {
            output,
            work: Arc::new(work),
            palette: Palette::new(terminal.is_tty),
            options,
            terminal,
            cursor: Cursor::new(),
            interrupt: InterruptHandle::new(),
        }
    }

    /// Handle that stops a live run as if a signal had arrived.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Whether `jobs` lines can be redrawn in place.
    pub fn is_drawable(&self, jobs: usize) -> bool {
        jobs > 0 && self.terminal.is_tty && self.terminal.fits_lines(jobs) && !self.options.not_drawable
    }

    /// Run every job with `parallelism` workers and render the result.
    ///
    /// Returns `Ok(())` when no job recorded an error, otherwise
    /// [`RunError::Failed`] listing every failed job in batch order.
    pub fn run(&mut self, jobs: &Arc<[Job<T>]>, parallelism: usize) -> Result<(), RunError> {
        let result = self.render(jobs, parallelism);
        if result.is_err() {
            let _ = self.cursor.show(&mut self.output);
        }
        result
    }

    fn render(&mut self, jobs: &Arc<[Job<T>]>, parallelism: usize) -> Result<(), RunError> {
        let pool = WorkerPool::new(parallelism);
        let count = jobs.len();
        let live = self.is_drawable(count) && !self.options.compact;
        tracing::debug!(jobs = count, workers = pool.parallelism(), live, "starting batch");

        if !self.options.no_header {
            write!(self.output, "{}", draw::intro_line(pool.parallelism()))?;
            if !self.options.compact {
                writeln!(self.output)?;
            }
            self.output.flush()?;
        }
        if draw::align_names(jobs, self.terminal.width) {
            tracing::debug!(width = draw::max_name_len(jobs), "aligned job names");
        }

        let signal_guard = if live {
            Some(signals::install().map_err(RunError::Signals)?)
        } else {
            None
        };
        if live {
            self.cursor.hide(&mut self.output)?;
            self.redraw(jobs)?;
        }

        let workers = pool.spawn(Arc::clone(jobs), Arc::clone(&self.work))?;
        self.wait_for_completion(jobs, live)?;
        workers.join();
        drop(signal_guard);

        // A signal can land between the final poll and the guard drop.
        if live {
            if let Some(signal) = self.interrupted() {
                tracing::debug!(signal, "interrupted as the batch finished");
                return Err(RunError::Interrupted { signal });
            }
        }

        if !self.options.compact {
            if !live {
                write!(self.output, "{}", draw::status_block(jobs, &self.palette))?;
            }
            writeln!(self.output)?;
        }

        let outcome = collect_failures(jobs);
        if self.options.shows_details() {
            self.write_details(jobs, outcome.is_err())?;
        }
        if self.options.compact {
            writeln!(self.output, "{}", draw::outcome_glyph(outcome.is_ok(), &self.palette))?;
        }
        self.output.flush()?;
        outcome.map_err(RunError::Failed)
    }

    /// Poll until every job is Finished, redrawing when live.
    fn wait_for_completion(&mut self, jobs: &[Job<T>], live: bool) -> Result<(), RunError> {
        let count = jobs.len();
        let interval = if live {
            self.options.draw_interval
        } else {
            self.options.idle_interval
        };

        loop {
            if live {
                if let Some(signal) = self.interrupted() {
                    tracing::debug!(signal, "render loop interrupted");
                    terminal::move_down(&mut self.output, count)?;
                    self.cursor.show(&mut self.output)?;
                    return Err(RunError::Interrupted { signal });
                }
            }

            // Count before drawing so the final frame shows every job done.
            let finished = jobs.iter().filter(|j| j.is_finished()).count();
            if live {
                self.redraw(jobs)?;
            }
            if finished == count {
                if live {
                    terminal::move_down(&mut self.output, count)?;
                    self.cursor.show(&mut self.output)?;
                }
                return Ok(());
            }
            thread::sleep(interval);
        }
    }

    fn interrupted(&self) -> Option<i32> {
        signals::pending().or_else(|| self.interrupt.triggered())
    }

    /// Print the status block and return the cursor to its first line.
    fn redraw(&mut self, jobs: &[Job<T>]) -> io::Result<()> {
        write!(self.output, "{}", draw::status_block(jobs, &self.palette))?;
        terminal::move_up(&mut self.output, jobs.len())?;
        self.output.flush()
    }

    fn write_details(&mut self, jobs: &[Job<T>], has_failures: bool) -> io::Result<()> {
        if self.options.only_errors && !has_failures {
            return Ok(());
        }
        if self.options.only_errors {
            write!(self.output, "{}", draw::errors_banner(&self.palette))?;
        } else {
            write!(self.output, "{}", draw::all_outputs_banner())?;
        }
        for job in jobs {
            if self.options.only_errors && job.error().is_none() {
                continue;
            }
            write!(self.output, "{}", draw::detail_block(job, &self.palette))?;
        }
        Ok(())
    }
}
