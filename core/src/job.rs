//! Jobs: one independent unit of work and its lifecycle.
//!
//! A [`Job`] is created by the driver before the pool starts and is then
//! shared between exactly one worker (the writer of state, error and output)
//! and any number of readers (the render loop, the detail printer). All
//! mutable fields are synchronized per job: the state is an atomic tag, the
//! error slot is set-once, and the output buffer sits behind its own lock.

use std::error::Error;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};

/// Error recorded on a job when its work fails.
pub type JobError = Box<dyn Error + Send + Sync>;

// ---------------------------------------------------------------------------
// JobState
// ---------------------------------------------------------------------------

/// Lifecycle of a job. Only moves forward: Waiting → Running → Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Running,
    Finished,
}

impl JobState {
    fn tag(self) -> u8 {
        match self {
            JobState::Waiting => 0,
            JobState::Running => 1,
            JobState::Finished => 2,
        }
    }

    fn from_tag(tag: u8) -> JobState {
        match tag {
            0 => JobState::Waiting,
            1 => JobState::Running,
            _ => JobState::Finished,
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A named unit of work carrying a caller-owned payload.
#[derive(Debug)]
pub struct Job<T> {
    name: String,
    payload: T,
    state: AtomicU8,
    /// Width the name is padded to when displayed; 0 means unpadded.
    display_width: AtomicUsize,
    error: OnceLock<JobError>,
    output: Mutex<Vec<u8>>,
}

impl<T> Job<T> {
    /// Create a job in the Waiting state with an empty output buffer.
    pub fn new(name: impl Into<String>, payload: T) -> Self {
        Job {
            name: name.into(),
            payload,
            state: AtomicU8::new(JobState::Waiting.tag()),
            display_width: AtomicUsize::new(0),
            error: OnceLock::new(),
            output: Mutex::new(Vec::new()),
        }
    }

    /// The name as supplied by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name right-padded with spaces to the aligned width, if any.
    pub fn display_name(&self) -> String {
        let width = self.display_width.load(Ordering::Relaxed);
        format!("{:<width$}", self.name, width = width)
    }

    /// Record the width `display_name` pads to. Meant for the single
    /// alignment pass that happens before any worker starts.
    pub fn align_to(&self, width: usize) {
        self.display_width.store(width, Ordering::Relaxed);
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn state(&self) -> JobState {
        JobState::from_tag(self.state.load(Ordering::Acquire))
    }

    pub fn is_finished(&self) -> bool {
        self.state() == JobState::Finished
    }

    /// The recorded error, if the work reported one.
    pub fn error(&self) -> Option<&JobError> {
        self.error.get()
    }

    /// True once the job has finished with an error.
    pub fn failed(&self) -> bool {
        self.is_finished() && self.error.get().is_some()
    }

    /// Record a failure. The first error wins; returns false if one was
    /// already recorded.
    pub fn record_error(&self, err: JobError) -> bool {
        self.error.set(err).is_ok()
    }

    /// A writer appending to this job's output buffer.
    pub fn output(&self) -> JobOutput<'_> {
        JobOutput { buf: &self.output }
    }

    /// Copy of everything written to the output buffer so far.
    pub fn output_bytes(&self) -> Vec<u8> {
        match self.output.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Output buffer decoded as UTF-8, replacing invalid sequences.
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output_bytes()).into_owned()
    }

    /// Waiting → Running. Returns false if the job was not Waiting.
    pub fn start(&self) -> bool {
        self.advance(JobState::Waiting, JobState::Running)
    }

    /// Running → Finished. Returns false if the job was not Running.
    pub fn finish(&self) -> bool {
        self.advance(JobState::Running, JobState::Finished)
    }

    fn advance(&self, from: JobState, to: JobState) -> bool {
        let moved = self
            .state
            .compare_exchange(from.tag(), to.tag(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if moved {
            tracing::debug!(job = %self.name, state = ?to, "job state changed");
        } else {
            tracing::debug!(job = %self.name, from = ?from, to = ?to, current = ?self.state(), "rejected job transition");
        }
        moved
    }
}

// ---------------------------------------------------------------------------
// JobOutput
// ---------------------------------------------------------------------------

/// Cloneable writer into a job's output buffer. Each `write` appends
/// atomically, so two handles writing concurrently interleave by chunk.
#[derive(Debug, Clone, Copy)]
pub struct JobOutput<'a> {
    buf: &'a Mutex<Vec<u8>>,
}

impl Write for JobOutput<'_> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "job output lock poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_waiting_without_error() {
        let job = Job::new("build", 7u32);
        assert_eq!(job.state(), JobState::Waiting);
        assert!(job.error().is_none());
        assert!(!job.failed());
        assert_eq!(*job.payload(), 7);
    }

    #[test]
    fn state_only_moves_forward() {
        let job = Job::new("a", ());
        assert!(!job.finish(), "cannot finish a waiting job");
        assert!(job.start());
        assert!(!job.start(), "cannot start twice");
        assert_eq!(job.state(), JobState::Running);
        assert!(job.finish());
        assert_eq!(job.state(), JobState::Finished);
        assert!(!job.start());
        assert!(!job.finish());
        assert_eq!(job.state(), JobState::Finished);
    }

    #[test]
    fn first_error_wins() {
        let job = Job::new("a", ());
        assert!(job.record_error("first".into()));
        assert!(!job.record_error("second".into()));
        assert_eq!(job.error().unwrap().to_string(), "first");
    }

    #[test]
    fn failed_requires_finished() {
        let job = Job::new("a", ());
        job.start();
        job.record_error("boom".into());
        assert!(!job.failed());
        job.finish();
        assert!(job.failed());
    }

    #[test]
    fn output_handles_append() {
        let job = Job::new("a", ());
        let mut out = job.output();
        let mut other = out;
        out.write_all(b"hello ").unwrap();
        other.write_all(b"world\n").unwrap();
        assert_eq!(job.output_lossy(), "hello world\n");
    }

    #[test]
    fn display_name_pads_without_touching_name() {
        let job = Job::new("ab", ());
        assert_eq!(job.display_name(), "ab");
        job.align_to(5);
        assert_eq!(job.display_name(), "ab   ");
        assert_eq!(job.name(), "ab");
    }

    #[test]
    fn display_name_never_truncates() {
        let job = Job::new("longname", ());
        job.align_to(3);
        assert_eq!(job.display_name(), "longname");
    }
}
