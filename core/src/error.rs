//! Error types for parrun-core.

use std::fmt;
use std::io;

use crate::job::Job;

/// Failure of the input broadcast. Independent of any job outcome.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("failed to read fanout source: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write to fanout sink {sink}: {source}")]
    Write {
        sink: usize,
        #[source]
        source: io::Error,
    },
}

/// Failure to bring up the worker pool.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

// ---------------------------------------------------------------------------
// JobFailures
// ---------------------------------------------------------------------------

/// One failed job inside a [`JobFailures`].
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    /// Position of the job in the batch.
    pub index: usize,
    pub name: String,
    pub message: String,
}

/// Composite error for a batch: every failed job, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailures {
    pub failures: Vec<JobFailure>,
}

impl JobFailures {
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.name.as_str()).collect()
    }
}

impl fmt::Display for JobFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "{}", failure.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for JobFailures {}

/// Gather the error of every job that recorded one, preserving job order.
/// `Ok(())` when no job failed.
pub fn collect_failures<T>(jobs: &[Job<T>]) -> Result<(), JobFailures> {
    let failures: Vec<JobFailure> = jobs
        .iter()
        .enumerate()
        .filter_map(|(index, job)| {
            job.error().map(|err| JobFailure {
                index,
                name: job.name().to_string(),
                message: err.to_string(),
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(JobFailures { failures })
    }
}
