//! Worker pool: a fixed set of threads draining a FIFO job queue.
//!
//! The queue holds job indices and is filled completely before any worker
//! starts. Each worker claims the next index, drives that job through
//! Running → Finished around one call to the [`Work`], and repeats until the
//! queue is empty. A failing or panicking job is recorded on that job only;
//! it never stops the pool.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::PoolError;
use crate::job::{Job, JobError};

// ---------------------------------------------------------------------------
// Work
// ---------------------------------------------------------------------------

/// The per-job behavior a worker invokes. Writes its output through
/// `job.output()`; an `Err` becomes the job's recorded error.
pub trait Work<T>: Send + Sync {
    fn execute(&self, job: &Job<T>) -> Result<(), JobError>;
}

impl<T, F> Work<T> for F
where
    F: Fn(&Job<T>) -> Result<(), JobError> + Send + Sync,
{
    fn execute(&self, job: &Job<T>) -> Result<(), JobError> {
        self(job)
    }
}

// ---------------------------------------------------------------------------
// JobQueue
// ---------------------------------------------------------------------------

/// FIFO of job indices shared by all workers. Each index is handed out once.
#[derive(Debug)]
pub struct JobQueue {
    pending: Mutex<VecDeque<usize>>,
}

impl JobQueue {
    /// Queue indices `0..len` in order.
    pub fn with_len(len: usize) -> Self {
        JobQueue {
            pending: Mutex::new((0..len).collect()),
        }
    }

    /// Take the next unclaimed index.
    pub fn claim(&self) -> Option<usize> {
        match self.pending.lock() {
            Ok(mut pending) => pending.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }
    }

    pub fn remaining(&self) -> usize {
        match self.pending.lock() {
            Ok(pending) => pending.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkerPool
// ---------------------------------------------------------------------------

/// Starts a fixed number of worker threads over a batch of jobs.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    parallelism: usize,
}

/// Join handles of a running pool.
#[derive(Debug)]
pub struct PoolHandle {
    workers: Vec<JoinHandle<()>>,
}

impl PoolHandle {
    /// Wait for every worker to drain the queue and exit.
    pub fn join(self) {
        for worker in self.workers {
            if worker.join().is_err() {
                tracing::warn!("worker thread panicked outside of job work");
            }
        }
    }
}

impl WorkerPool {
    /// A parallelism of 0 is treated as 1.
    pub fn new(parallelism: usize) -> Self {
        WorkerPool {
            parallelism: parallelism.max(1),
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Start the workers and return immediately.
    pub fn spawn<T>(&self, jobs: Arc<[Job<T>]>, work: Arc<dyn Work<T>>) -> Result<PoolHandle, PoolError>
    where
        T: Send + Sync + 'static,
    {
        let queue = Arc::new(JobQueue::with_len(jobs.len()));
        tracing::debug!(jobs = jobs.len(), workers = self.parallelism, "starting worker pool");

        let mut workers = Vec::with_capacity(self.parallelism);
        for id in 0..self.parallelism {
            let jobs = Arc::clone(&jobs);
            let work = Arc::clone(&work);
            let queue = Arc::clone(&queue);
            let worker = thread::Builder::new()
                .name(format!("parrun-worker-{}", id))
                .spawn(move || worker_loop(&jobs, work.as_ref(), &queue))
                .map_err(PoolError::Spawn)?;
            workers.push(worker);
        }
        Ok(PoolHandle { workers })
    }

    /// Run every job to completion, blocking the caller.
    pub fn run<T>(&self, jobs: Arc<[Job<T>]>, work: Arc<dyn Work<T>>) -> Result<(), PoolError>
    where
        T: Send + Sync + 'static,
    {
        self.spawn(jobs, work)?.join();
        Ok(())
    }
}

fn worker_loop<T>(jobs: &[Job<T>], work: &dyn Work<T>, queue: &JobQueue) {
    while let Some(index) = queue.claim() {
        let job = &jobs[index];
        job.start();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work.execute(job)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                job.record_error(err);
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(job = %job.name(), panic = %message, "job work panicked");
                job.record_error(format!("work panicked: {}", message).into());
            }
        }
        job.finish();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::collect_failures;
    use crate::job::JobState;

    fn batch(names: &[&str]) -> Arc<[Job<usize>]> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Job::new(*n, i))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn queue_hands_out_each_index_once_in_order() {
        let queue = JobQueue::with_len(3);
        assert_eq!(queue.remaining(), 3);
        assert_eq!(queue.claim(), Some(0));
        assert_eq!(queue.claim(), Some(1));
        assert_eq!(queue.claim(), Some(2));
        assert_eq!(queue.claim(), None);
    }

    #[test]
    fn zero_parallelism_means_one_worker() {
        assert_eq!(WorkerPool::new(0).parallelism(), 1);
    }

    #[test]
    fn single_worker_claims_in_fifo_order() {
        let jobs = batch(&["j1", "j2", "j3", "j4"]);
        let started = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&started);
        let work = move |job: &Job<usize>| -> Result<(), JobError> {
            log.lock().unwrap().push(*job.payload());
            Ok(())
        };

        WorkerPool::new(1).run(Arc::clone(&jobs), Arc::new(work)).unwrap();
        assert_eq!(*started.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn every_job_finishes_and_errors_stay_local() {
        let jobs = batch(&["a", "b", "c", "d", "e"]);
        let work = |job: &Job<usize>| -> Result<(), JobError> {
            writeln!(job.output(), "hello from {}", job.name())?;
            if *job.payload() == 1 {
                return Err("b failed".into());
            }
            Ok(())
        };

        WorkerPool::new(2).run(Arc::clone(&jobs), Arc::new(work)).unwrap();
        for job in jobs.iter() {
            assert_eq!(job.state(), JobState::Finished);
            assert_eq!(job.output_lossy(), format!("hello from {}\n", job.name()));
        }
        let err = collect_failures(&jobs).unwrap_err();
        assert_eq!(err.names(), vec!["b"]);
    }

    #[test]
    fn panicking_work_is_recorded_as_failure() {
        let jobs = batch(&["ok", "boom", "after"]);
        let work = |job: &Job<usize>| -> Result<(), JobError> {
            if job.name() == "boom" {
                panic!("kaput");
            }
            Ok(())
        };

        WorkerPool::new(1).run(Arc::clone(&jobs), Arc::new(work)).unwrap();
        assert!(jobs.iter().all(|j| j.is_finished()));
        assert_eq!(jobs[1].error().unwrap().to_string(), "work panicked: kaput");
        assert!(jobs[2].error().is_none());
    }

    #[test]
    fn workers_run_in_parallel() {
        let jobs = batch(&["a", "b", "c"]);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
        let work = move |_: &Job<usize>| -> Result<(), JobError> {
            let now = r.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(100));
            r.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        };

        WorkerPool::new(3).run(jobs, Arc::new(work)).unwrap();
        assert!(peak.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn more_workers_than_jobs() {
        let jobs = batch(&["only"]);
        let work = |_: &Job<usize>| -> Result<(), JobError> { Ok(()) };
        WorkerPool::new(8).run(Arc::clone(&jobs), Arc::new(work)).unwrap();
        assert!(jobs[0].is_finished());
    }
}
