//! parrun-core: run a batch of independent jobs on a fixed worker pool.
//!
//! # Modules
//!
//! - [`job`]: the job record and its Waiting → Running → Finished lifecycle
//! - [`pool`]: the `Work` capability, FIFO job queue and worker threads
//! - [`fanout`]: broadcast of one input stream to many sinks
//! - [`error`]: error types and the batch failure aggregator
//! - [`summary`]: serializable batch outcome

pub mod error;
pub mod fanout;
pub mod job;
pub mod pool;
pub mod summary;

pub use error::{collect_failures, FanoutError, JobFailure, JobFailures, PoolError};
pub use fanout::{channel, ChannelSink, ChannelSource, Fanout, Sink};
pub use job::{Job, JobError, JobOutput, JobState};
pub use pool::{JobQueue, PoolHandle, Work, WorkerPool};
pub use summary::{BatchSummary, JobSummary};
