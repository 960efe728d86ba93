//! Serializable snapshot of a batch, for machine-readable reports.

use serde::Serialize;

use crate::job::{Job, JobState};

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub name: String,
    pub state: JobState,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub output: String,
}

/// Outcome of a whole batch, jobs in batch order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub jobs: Vec<JobSummary>,
}

impl BatchSummary {
    pub fn from_jobs<T>(jobs: &[Job<T>]) -> Self {
        let jobs: Vec<JobSummary> = jobs
            .iter()
            .map(|job| {
                let error = job.error().map(|e| e.to_string());
                JobSummary {
                    name: job.name().to_string(),
                    state: job.state(),
                    ok: job.is_finished() && error.is_none(),
                    error,
                    output: job.output_lossy(),
                }
            })
            .collect();
        let failed = jobs.iter().filter(|j| j.error.is_some()).count();
        let succeeded = jobs.iter().filter(|j| j.ok).count();
        BatchSummary {
            total: jobs.len(),
            succeeded,
            failed,
            jobs,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn summary_counts_and_serializes() {
        let ok = Job::new("ok", ());
        ok.start();
        write!(ok.output(), "fine").unwrap();
        ok.finish();

        let bad = Job::new("bad", ());
        bad.start();
        bad.record_error("exit status: 2".into());
        bad.finish();

        let pending = Job::new("pending", ());

        let summary = BatchSummary::from_jobs(&[ok, bad, pending]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_success());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["jobs"][0]["output"], "fine");
        assert_eq!(json["jobs"][1]["state"], "finished");
        assert_eq!(json["jobs"][1]["error"], "exit status: 2");
        assert!(json["jobs"][0].get("error").is_none());
        assert_eq!(json["jobs"][2]["state"], "waiting");
    }
}
