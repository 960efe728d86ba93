//! JSON report of a finished batch.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use parrun_core::BatchSummary;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("cannot write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot encode report {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Write `summary` as pretty-printed JSON to `path`, replacing any file.
pub fn write_report(path: &Path, summary: &BatchSummary) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).map_err(|source| ReportError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    writeln!(writer).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    tracing::debug!(path = %path.display(), jobs = summary.total, "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parrun_core::Job;

    #[test]
    fn report_lists_every_job() {
        let ok = Job::new("echo hi", ());
        ok.start();
        ok.finish();
        let bad = Job::new("false", ());
        bad.start();
        bad.record_error("exit status: 1".into());
        bad.finish();
        let summary = BatchSummary::from_jobs(&[ok, bad]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&path, &summary).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["jobs"][0]["name"], "echo hi");
        assert_eq!(value["jobs"][1]["ok"], false);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let summary = BatchSummary::from_jobs::<()>(&[]);
        let err = write_report(Path::new("/nonexistent-dir/report.json"), &summary).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
