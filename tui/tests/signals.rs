//! Real signal delivery, kept in its own test binary so the process-wide
//! handlers cannot leak into the other tests.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use parrun_core::{Job, JobError};
use parrun_tui::{signals, Batch, Options, RunError, TerminalInfo};

/// Handlers and the pending record are process-wide; run one test at a time.
static SERIAL: Mutex<()> = Mutex::new(());

#[test]
fn signal_is_recorded_then_handlers_restored() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let guard = signals::install().unwrap();
    assert_eq!(signals::pending(), None);

    unsafe {
        libc::raise(libc::SIGHUP);
    }
    assert_eq!(signals::pending(), Some(libc::SIGHUP));
    drop(guard);

    // A fresh install clears the stale record.
    let guard = signals::install().unwrap();
    assert_eq!(signals::pending(), None);
    drop(guard);
}

#[test]
fn terminate_signal_stops_live_render_loop() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let jobs: Arc<[Job<()>]> = vec![Job::new("sleeper", ()), Job::new("other", ())].into();
    let work = |job: &Job<()>| -> Result<(), JobError> {
        writeln!(job.output(), "working")?;
        thread::sleep(Duration::from_millis(500));
        Ok(())
    };
    let opts = Options {
        no_header: true,
        draw_interval: Duration::from_millis(5),
        ..Options::default()
    };
    let mut batch = Batch::new(Vec::new(), work, opts, TerminalInfo::sized(80, 24));

    let raiser = thread::spawn(|| {
        thread::sleep(Duration::from_millis(50));
        unsafe {
            libc::raise(libc::SIGTERM);
        }
    });
    let err = batch.run(&jobs, 2).unwrap_err();
    raiser.join().unwrap();

    assert!(matches!(err, RunError::Interrupted { signal } if signal == libc::SIGTERM));
    let out = String::from_utf8(batch.into_output()).unwrap();
    assert!(out.starts_with("\x1b[?25l"));
    assert!(out.ends_with("\x1b[2B\x1b[?25h"));
}
