//! Termination-signal watch for the interactive render loop.
//!
//! While the live status block is drawn the cursor is hidden, so a signal
//! that kills the process must not leave it that way. Instead of exiting from
//! inside a handler, the handler only records which signal arrived; the
//! render loop notices on its next tick, restores the cursor and returns.

use std::io;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Signals that end an interactive run.
pub const WATCHED: [libc::c_int; 4] = [libc::SIGINT, libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Last watched signal received, 0 if none.
static PENDING: AtomicI32 = AtomicI32::new(0);

extern "C" fn record_signal(signal: libc::c_int) {
    PENDING.store(signal, Ordering::SeqCst);
}

/// The signal received since [`install`], if any.
pub fn pending() -> Option<i32> {
    match PENDING.load(Ordering::SeqCst) {
        0 => None,
        signal => Some(signal),
    }
}

/// Handlers for [`WATCHED`] signals. Dropping the guard reinstates the
/// dispositions that were active before.
pub struct SignalGuard {
    previous: Vec<(libc::c_int, libc::sigaction)>,
}

/// Route the watched signals to the recorder and clear any stale record.
pub fn install() -> io::Result<SignalGuard> {
    PENDING.store(0, Ordering::SeqCst);
    let mut guard = SignalGuard { previous: Vec::new() };
    for &signal in WATCHED.iter() {
        // SAFETY: the handler only performs an atomic store, which is
        // async-signal-safe; both sigaction structs are fully initialized.
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = record_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&mut action.sa_mask);

            let mut old: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(signal, &action, &mut old) != 0 {
                return Err(io::Error::last_os_error());
            }
            guard.previous.push((signal, old));
        }
    }
    tracing::debug!("termination signal handlers installed");
    Ok(guard)
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        for (signal, old) in self.previous.drain(..) {
            // SAFETY: `old` was filled in by a successful sigaction call.
            let rc = unsafe { libc::sigaction(signal, &old, std::ptr::null_mut()) };
            if rc != 0 {
                tracing::warn!(signal, error = %io::Error::last_os_error(), "failed to restore signal handler");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InterruptHandle
// ---------------------------------------------------------------------------

/// Programmatic interrupt, checked by the render loop alongside OS signals.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    signal: Arc<AtomicI32>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        InterruptHandle::default()
    }

    /// Ask the render loop to stop as if `signal` had been received.
    pub fn trigger(&self, signal: i32) {
        self.signal.store(signal, Ordering::SeqCst);
    }

    pub fn triggered(&self) -> Option<i32> {
        match self.signal.load(Ordering::SeqCst) {
            0 => None,
            signal => Some(signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_handle_starts_clear() {
        let handle = InterruptHandle::new();
        assert_eq!(handle.triggered(), None);
        let clone = handle.clone();
        clone.trigger(libc::SIGTERM);
        assert_eq!(handle.triggered(), Some(libc::SIGTERM));
    }

    #[test]
    fn watched_signals_cover_terminal_shutdown() {
        assert!(WATCHED.contains(&libc::SIGINT));
        assert!(WATCHED.contains(&libc::SIGHUP));
    }
}
