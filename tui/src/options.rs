//! Rendering options for a batch run.

use std::time::Duration;

/// Redraw cadence while the live status block is on screen.
pub const DRAW_INTERVAL: Duration = Duration::from_millis(50);

/// Completion polling cadence when nothing is redrawn.
pub const IDLE_INTERVAL: Duration = Duration::from_secs(1);

/// How a batch presents itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Detail section lists failed jobs only.
    pub only_errors: bool,
    /// No detail section at all.
    pub no_verbose: bool,
    /// No per-job lines or details; a single `[Ok]`/`[Fail]` at the end.
    pub compact: bool,
    /// Treat the output as a terminal even if it is not one.
    pub force_tty: bool,
    /// Never redraw in place; print the status block once at the end.
    pub not_drawable: bool,
    /// Skip the "Running all tasks ..." line.
    pub no_header: bool,
    pub draw_interval: Duration,
    pub idle_interval: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            only_errors: false,
            no_verbose: false,
            compact: false,
            force_tty: false,
            not_drawable: false,
            no_header: false,
            draw_interval: DRAW_INTERVAL,
            idle_interval: IDLE_INTERVAL,
        }
    }
}

impl Options {
    /// Whether the detail section is printed after the status block.
    pub fn shows_details(&self) -> bool {
        !self.no_verbose && !self.compact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_poll_like_a_terminal_app() {
        let opts = Options::default();
        assert_eq!(opts.draw_interval, Duration::from_millis(50));
        assert_eq!(opts.idle_interval, Duration::from_secs(1));
        assert!(opts.shows_details());
    }

    #[test]
    fn compact_and_no_verbose_hide_details() {
        let compact = Options { compact: true, ..Options::default() };
        let quiet = Options { no_verbose: true, ..Options::default() };
        assert!(!compact.shows_details());
        assert!(!quiet.shows_details());
    }
}
