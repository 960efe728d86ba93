//! parrun-tui: live terminal rendering for a parrun batch.
//!
//! Formatting is kept in pure string builders; only [`batch`] writes to the
//! output.
//!
//! # Modules
//!
//! - [`batch`]: the render loop driving a worker pool
//! - [`draw`]: status lines, detail blocks, name alignment
//! - [`options`]: presentation flags and polling cadence
//! - [`signals`]: termination-signal watch for live drawing
//! - [`style`]: ANSI colors and box-drawing characters
//! - [`terminal`]: terminal geometry and cursor control

pub mod batch;
pub mod draw;
pub mod options;
pub mod signals;
pub mod style;
pub mod terminal;

pub use batch::{Batch, RunError};
pub use options::Options;
pub use signals::InterruptHandle;
pub use terminal::TerminalInfo;
