//! Terminal facts and cursor control.
//!
//! Geometry is read once from stdout. Cursor commands are crossterm
//! commands queued onto whatever writer the caller renders to, so tests can
//! capture the exact escape sequences in a `Vec<u8>`.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::cursor::{Hide, MoveDown, MoveUp, Show};
use crossterm::queue;
use crossterm::tty::IsTty;

/// What the output destination can do, captured at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminalInfo {
    pub is_tty: bool,
    /// Columns; 0 when unknown.
    pub width: u16,
    /// Rows; 0 when unknown.
    pub height: u16,
}

impl TerminalInfo {
    /// Inspect stdout.
    pub fn detect() -> Self {
        let is_tty = io::stdout().is_tty();
        if !is_tty {
            return TerminalInfo::default();
        }
        let (width, height) = match crossterm::terminal::size() {
            Ok(size) => size,
            Err(e) => {
                tracing::debug!(error = %e, "could not read terminal size");
                (0, 0)
            }
        };
        TerminalInfo { is_tty, width, height }
    }

    /// A terminal of the given size, for embedding and tests.
    pub fn sized(width: u16, height: u16) -> Self {
        TerminalInfo {
            is_tty: true,
            width,
            height,
        }
    }

    /// Whether `lines` rows fit on screen at once.
    pub fn fits_lines(&self, lines: usize) -> bool {
        usize::from(self.height) >= lines
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Tracks cursor visibility so that showing it again is idempotent: `show`
/// only emits the escape sequence if `hide` did earlier.
#[derive(Debug, Default)]
pub struct Cursor {
    hidden: AtomicBool,
}

impl Cursor {
    pub fn new() -> Self {
        Cursor::default()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.load(Ordering::SeqCst)
    }

    pub fn hide<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if !self.hidden.swap(true, Ordering::SeqCst) {
            queue!(out, Hide)?;
            out.flush()?;
        }
        Ok(())
    }

    pub fn show<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.hidden.swap(false, Ordering::SeqCst) {
            queue!(out, Show)?;
            out.flush()?;
        }
        Ok(())
    }
}

/// Move the cursor up `lines` rows. No-op for 0.
pub fn move_up<W: Write>(out: &mut W, lines: usize) -> io::Result<()> {
    if lines == 0 {
        return Ok(());
    }
    queue!(out, MoveUp(clamp_rows(lines)))
}

/// Move the cursor down `lines` rows. No-op for 0.
pub fn move_down<W: Write>(out: &mut W, lines: usize) -> io::Result<()> {
    if lines == 0 {
        return Ok(());
    }
    queue!(out, MoveDown(clamp_rows(lines)))
}

fn clamp_rows(lines: usize) -> u16 {
    u16::try_from(lines).unwrap_or(u16::MAX)
}

/// Best-effort cursor restore on stdout, for fatal paths that bypass the
/// render loop. Only writes when stdout is a terminal.
pub fn restore_stdout_cursor() {
    let mut stdout = io::stdout();
    if stdout.is_tty() {
        let _ = queue!(stdout, Show);
        let _ = stdout.flush();
    }
}
