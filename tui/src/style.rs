//! ANSI color and box-drawing constants, plus a palette that can be
//! switched off when output is not a terminal.

// ---------------------------------------------------------------------------
// ANSI escape constants
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";
pub const BRIGHT_YELLOW: &str = "\x1b[93m";
pub const BRIGHT_BLUE: &str = "\x1b[94m";

// ---------------------------------------------------------------------------
// Box-drawing characters
// ---------------------------------------------------------------------------

pub const BOX_H: char = '\u{2500}';  // ─
pub const BOX_V: char = '\u{2502}';  // │
pub const BOX_TL: char = '\u{250C}'; // ┌
pub const BOX_TR: char = '\u{2510}'; // ┐
pub const BOX_BL: char = '\u{2514}'; // └
pub const BOX_BR: char = '\u{2518}'; // ┘
pub const BOX_L: char = '\u{251C}';  // ├

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Wraps text in color codes, or passes it through untouched when disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Palette { enabled }
    }

    /// Palette that never emits escape codes.
    pub fn plain() -> Self {
        Palette { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", code, text, RESET)
        } else {
            text.to_string()
        }
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    pub fn bright_yellow(&self, text: &str) -> String {
        self.paint(BRIGHT_YELLOW, text)
    }

    pub fn bright_blue(&self, text: &str) -> String {
        self.paint(BRIGHT_BLUE, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_palette_passes_text_through() {
        let p = Palette::plain();
        assert_eq!(p.red("Fail"), "Fail");
        assert!(!p.is_enabled());
    }

    #[test]
    fn enabled_palette_wraps_and_resets() {
        let p = Palette::new(true);
        assert_eq!(p.green("Ok"), "\x1b[32mOk\x1b[0m");
        assert_eq!(p.bright_yellow("Waiting"), "\x1b[93mWaiting\x1b[0m");
    }

    #[test]
    fn box_chars_are_correct() {
        assert_eq!(BOX_H, '─');
        assert_eq!(BOX_V, '│');
        assert_eq!(BOX_L, '├');
        assert_eq!(BOX_BL, '└');
    }
}
