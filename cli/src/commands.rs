//! Command list parsing: one shell-quoted command per line.

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct CommandParseError {
    pub line: usize,
    #[source]
    pub source: shell_words::ParseError,
}

/// Split `raw` into argument vectors. Blank lines and `#` comments are
/// skipped; line numbers in errors are 1-based.
pub fn parse_commands(raw: &str) -> Result<Vec<Vec<String>>, CommandParseError> {
    let mut commands = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let argv = shell_words::split(text).map_err(|source| CommandParseError {
            line: index + 1,
            source,
        })?;
        if !argv.is_empty() {
            commands.push(argv);
        }
    }
    Ok(commands)
}

/// Display label for a command.
pub fn label(argv: &[String]) -> String {
    argv.join(" ")
}
