//! Status and detail formatting.
//!
//! Pure string builders: nothing here writes to the terminal. The render
//! loop in [`crate::batch`] decides when and where these strings go.

use parrun_core::{Job, JobState};

use crate::style::{Palette, BOX_BL, BOX_BR, BOX_H, BOX_L, BOX_TL, BOX_TR, BOX_V};

/// Columns kept free to the right of an aligned name for the state glyph.
pub const STATUS_COLUMNS: usize = 20;

// ---------------------------------------------------------------------------
// Name alignment
// ---------------------------------------------------------------------------

/// Length, in characters, of the longest job name.
pub fn max_name_len<T>(jobs: &[Job<T>]) -> usize {
    jobs.iter()
        .map(|j| j.name().chars().count())
        .max()
        .unwrap_or(0)
}

/// Pad every job name to the longest one, provided the padded line still
/// fits `width` columns. Returns whether alignment was applied.
pub fn align_names<T>(jobs: &[Job<T>], width: u16) -> bool {
    let longest = max_name_len(jobs);
    if longest + STATUS_COLUMNS > usize::from(width) {
        return false;
    }
    for job in jobs {
        job.align_to(longest);
    }
    true
}

// ---------------------------------------------------------------------------
// Job lines
// ---------------------------------------------------------------------------

/// One status line: `Task <name> [<state>]`.
pub fn header<T>(job: &Job<T>, palette: &Palette) -> String {
    let mut line = format!("Task {} ", palette.cyan(&job.display_name()));
    match job.state() {
        JobState::Waiting => {
            line.push_str(&format!("[{}]", palette.bright_yellow("Waiting")));
        }
        JobState::Running => {
            line.push_str(&format!("[{}]", palette.bright_blue("Running")));
        }
        JobState::Finished if job.error().is_some() => {
            line.push_str(&format!("[{}]     ", palette.red("Fail")));
        }
        JobState::Finished => {
            line.push_str(&format!("[{}]     ", palette.green("Ok")));
        }
    }
    line
}

/// The full status block: one header per job, each ending in a newline.
pub fn status_block<T>(jobs: &[Job<T>], palette: &Palette) -> String {
    let mut block = String::new();
    for job in jobs {
        block.push_str(&header(job, palette));
        block.push('\n');
    }
    block
}

/// Bordered detail block for one job: its header, captured output and, if
/// it failed, the error text.
pub fn detail_block<T>(job: &Job<T>, palette: &Palette) -> String {
    let rule: String = std::iter::repeat(BOX_H).take(3).collect();
    let mut d = header(job, palette);
    d.push('\n');

    d.push_str(&format!("{}{} [{}]\n{}\n", BOX_L, rule, palette.blue("Output"), BOX_V));
    push_prefixed(&mut d, &job.output_lossy());

    if let Some(err) = job.error() {
        d.push_str(&format!("{}\n", BOX_V));
        d.push_str(&format!("{}{} [{}]\n{}\n", BOX_L, rule, palette.red("Error"), BOX_V));
        push_prefixed(&mut d, &err.to_string());
    }
    d.push_str(&format!("{}{}\n", BOX_BL, rule));
    d
}

fn push_prefixed(out: &mut String, text: &str) {
    for line in text.lines() {
        out.push_str(&format!("{}  {}\n", BOX_V, line));
    }
}

// ---------------------------------------------------------------------------
// Banners
// ---------------------------------------------------------------------------

/// Title box opening the detail section. `visible_len` is the title's width
/// without color codes.
fn banner(title: &str, visible_len: usize) -> String {
    let inner = visible_len + 4;
    let bar: String = std::iter::repeat(BOX_H).take(inner).collect();
    format!(
        "\n{}{}{}\n{}  {}  {}\n{}{}{}\n",
        BOX_TL, bar, BOX_TR, BOX_V, title, BOX_V, BOX_BL, bar, BOX_BR
    )
}

pub fn all_outputs_banner() -> String {
    banner("All outputs", "All outputs".len())
}

pub fn errors_banner(palette: &Palette) -> String {
    let title = format!("{} outputs", palette.red("Errors"));
    banner(&title, "Errors outputs".len())
}

/// Introductory line naming the worker count.
pub fn intro_line(workers: usize) -> String {
    format!("Running all tasks in parallel with {} workers ... ", workers)
}

/// Single batch glyph used by compact mode.
pub fn outcome_glyph(success: bool, palette: &Palette) -> String {
    if success {
        format!("[{}]", palette.green("Ok"))
    } else {
        format!("[{}]", palette.red("Fail"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn job(name: &str) -> Job<()> {
        Job::new(name, ())
    }

    fn finished(name: &str, output: &str, err: Option<&str>) -> Job<()> {
        let j = job(name);
        j.start();
        j.output().write_all(output.as_bytes()).unwrap();
        if let Some(e) = err {
            j.record_error(e.into());
        }
        j.finish();
        j
    }

    #[test]
    fn names_padded_when_terminal_is_wide_enough() {
        let jobs = vec![job("abc"), job("abcdefghij"), job("ab")];
        assert!(align_names(&jobs, 30));
        for j in &jobs {
            assert_eq!(j.display_name().len(), 10);
        }
        assert_eq!(jobs[0].display_name(), "abc       ");
    }

    #[test]
    fn names_untouched_when_terminal_is_narrow() {
        let jobs = vec![job("abc"), job("abcdefghij"), job("ab")];
        assert!(!align_names(&jobs, 29));
        assert_eq!(jobs[0].display_name(), "abc");
        assert_eq!(jobs[2].display_name(), "ab");
    }

    #[test]
    fn header_reflects_state() {
        let p = Palette::plain();
        let j = job("lint");
        assert_eq!(header(&j, &p), "Task lint [Waiting]");
        j.start();
        assert_eq!(header(&j, &p), "Task lint [Running]");
        j.finish();
        assert_eq!(header(&j, &p), "Task lint [Ok]     ");

        let bad = finished("test", "", Some("exit status: 1"));
        assert_eq!(header(&bad, &p), "Task test [Fail]     ");
    }

    #[test]
    fn header_colors_name_and_state() {
        let p = Palette::new(true);
        let j = job("x");
        assert_eq!(header(&j, &p), "Task \x1b[36mx\x1b[0m [\x1b[93mWaiting\x1b[0m]");
    }

    #[test]
    fn status_block_one_line_per_job() {
        let jobs = vec![job("a"), job("b")];
        let block = status_block(&jobs, &Palette::plain());
        assert_eq!(block, "Task a [Waiting]\nTask b [Waiting]\n");
    }

    #[test]
    fn detail_block_for_success() {
        let j = finished("build", "line one\r\nline two\n", None);
        let d = detail_block(&j, &Palette::plain());
        assert_eq!(
            d,
            "Task build [Ok]     \n\
             ├─── [Output]\n\
             │\n\
             │  line one\n\
             │  line two\n\
             └───\n"
        );
    }

    #[test]
    fn detail_block_for_failure_has_error_section() {
        let j = finished("test", "out\n", Some("exit status: 1\nsecond"));
        let d = detail_block(&j, &Palette::plain());
        assert_eq!(
            d,
            "Task test [Fail]     \n\
             ├─── [Output]\n\
             │\n\
             │  out\n\
             │\n\
             ├─── [Error]\n\
             │\n\
             │  exit status: 1\n\
             │  second\n\
             └───\n"
        );
    }

    #[test]
    fn banners_are_boxed() {
        assert_eq!(
            all_outputs_banner(),
            "\n┌───────────────┐\n│  All outputs  │\n└───────────────┘\n"
        );
        assert_eq!(
            errors_banner(&Palette::plain()),
            "\n┌──────────────────┐\n│  Errors outputs  │\n└──────────────────┘\n"
        );
    }

    #[test]
    fn outcome_glyphs() {
        let p = Palette::plain();
        assert_eq!(outcome_glyph(true, &p), "[Ok]");
        assert_eq!(outcome_glyph(false, &p), "[Fail]");
        assert_eq!(intro_line(4), "Running all tasks in parallel with 4 workers ... ");
    }
}
