//! Shared helper functions used across CLI subcommands.
//!
//! Includes tracing initialization, line input, hidden password input, and
//! the `Result: <message>` rendering used for every domain outcome.

use std::io::{self, BufRead, IsTerminal, Write};

use secdir_types::{DirectoryResult, ErrorCode};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// Logs go to stderr so interactive output on stdout stays clean.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Read one line without its terminator. `None` at end of input.
pub fn read_line(input: &mut dyn BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Write `prompt` and read the trimmed answer. `None` at end of input.
pub fn ask(input: &mut dyn BufRead, out: &mut dyn Write, prompt: &str) -> io::Result<Option<String>> {
    write!(out, "{prompt}")?;
    out.flush()?;
    Ok(read_line(input)?.map(|line| line.trim().to_owned()))
}

/// Read a password without echo when stdin is a terminal, or one line of
/// stdin otherwise.
pub fn read_password(prompt: &str) -> io::Result<String> {
    if io::stdin().is_terminal() {
        rpassword::prompt_password(prompt)
    } else {
        let mut stderr = io::stderr();
        write!(stderr, "{prompt}")?;
        stderr.flush()?;
        Ok(read_line(&mut io::stdin().lock())?.unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// `Result: <message>` for any directory outcome.
pub fn render<T>(result: &DirectoryResult<T>) -> String {
    format!("Result: {}", ErrorCode::of(result))
}
