//! Operator-facing progress output.
//!
//! Progress and warnings go to stderr as plain lines; `--quiet` silences
//! progress but never warnings. Diagnostics for debugging go through the
//! `log` facade instead.

use std::fmt::Display;
use std::io::Write;

/// Writes one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; a closed stderr must not abort the install.
    }
}

/// Progress reporter shared by every pipeline stage.
pub struct Reporter<'a> {
    out: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> Reporter<'a> {
    /// Creates a reporter writing to `out`.
    pub fn new(out: &'a mut dyn Write, quiet: bool) -> Self {
        Self { out, quiet }
    }

    /// Reports a progress step unless quiet.
    pub fn step(&mut self, message: impl Display) {
        if !self.quiet {
            write_stderr_line(self.out, message);
        }
    }

    /// Shows operator guidance; shown even when quiet.
    pub fn advise(&mut self, message: impl Display) {
        write_stderr_line(self.out, message);
    }

    /// Reports a warning; shown even when quiet.
    pub fn warn(&mut self, message: impl Display) {
        log::warn!("{message}");
        write_stderr_line(self.out, format!("warning: {message}"));
    }
}
