//! Terminal message formatting.
//!
//! Regular output goes to stdout; warnings and errors go to stderr so
//! `--json` reports stay clean on stdout.
//!
//! # Examples
//!
//! ```
//! use pdfmill::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Procesando archivos...");
//! formatter.success("documento-unido.pdf");
//! formatter.error("Error al procesar los archivos PDF.");
//! ```

use std::io::{self, IsTerminal};

use crate::config::Config;

/// How much non-error output is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

/// Kind of message, deciding its marker, color and stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Plain status line.
    Info,
    /// Something was produced.
    Success,
    /// Something was skipped or needs attention.
    Warning,
    /// An operation failed.
    Error,
}

impl MessageLevel {
    fn marker(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "✓ ",
            Self::Warning => "⚠ ",
            Self::Error => "✗ ",
        }
    }

    fn ansi(self) -> Option<&'static str> {
        match self {
            Self::Info => None,
            Self::Success => Some("32"),
            Self::Warning => Some("33"),
            Self::Error => Some("31"),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }

    /// Lowest verbosity at which the level is printed.
    fn threshold(self) -> Verbosity {
        match self {
            Self::Info | Self::Success => Verbosity::Normal,
            Self::Warning | Self::Error => Verbosity::Quiet,
        }
    }
}

/// Prints user-facing messages according to the chosen verbosity.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    verbosity: Verbosity,
    colored: bool,
}

impl OutputFormatter {
    /// Create a formatter. `quiet` wins over `verbose`.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Self {
            verbosity,
            colored: color_enabled(),
        }
    }

    /// Formatter matching a run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.quiet, config.verbose)
    }

    /// Only warnings and errors.
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Everything, including details.
    pub fn verbose() -> Self {
        Self::new(false, true)
    }

    /// Disable ANSI colors regardless of the terminal.
    pub fn plain(mut self) -> Self {
        self.colored = false;
        self
    }

    /// The line printed for `message` at `level`.
    pub fn render(&self, level: MessageLevel, message: &str) -> String {
        let marker = level.marker();
        match level.ansi() {
            Some(code) if self.colored => format!("\x1b[{code}m{marker}{message}\x1b[0m"),
            _ => format!("{marker}{message}"),
        }
    }

    fn emit(&self, level: MessageLevel, message: &str) {
        if self.verbosity < level.threshold() {
            return;
        }
        let line = self.render(level, message);
        if level.to_stderr() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn raw(&self, min: Verbosity, line: std::fmt::Arguments<'_>) {
        if self.verbosity >= min {
            println!("{line}");
        }
    }

    /// Status line.
    pub fn info(&self, message: &str) {
        self.emit(MessageLevel::Info, message);
    }

    /// Produced-output line.
    pub fn success(&self, message: &str) {
        self.emit(MessageLevel::Success, message);
    }

    /// Warning, shown even when quiet.
    pub fn warning(&self, message: &str) {
        self.emit(MessageLevel::Warning, message);
    }

    /// Error, always shown.
    pub fn error(&self, message: &str) {
        self.emit(MessageLevel::Error, message);
    }

    /// Header preceded by an empty line.
    pub fn section(&self, title: &str) {
        self.raw(Verbosity::Normal, format_args!("\n{title}"));
    }

    /// `label: value` line, verbose only.
    pub fn detail(&self, label: &str, value: &str) {
        self.raw(Verbosity::Verbose, format_args!("  {label}: {value}"));
    }

    /// Numbered entry.
    pub fn list_item(&self, index: usize, message: &str) {
        self.raw(Verbosity::Normal, format_args!("  {index}. {message}"));
    }

    /// Empty line.
    pub fn blank_line(&self) {
        self.raw(Verbosity::Normal, format_args!(""));
    }

    /// Whether non-error output is shown.
    pub fn should_print(&self) -> bool {
        self.verbosity > Verbosity::Quiet
    }

    /// Whether details are shown.
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Whether only warnings and errors are shown.
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Colors only on a terminal with `TERM` set and `NO_COLOR` unset.
fn color_enabled() -> bool {
    io::stdout().is_terminal()
        && std::env::var_os("TERM").is_some()
        && std::env::var_os("NO_COLOR").is_none()
}
