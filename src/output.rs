//! Terminal output for the ecldeck CLI.
//!
//! Cargo-style status lines with right-aligned coloured verbs go to
//! stderr. Stdout is reserved for deck text and JSON.

use std::io::{self, IsTerminal, Write};

use crate::context::{Diagnostic, Diagnostics, Severity};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Width for right-aligned verb column.
const VERB_WIDTH: usize = 12;

/// Terminal-aware status printer.
///
/// Colour is enabled when stderr is a terminal.
pub struct Printer {
    color: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal(),
        }
    }

    /// e.g. "     Parsing CASE.DATA"
    pub fn status(&self, verb: &str, message: &str) {
        self.print_line(GREEN, verb, message);
    }

    pub fn info(&self, verb: &str, message: &str) {
        self.print_line(CYAN, verb, message);
    }

    pub fn warning(&self, verb: &str, message: &str) {
        self.print_line(YELLOW, verb, message);
    }

    pub fn error(&self, verb: &str, message: &str) {
        self.print_line(RED, verb, message);
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// One diagnostic as `warning[unknown-keyword]: message`, with its
    /// location and help on following lines.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        let (label, color) = match diagnostic.severity {
            Severity::Error => ("error", RED),
            Severity::Warning => ("warning", YELLOW),
        };
        let head = if self.color {
            format!("{BOLD}{color}{label}{RESET}")
        } else {
            label.to_string()
        };

        let mut stderr = io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{}[{}]: {}",
            head,
            diagnostic.kind.code(),
            diagnostic.message
        );
        if let Some(location) = &diagnostic.location {
            let keyword = diagnostic
                .keyword
                .as_deref()
                .map(|k| format!(" ({})", k))
                .unwrap_or_default();
            let _ = writeln!(stderr, "  {} {}{}", self.dim("-->"), location, keyword);
        }
        if let Some(help) = &diagnostic.help {
            let _ = writeln!(stderr, "  {} {}", self.dim("help:"), help);
        }
    }

    pub fn diagnostics(&self, diagnostics: &Diagnostics) {
        for diagnostic in diagnostics.iter() {
            self.diagnostic(diagnostic);
        }
    }

    fn print_line(&self, color: &str, verb: &str, message: &str) {
        let mut stderr = io::stderr().lock();
        if self.color {
            let _ = writeln!(
                stderr,
                "{BOLD}{color}{verb:>VERB_WIDTH$}{RESET} {message}"
            );
        } else {
            let _ = writeln!(stderr, "{verb:>VERB_WIDTH$} {message}");
        }
    }
}

/// Pluralize a count: `plural(1, "keyword", "keywords")` gives "1 keyword".
pub fn plural(n: usize, singular: &str, pluralized: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, pluralized)
    }
}

/// Return a relative display path when possible, absolute otherwise.
pub fn display_path(path: &std::path::Path) -> String {
    if let Ok(cwd) = std::env::current_dir() {
        if let Ok(relative) = path.strip_prefix(&cwd) {
            let s = relative.display().to_string();
            if s.is_empty() {
                return ".".to_string();
            }
            return s;
        }
    }
    path.display().to_string()
}
