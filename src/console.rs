use crossterm::style::Stylize;
use log2::{error, info, warn};
use std::fmt::Display;

/// Severity of an operator facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Good,
    Warning,
    Error,
}

impl Severity {
    pub fn marker(self) -> &'static str {
        match self {
            Severity::Info => "[*]",
            Severity::Good => "[+]",
            Severity::Warning => "[!]",
            Severity::Error => "[-]",
        }
    }
}

/// Prints crawl progress and failures with a severity marker in front.
///
/// Whether markers are colored is decided once, when the console is built,
/// and the value is handed to whoever needs to report something.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    color: bool,
}

impl Console {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn format(&self, severity: Severity, message: impl Display) -> String {
        let marker = severity.marker();
        if !self.color {
            return format!("{} {}", marker, message);
        }
        let marker = match severity {
            Severity::Info => marker.blue(),
            Severity::Good => marker.green(),
            Severity::Warning => marker.yellow(),
            Severity::Error => marker.red(),
        };
        format!("{} {}", marker, message)
    }

    pub fn emit(&self, severity: Severity, message: impl Display) {
        let line = self.format(severity, message);
        match severity {
            Severity::Info | Severity::Good => info!("{}", line),
            Severity::Warning => warn!("{}", line),
            Severity::Error => error!("{}", line),
        }
    }

    pub fn info(&self, message: impl Display) {
        self.emit(Severity::Info, message);
    }

    pub fn good(&self, message: impl Display) {
        self.emit(Severity::Good, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Display) {
        self.emit(Severity::Error, message);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(true)
    }
}
