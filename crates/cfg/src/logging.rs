//! The logging configuration shared by every Packetframe process.

use camino::Utf8PathBuf;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The severity level at or above which a message is logged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

/// Where logged messages are sent.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    File(Utf8PathBuf),
    Syslog,
    Stdout,
    Stderr,
}

impl Default for LogTarget {
    fn default() -> Self {
        Self::Stderr
    }
}

impl LogTarget {
    /// Parse a `--log-target` flag value: `stderr`, `stdout`, `syslog`, or a file path.
    pub fn parse(value: &str) -> Self {
        match value {
            "stderr" => Self::Stderr,
            "stdout" => Self::Stdout,
            "syslog" => Self::Syslog,
            path => Self::File(Utf8PathBuf::from(path)),
        }
    }
}

/// The part of a process's configuration that controls its logging.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub target: LogTarget,

    /// Extra `tracing` directives, e.g. `"packetframe_edged::reconcile=debug"`.
    #[serde(default)]
    pub trace_targets: Vec<String>,
}

impl LoggingConfig {
    /// Apply a `--verbose` CLI flag on top of the configured level.
    ///
    /// Each occurrence of the flag lowers the severity threshold by one
    /// step, never past `trace`.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let mut level = self.level;
        for _ in 0..verbose {
            level = match level {
                LogLevel::Error => LogLevel::Warning,
                LogLevel::Warning => LogLevel::Info,
                LogLevel::Info => LogLevel::Debug,
                LogLevel::Debug | LogLevel::Trace => LogLevel::Trace,
            };
        }
        self.level = level;
        self
    }
}
