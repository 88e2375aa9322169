/// Structured logging for the cold-chain dashboard
///
/// Backs the `log` facade with a logger that tags every entry with the
/// component that produced it (the log target), stamps it in UTC, and can
/// mirror entries to an append-only file. Console output goes to stderr and
/// is terse unless timestamps are requested.

use chrono::Utc;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::ColdChainError;

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the room has no log yet or the page has no rows
    Expected,
    /// Unexpected failure - the data on disk is malformed or unreadable
    Unexpected,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

/// Classify a load or aggregation failure
pub fn classify_failure(err: &ColdChainError) -> FailureType {
    match err {
        // A room without a log is a normal "no data" state for the presenter
        ColdChainError::SourceNotFound(_) | ColdChainError::EmptyTable => FailureType::Expected,
        _ => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

static LOGGER: DashboardLogger = DashboardLogger {
    config: Mutex::new(None),
};

#[derive(Debug, Clone)]
struct LoggerConfig {
    /// Minimum log level to display
    min_level: LevelFilter,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

pub struct DashboardLogger {
    config: Mutex<Option<LoggerConfig>>,
}

impl DashboardLogger {
    fn snapshot(&self) -> Option<LoggerConfig> {
        self.config.lock().ok().and_then(|guard| guard.clone())
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

impl Log for DashboardLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.snapshot()
            .map(|c| metadata.level() <= c.min_level)
            .unwrap_or(false)
    }

    fn log(&self, record: &Record<'_>) {
        let Some(config) = self.snapshot() else {
            return;
        };
        if record.level() > config.min_level {
            return;
        }

        let entry = format_entry(record.level(), record.target(), &record.args().to_string());

        // Console output is stderr only; stdout belongs to the rendered page.
        if config.console_timestamps {
            eprintln!("{}", entry);
        } else if let Some(line) =
            console_line(record.level(), record.target(), &record.args().to_string())
        {
            eprintln!("{}", line);
        }

        if let Some(ref path) = config.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn flush(&self) {}
}

/// Terse console form; debug and trace are skipped without timestamps.
fn console_line(level: Level, target: &str, message: &str) -> Option<String> {
    match level {
        Level::Error => Some(format!("   ✗ {}: {}", target, message)),
        Level::Warn => Some(format!("   ⚠ {}: {}", target, message)),
        Level::Info => Some(format!("   {}", message)),
        Level::Debug | Level::Trace => None,
    }
}

/// `<utc stamp> <LEVEL> <target>: <message>`, as written to the log file.
fn format_entry(level: Level, target: &str, message: &str) -> String {
    format!(
        "{} {:<5} {}: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        level,
        target,
        message
    )
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
///
/// Safe to call more than once: later calls replace the configuration.
pub fn init_logger(min_level: LevelFilter, log_file: Option<&str>, console_timestamps: bool) {
    if let Ok(mut guard) = LOGGER.config.lock() {
        *guard = Some(LoggerConfig {
            min_level,
            log_file: log_file.map(String::from),
            console_timestamps,
        });
    }
    // Fails only if another logger is already installed; keep that one.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(min_level);
}

/// Parse a level name from configuration ("debug", "info", "warn", ...)
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a load/aggregation failure with automatic classification
pub fn log_load_failure(source_id: &str, operation: &str, err: &ColdChainError) {
    let failure_type = classify_failure(err);
    let message = format!("{} {} failed [{}]: {}", operation, source_id, failure_type, err);

    match failure_type {
        FailureType::Expected => log::warn!(target: "source", "{}", message),
        FailureType::Unexpected => log::error!(target: "source", "{}", message),
    }
}

/// Log a summary of the sources a page render touched
pub fn log_render_summary(page: &str, total: usize, successful: usize, failed: usize) {
    let message = format!(
        "{} rendered: {}/{} sources loaded, {} failed",
        page, successful, total, failed
    );

    if failed == 0 {
        log::info!(target: "dashboard", "{}", message);
    } else if successful == 0 {
        log::error!(target: "dashboard", "{}", message);
    } else {
        log::warn!(target: "dashboard", "{}", message);
    }
}
