//! Logging infrastructure for the philtre library.
//!
//! A simple stderr-based logger with configurable verbosity. Installing
//! it via [`init_logger`] also routes `log` macro output from the
//! library (deprecation warnings during fetch) to the same sink.

use std::env;
use std::fmt;

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose
/// (Verbose).
///
/// # Examples
///
/// ```
/// use philtre::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress all non-essential output.
    Quiet,
    /// Normal output level (errors and warnings).
    Normal,
    /// Verbose output (errors, warnings, info, and debug messages).
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use philtre::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }
}

/// A simple stderr-based logger.
///
/// # Examples
///
/// ```
/// use philtre::{LogLevel, Logger};
///
/// let logger = Logger::new(LogLevel::Normal);
/// logger.error("this is an error message");
/// logger.info("this will not be printed (requires Verbose)");
/// ```
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    /// Creates a new logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Logs an error message.
    pub fn error(&self, message: &str) {
        if self.level >= LogLevel::Normal {
            eprintln!("ERROR: {message}");
        }
    }

    /// Logs a warning message.
    pub fn warn(&self, message: &str) {
        if self.level >= LogLevel::Normal {
            eprintln!("WARN: {message}");
        }
    }

    /// Logs an informational message (Verbose only).
    pub fn info(&self, message: &str) {
        if self.level >= LogLevel::Verbose {
            eprintln!("INFO: {message}");
        }
    }

    /// Logs a debug message (Verbose only).
    pub fn debug(&self, message: &str) {
        if self.level >= LogLevel::Verbose {
            eprintln!("DEBUG: {message}");
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        match metadata.level() {
            log::Level::Error | log::Level::Warn => self.level >= LogLevel::Normal,
            _ => self.level >= LogLevel::Verbose,
        }
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Initializes a logger based on environment variables and CLI flags.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet, verbose winning when both are set)
/// 2. `PHILTRE_LOG_MODE` environment variable
/// 3. Default (Normal)
///
/// The returned logger is for direct use; a copy is also installed as
/// the global `log` sink so library warnings surface on stderr. A
/// second initialization keeps the first sink.
///
/// # Examples
///
/// ```
/// use philtre::init_logger;
///
/// let logger = init_logger(false, true);
/// logger.error("not printed in quiet mode");
/// ```
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool) -> Logger {
    let level = if verbose {
        LogLevel::Verbose
    } else if quiet {
        LogLevel::Quiet
    } else {
        env::var("PHILTRE_LOG_MODE")
            .ok()
            .and_then(|value| LogLevel::parse(&value).ok())
            .unwrap_or(LogLevel::Normal)
    };
    if log::set_boxed_logger(Box::new(Logger::new(level))).is_ok() {
        log::set_max_level(match level {
            LogLevel::Quiet => log::LevelFilter::Off,
            LogLevel::Normal => log::LevelFilter::Warn,
            LogLevel::Verbose => log::LevelFilter::Debug,
        });
    }
    Logger::new(level)
}
