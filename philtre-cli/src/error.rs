//! CLI-specific error types with exit codes.
//!
//! Wraps library errors and maps every failure to a stable exit code.

use std::fmt;

use philtre::Error as LibError;

/// CLI-specific error type with exit code mapping.
#[derive(Debug)]
pub enum CliError {
    /// Library error (wrapped).
    Library(LibError),

    /// Invalid command-line arguments.
    InvalidArguments(String),

    /// I/O error.
    Io(std::io::Error),

    /// JSON serialization error.
    Serialization(serde_json::Error),
}

impl CliError {
    /// Get the appropriate exit code for this error.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 2: Library error (parse, merge, substitution, include)
    /// - 4: Invalid arguments
    /// - 5: I/O error
    /// - 6: Serialization error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Library(_) => 2,
            CliError::InvalidArguments(_) => 4,
            CliError::Io(_) => 5,
            CliError::Serialization(_) => 6,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => write!(f, "{e}"),
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
            CliError::Serialization(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<LibError> for CliError {
    fn from(err: LibError) -> Self {
        match err {
            LibError::Io(io) => CliError::Io(io),
            other => CliError::Library(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Serialization(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::InvalidArguments("bad".to_string()).exit_code(),
            4
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CliError::Io(io).exit_code(), 5);
    }

    #[test]
    fn test_library_error_conversion() {
        let err = CliError::from(LibError::Parse {
            message: "unexpected token".to_string(),
            location: " (line 1)".to_string(),
        });
        assert_eq!(err.exit_code(), 2);
        assert!(format!("{err}").contains("unexpected token"));
    }
}
