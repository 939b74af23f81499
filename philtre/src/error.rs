//! Error types for the philtre library.
//!
//! This module provides the error hierarchy for all operations in the
//! philtre library, using `thiserror` for ergonomic error handling.
//! Every variant that can be traced to source text carries a location
//! string of the form ` (file "x.phil", line 3)`.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a philtre error.
///
/// # Examples
///
/// ```
/// use philtre::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(42)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the philtre library.
///
/// The variants map one-to-one onto the error kinds of the language:
/// schema errors, type declaration errors, merge incompatibilities,
/// substitution errors, include errors, and parse errors, plus I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// A structural schema violation (reserved identifier, duplicate
    /// non-multiple sibling names, invalid attribute value, ...).
    #[error("schema error: {message}{location}")]
    Schema {
        /// A description of the violation.
        message: String,
        /// The offending source location, possibly empty.
        location: String,
    },

    /// A `.type=` or `.call=` expression could not be resolved or
    /// constructed.
    #[error("error in type declaration \"{expression}\": {message}{location}")]
    TypeDeclaration {
        /// The offending (normalized, where possible) call expression.
        expression: String,
        /// What went wrong while resolving or constructing it.
        message: String,
        /// The offending source location, possibly empty.
        location: String,
    },

    /// A definition was fetched against a scope or vice versa.
    #[error(
        "incompatible parameter objects: {master_kind} \"{master}\"{master_location} \
         vs. {source_kind} \"{source_path}\"{source_location}"
    )]
    Incompatible {
        /// Kind of the master object (`definition` or `scope`).
        master_kind: &'static str,
        /// Name of the master object.
        master: String,
        /// Source location of the master object.
        master_location: String,
        /// Kind of the source object.
        source_kind: &'static str,
        /// Name of the source object.
        source_path: String,
        /// Source location of the source object.
        source_location: String,
    },

    /// A `$variable` reference could not be resolved anywhere.
    #[error("undefined variable: ${name}{location}")]
    UndefinedVariable {
        /// The unresolved variable name.
        name: String,
        /// The location of the reference.
        location: String,
    },

    /// Malformed `$...` substitution syntax.
    #[error("substitution error: {message}{location}")]
    Substitution {
        /// A description of the syntax problem.
        message: String,
        /// The location of the malformed reference.
        location: String,
    },

    /// An `include` directive failed (bad arguments, unresolvable target,
    /// missing narrowing path).
    #[error("include error: {message}{location}")]
    Include {
        /// A description of the failure.
        message: String,
        /// The location of the include directive.
        location: String,
    },

    /// A file included itself, directly or indirectly.
    #[error("include dependency cycle: {}", format_cycle(.chain))]
    IncludeCycle {
        /// The chain of open include files, ending with the re-entered one.
        chain: Vec<PathBuf>,
    },

    /// Raw source text could not be parsed into a tree.
    #[error("parse error: {message}{location}")]
    Parse {
        /// A description of the syntax problem.
        message: String,
        /// The location of the offending token.
        location: String,
    },

    /// A typed value could not be converted to or from its word form.
    #[error("{message}{location}")]
    Conversion {
        /// A description of the conversion failure, including the
        /// parameter path where available.
        message: String,
        /// The location of the offending value.
        location: String,
    },

    /// An I/O error occurred (reading an included or top-level file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_cycle(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Check if this error is an include dependency cycle.
    ///
    /// # Examples
    ///
    /// ```
    /// use philtre::Error;
    /// use std::path::PathBuf;
    ///
    /// let err = Error::IncludeCycle { chain: vec![PathBuf::from("a.phil")] };
    /// assert!(err.is_include_cycle());
    /// ```
    #[must_use]
    pub fn is_include_cycle(&self) -> bool {
        matches!(self, Self::IncludeCycle { .. })
    }

    /// Check if this error is an undefined-variable error.
    #[must_use]
    pub fn is_undefined_variable(&self) -> bool {
        matches!(self, Self::UndefinedVariable { .. })
    }

    /// Check if this error reports incompatible parameter objects.
    #[must_use]
    pub fn is_incompatible(&self) -> bool {
        matches!(self, Self::Incompatible { .. })
    }
}
