#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # philtre
//!
//! A hierarchical, schema-driven parameter language: masters declare a
//! tree of typed parameters with defaults, users override them with the
//! same syntax, and fetching reconciles the two into a tree shaped
//! exactly like the master.
//!
//! ## Core Types
//!
//! - [`Session`]: arena owning every parsed tree, plus the converter
//!   registry and symbol resolver
//! - [`Word`] and [`Quote`]: atomic values with quoting and location
//! - [`Value`], [`ScopeExtract`], and [`ExtractList`]: the plain value
//!   graph produced by extraction
//! - [`FetchOptions`] and [`Fetched`]: merge/diff control and results
//! - [`Error`] and [`Result`]: error handling types
//!
//! ## Examples
//!
//! ```
//! use philtre::{FetchOptions, Session, Value};
//!
//! let mut session = Session::new();
//! let master = session
//!     .parse("count = 1\n  .type = int", None)
//!     .unwrap();
//! let user = session.parse("count = 42", None).unwrap();
//! let fetched = session
//!     .fetch(master, &[user], &FetchOptions::default())
//!     .unwrap();
//! let values = session.extract(fetched.root).unwrap();
//! assert_eq!(values.get("count"), Some(&Value::Int(42)));
//! ```

pub mod error;
pub mod extract;
pub mod fetch;
pub mod include;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod substitute;
pub mod symbols;
pub mod token;
pub mod tree;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use extract::{ExtractList, ScopeExtract, Value};
pub use fetch::{FetchOptions, Fetched, ObjectLocator};
pub use logging::{init_logger, LogLevel, Logger};
pub use symbols::{IncludeTarget, NullResolver, SymbolResolver};
pub use token::{Quote, Word};
pub use tree::show::ShowOptions;
pub use tree::{DefinitionView, NodeId, Session};
pub use types::{
    CallArgs, CallProxy, CallSpec, Converter, ConverterFactory, ConverterRegistry, Literal,
    ScopeCall, TypeSpec,
};
