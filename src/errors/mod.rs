//! Centralized error handling for the XMLTV generator
//!
//! The conversion core is deliberately forgiving: unreadable inputs, malformed
//! JSON and stale identity caches are logged and degraded rather than raised.
//! The types here cover the paths that do surface to the caller.
//!
//! # Error Categories
//!
//! - **I/O Errors**: reading configuration, writing the output document
//! - **Serialization Errors**: JSON encoding/decoding at the file boundary
//! - **Source Errors**: upstream collector connectivity and payload problems
//! - **Configuration Errors**: invalid settings (timezone, times, filters)
//!
//! # Usage
//!
//! ```rust
//! use greek_xmltv::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for collector Results
pub type SourceResult<T> = Result<T, SourceError>;
