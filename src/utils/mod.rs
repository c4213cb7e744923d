//! Utility helpers shared across the generator
//!
//! - `time`: timezone resolution and XMLTV timestamp parsing/formatting
//! - `http_client`: thin reqwest wrapper used by the upstream collectors
//! - `atomic_file`: temp-file-and-rename replacement of output files

pub mod atomic_file;
pub mod http_client;
pub mod time;

pub use http_client::{HttpClient, StandardHttpClient};
