//! Greek EPG to XMLTV generator
//!
//! Reads the intermediate JSON channel records written by the collectors,
//! assigns stable channel ids, derives programme stop times and writes an
//! XMLTV document (plus an optional national + Attica subset).

pub mod config;
pub mod errors;
pub mod exporter;
pub mod ingestor;
pub mod models;
pub mod registry;
pub mod schedule;
pub mod sources;
pub mod utils;
pub mod xmltv;
