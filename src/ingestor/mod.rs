//! Input side of the generator: locating and loading the intermediate JSON files

pub mod json_loader;

pub use json_loader::{InputSelection, JsonLoader, discover_input_files, newest_file};
