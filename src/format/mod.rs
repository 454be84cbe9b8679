//! Snapshot exporters.

pub mod json;

pub use json::{as_json, to_string_pretty};
