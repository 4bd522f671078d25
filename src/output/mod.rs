//! Output formatting for bootstrap results.

mod json;

pub use json::{to_json, to_json_pretty};
