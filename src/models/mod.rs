//! Data models for the diária request form.
//!
//! Field names serialize to camelCase so the browser form can post its state as-is.

mod finance;
mod history;
mod record;

pub use finance::*;
pub use history::*;
pub use record::*;
