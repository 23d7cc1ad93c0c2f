// src/fetch/mod.rs

pub mod country;
pub mod indicator;

pub use country::fetch_country;
pub use indicator::{fetch_indicator, parse_envelope};
