pub mod clean;
pub mod config;
pub mod fetch;
pub mod locale;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod table;
pub mod views;
