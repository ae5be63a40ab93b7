pub mod api;
pub mod common;
pub mod config;
pub mod store;

pub use config::CONFIG;
