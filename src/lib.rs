pub mod config;
pub mod continuity;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod rules;
pub mod types;
pub mod util;
