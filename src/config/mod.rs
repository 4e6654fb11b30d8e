//! Configuration loading and validation
//!
//! Kumo is configured through a TOML file. Every setting has a default,
//! so a missing file is not an error.

mod parser;
mod types;
mod validation;

pub use parser::{load_config, load_config_or_default};
pub use types::{Config, CrawlerConfig, LiveSearchConfig, OutputConfig, SeedingConfig};
pub use validation::validate;
