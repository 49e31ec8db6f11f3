//! Typed configuration for Heron services.
//!
//! - TOML and JSON files, merged key by key over the defaults
//! - `PREFIX__SECTION__KEY` environment overrides, optionally from `.env`
//! - Unknown fields are errors, not silently ignored
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), heron_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("heron.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("HERON")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! max_connections = 1024
//! keep_alive = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! listen_addr = "0.0.0.0:9090"
//!
//! [routing]
//! reject_duplicate_routes = false
//! ```
//!
//! # Environment Overrides
//!
//! - `HERON__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `HERON__LOGGING__LEVEL=heron_server=debug`
//! - `HERON__ROUTING__REJECT_DUPLICATE_ROUTES=true`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
pub mod schema;

pub use config::HeronConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, MetricsSection, RoutingSection, ServerSection};
