//! # Heron Server
//!
//! Request dispatch and the HTTP transport for the Heron framework.
//!
//! - [`Dispatcher`]: matches a request against the compiled routes, resolves
//!   arguments, invokes the handler and builds the response. Transport
//!   independent.
//! - [`Server`]: HTTP/1.1 over hyper, graceful shutdown on SIGINT/SIGTERM or a
//!   [`ShutdownSignal`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use heron_core::{compile, CompileOptions, Registry};
//! use heron_server::{Dispatcher, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = Registry::new();
//!     registry.register::<ItemController>();
//!     let routes = compile(&registry, CompileOptions::default())?;
//!
//!     Server::new(ServerConfig::default(), Dispatcher::new(routes))
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/heron-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatcher;
mod error;
mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_SHUTDOWN_TIMEOUT_SECS};
pub use dispatcher::{Dispatcher, JSON_CONTENT_TYPE};
pub use error::ServerError;
pub use server::{HttpResponse, Server};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
