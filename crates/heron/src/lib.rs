//! # Heron
//!
//! **A minimal controller-based HTTP framework.**
//!
//! Controllers are plain structs whose annotated methods become routes:
//!
//! - `#[controller(path = "/base")]` on an impl block, verb markers on methods
//! - `#[path_variable]` and `#[request_body]` on parameters
//! - return text, any `Display` value, a [`ResponseEntity`], or a `Result`
//!
//! Startup validates every mapping; a bad one stops the service with a
//! [`ConfigurationError`]. At runtime an unmatched request gets 404 and any
//! failure gets 500, both with an empty body.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use heron::prelude::*;
//!
//! #[derive(Default)]
//! struct GreetingController;
//!
//! #[controller(path = "/greet", crate = "heron::core")]
//! impl GreetingController {
//!     #[get("/{name}")]
//!     fn hello(&self, #[path_variable] name: String) -> String {
//!         format!("hello {name}")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BootError> {
//!     Application::from_env()?
//!         .component::<GreetingController>()
//!         .run()
//!         .await
//! }
//! ```
//!
//! The macros refer to `::heron_core` by default. When depending on `heron`
//! alone, pass `crate = "heron::core"` as above.
//!
//! ## Pipeline
//!
//! ```text
//! discovery → Registry → compile → RouteTable
//!                                     ↓
//! request → match → resolve arguments → invoke → reply → response
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;

pub use application::{compile_options, server_config, telemetry_config, Application, BootError};

pub use heron_config as config;
pub use heron_core as core;
pub use heron_extract as extract;
pub use heron_router as router;
pub use heron_server as server;
pub use heron_telemetry as telemetry;

pub use heron_core::{
    ConfigurationError, ConversionError, HandlerError, LinkedComponents, RegistrationList,
    ResponseEntity,
};
pub use heron_macros::{component, controller};

/// Everything a controller module usually needs.
///
/// ```rust,ignore
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Application, BootError};
    pub use heron_core::{
        Component, DiscoverySource, HandlerError, HandlerResult, LinkedComponents,
        RegistrationList, ResponseEntity,
    };
    pub use heron_macros::{component, controller};
    pub use heron_server::ShutdownSignal;
}
