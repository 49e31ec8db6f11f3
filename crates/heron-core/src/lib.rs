//! # Heron Core
//!
//! Component model, registry and route compiler for the Heron framework.
//!
//! - [`meta`] - descriptors for components, handler methods and parameters
//! - [`Component`] - the contract every registered type implements
//! - [`Registry`] - one shared instance per component type
//! - [`DiscoverySource`] - where component types come from
//! - [`compile`] - validates handler metadata and builds the routing table
//! - [`ResponseEntity`] / [`IntoReply`] - handler return values
//! - [`codec`] - JSON body encoding
//! - [`ConfigurationError`], [`ConversionError`], [`HandlerError`] - errors

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codec;
mod compiler;
mod component;
mod context;
mod discovery;
mod error;
pub mod meta;
mod registry;
mod response;
mod route;

pub use codec::CodecError;
pub use compiler::{compile, CompileOptions, RouteTable};
pub use component::{Argument, Arguments, Component, FromArgument};
pub use context::{RequestId, REQUEST_ID_HEADER};
pub use discovery::{ComponentRegistration, DiscoverySource, LinkedComponents, RegistrationList};
pub use error::{ConfigurationError, ConversionError, HandlerError, HandlerResult};
pub use registry::{Bean, Registry};
pub use response::{IntoReply, Reply, ResponseEntity};
pub use route::RouteDescriptor;

pub use heron_router::{Params, Verb};

#[doc(hidden)]
pub mod __private {
    pub use crate::discovery::register_default;
    pub use inventory;
}
