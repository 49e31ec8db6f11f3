//! Path templates and a first-match routing table for Heron.
//!
//! Templates are compiled once into anchored matchers. A [`RoutingTable`]
//! keeps routes in registration order and resolves a request by scanning the
//! routes for its verb, returning the first whose template matches the whole
//! path together with the captured variable bindings.
//!
//! # Example
//!
//! ```rust
//! use heron_router::{PathTemplate, RoutingTable, Verb};
//!
//! let mut table = RoutingTable::new();
//! table.insert(Verb::Get, PathTemplate::parse("/users").unwrap(), "listUsers");
//! table.insert(Verb::Get, PathTemplate::parse("/users/{id}").unwrap(), "getUser");
//!
//! let found = table.match_route(Verb::Get, "/users/123").unwrap();
//! assert_eq!(*found.target(), "getUser");
//! assert_eq!(found.params.get("id"), Some("123"));
//! ```
//!
//! # Template Syntax
//!
//! ```text
//! /orgs/{org}/users/{id}
//!  ^^^^  ^^^^^ ^^^^^ ^^^^
//!  lit   var   lit   var      var = ([^/]+), anchored at both ends
//! ```

#![doc(html_root_url = "https://docs.rs/heron-router/0.1.0")]
#![forbid(unsafe_code)]

mod params;
mod table;
pub mod template;
mod verb;

pub use params::Params;
pub use table::{Route, RouteMatch, RoutingTable};
pub use template::{PathTemplate, TemplateError};
pub use verb::{UnknownVerb, Verb};
