//! Attribute macros for declaring Heron controllers and components.
//!
//! `#[controller]` goes on an inherent impl block. Methods carrying a verb
//! marker become handlers; their parameters carry binding markers. The
//! macro implements `heron_core::Component` for the type, so the descriptor
//! the route compiler reads is generated from the same source as the code it
//! calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_core::{HandlerError, ResponseEntity};
//! use heron_macros::controller;
//!
//! #[derive(Default)]
//! struct ItemController;
//!
//! #[controller(path = "/items", scan)]
//! impl ItemController {
//!     #[get("/{id}")]
//!     fn show(&self, #[path_variable] id: i64) -> String {
//!         format!("item {id}")
//!     }
//!
//!     #[post]
//!     fn create(&self, #[request_body] item: NewItem) -> Result<ResponseEntity<Item>, HandlerError> {
//!         // ...
//!     }
//! }
//! ```
//!
//! # Markers
//!
//! | marker | on | meaning |
//! |---|---|---|
//! | `#[get]`, `#[post]`, `#[put]`, `#[patch]`, `#[delete]` | method | verb, optional path |
//! | `#[request_mapping(method = "GET", path = "/p")]` | method | explicit verb |
//! | `#[path_variable]`, `#[path_variable("name")]` | parameter | bind a path variable |
//! | `#[request_body]` | parameter | decode the JSON body |
//!
//! Unmarked parameters must be `Option<T>` and always receive `None`.
//!
//! # Arguments
//!
//! - `path = "/base"`: base path for every handler
//! - `scan`: submit the type for link-time discovery (`LinkedComponents`)
//! - `crate = "path"`: path to `heron_core` when it is re-exported

mod expand;
mod parse;

use proc_macro::TokenStream;

use crate::expand::Stereotype;

/// Declares a controller: a component whose mapped methods become routes.
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand(Stereotype::Controller, attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Declares a plain component.
///
/// Accepts the same arguments as [`macro@controller`].
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand::expand(Stereotype::Component, attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn misplaced(marker: &str, item: TokenStream) -> TokenStream {
    let message = format!("`#[{marker}]` is only valid on methods inside a `#[controller]` impl block");
    let error = syn::Error::new(proc_macro2::Span::call_site(), message).to_compile_error();
    let item = proc_macro2::TokenStream::from(item);
    quote::quote!(#error #item).into()
}

/// Maps a method to GET. Only valid inside `#[controller]`.
#[proc_macro_attribute]
pub fn get(_attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("get", item)
}

/// Maps a method to POST. Only valid inside `#[controller]`.
#[proc_macro_attribute]
pub fn post(_attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("post", item)
}

/// Maps a method to PUT. Only valid inside `#[controller]`.
#[proc_macro_attribute]
pub fn put(_attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("put", item)
}

/// Maps a method to PATCH. Only valid inside `#[controller]`.
#[proc_macro_attribute]
pub fn patch(_attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("patch", item)
}

/// Maps a method to DELETE. Only valid inside `#[controller]`.
#[proc_macro_attribute]
pub fn delete(_attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("delete", item)
}

/// Maps a method to an explicit verb. Only valid inside `#[controller]`.
#[proc_macro_attribute]
pub fn request_mapping(_attr: TokenStream, item: TokenStream) -> TokenStream {
    misplaced("request_mapping", item)
}
