//! # Heron Extract
//!
//! Turns a matched request into handler arguments.
//!
//! [`resolve`] walks a handler's parameter descriptors and produces the
//! ordered [`Arguments`](heron_core::Arguments) for the call: path variables
//! are converted to their declared scalar kind with [`convert`], body
//! parameters are decoded from JSON, and unmarked parameters receive an
//! absent value.
//!
//! | kind | accepted literal |
//! |------|------------------|
//! | `String` | any segment |
//! | `i32` / `i64` | signed decimal |
//! | `bool` | exactly `true` or `false` |
//!
//! Anything else fails with a
//! [`ConversionError`](heron_core::ConversionError), which the dispatcher
//! reports as a 500.

#![doc(html_root_url = "https://docs.rs/heron-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod convert;
mod resolver;

pub use convert::convert;
pub use resolver::resolve;
