//! Layered option sources and JSON-Schema generation for option types.
//!
//! - [`source`]: flatten nested documents into dotted keys, merge sources
//!   with precedence, rebuild and decode the merged document.
//! - [`schema`]: compile type descriptions into JSON-Schema with shared
//!   `$defs`.

pub mod cli;
pub mod error;
pub mod format;
pub mod logging;
pub mod schema;
pub mod source;

pub use error::{OptionError, Result};
