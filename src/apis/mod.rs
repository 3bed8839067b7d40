//! Request-level plumbing for defaulting
//!
//! - `context` - annotations threaded through a defaulting call
//! - `object` - defaulting for untyped JSON objects, dispatched by apiVersion

pub mod context;
pub mod object;

pub use context::DefaultingContext;
pub use object::{default_object, DefaultingError};
