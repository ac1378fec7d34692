//! blogit/crates/blogit-core/src/lib.rs
//!
//! The blog post model and the plugin contracts of the Blogit engine.

pub mod accessors;
pub mod blogger;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod service;
pub mod tags;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use blogger::*;
pub use config::*;
pub use error::*;
pub use models::*;
pub use query::*;
pub use service::*;
pub use tags::*;
pub use traits::*;
