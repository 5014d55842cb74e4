//! Configuration module for the mpal tool
//!
//! Provides types, discovery and loading for `mpal.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
