//! Metapalettes - resolver for inheriting palette definitions
//!
//! This library provides functionality to:
//! - Load meta palette definitions (JSON/TOML) per table
//! - Resolve `extends` chains and legend/field directives into events
//! - Materialize the events into merged palettes

pub mod builder;
pub mod cli;
pub mod config;
pub mod definitions;
pub mod interpreter;
pub mod models;
pub mod resolver;
pub mod tokens;
