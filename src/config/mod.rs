//! Configuration module for richstyle
//!
//! This module handles the style vocabulary and conflict rules, including
//! serialization to/from JSON or TOML and persistent storage in
//! platform-specific directories.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
