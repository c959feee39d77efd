//! Shared types and utilities for spacegrid.
//!
//! This crate provides the engine configuration used by both the native
//! library and the CLI.

pub mod config;
pub mod schema;

pub use config::{
    ConfigError, DisplayConfig, DisplayGridOverride, EngineConfig, GridConfig, MAX_SPACES,
    MAX_SPACES_SEPARATE_DISPLAYS, WindowPlacement, config_paths, load_config,
    load_config_from_path, parse_config,
};
pub use schema::{generate_schema, generate_schema_json, print_schema};
