// LogViewer - platform/mod.rs
//
// Platform abstraction layer: directories, config.toml, file reading.
// Dependencies: standard library, directories, toml, tokio::fs.
// Must NOT depend on: core, app.

pub mod config;
pub mod fs;
