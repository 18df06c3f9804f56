// LogViewer - core/mod.rs
//
// Core business logic layer: record model, parsing, ordering and
// alignment, filtering and search.
// Must NOT depend on: platform, app, or any I/O crate directly.

pub mod aligner;
pub mod filter;
pub mod model;
pub mod parser;
pub mod search;
