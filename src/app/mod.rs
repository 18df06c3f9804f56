// LogViewer - app/mod.rs
//
// Application layer: persistence, upload, and multi-file session
// orchestration.
// Dependencies: core, platform, util layers.

pub mod ingest;
pub mod session;
pub mod state;
pub mod store;
