// LogViewer - lib.rs
//
// Library entry point. A host (desktop shell, web backend, CLI) constructs
// a store, resolves configuration, and drives a `Session`; rendering is
// left to the host.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;

pub use app::session::{Alignment, Session, SessionConfig};
pub use app::store::{FileStore, LogStore, MemoryStore};
pub use core::model::{LogRecord, ReferenceDate, Severity};
pub use util::error::LogViewerError;
