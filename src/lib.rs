//! Update Cursor Library
//!
//! Keeps a "current version" symlink in sync with the newest Cursor AppImage.
//! The remote version is read from the release URL's redirect target,
//! downloads are streamed to a temporary file and renamed into place, and
//! every change is recorded in an append-only ledger.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
