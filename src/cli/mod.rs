//! Command-line interface components
//!
//! This module contains CLI-specific code for Update Cursor, including
//! argument parsing, progress display, and the command handlers.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, GlobalArgs, SwitchArgs};
pub use commands::{
    build_updater, dispatch, handle_check, handle_force, handle_list, handle_switch,
    handle_update, render_ledger,
};
pub use progress::DownloadProgress;
