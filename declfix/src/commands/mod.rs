//! Commands module - CLI command implementations.
//!
//! This module contains the fix orchestrator and the `init` subcommand.

mod fix;
mod init;

// Re-export all public items
pub use fix::{run_fix, FixOptions, FixResult, FixStatus};
pub use init::{run_init, run_init_in};
