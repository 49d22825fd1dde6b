//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the chronicle binary.

mod commands;
mod records;
mod run;
mod session;

pub use commands::{Cli, Commands};
pub use records::{LifecycleAction, lifecycle, list, print_config, show, versions};
pub use run::{StepArgs, run_step, submit};
pub use session::Session;
