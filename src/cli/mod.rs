//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting and the app runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod presenter;

// Re-export commonly used types
pub use app::{
    load_merged_config, run_encode, run_probe, run_record, RunOptions, EXIT_ERROR,
    EXIT_REJECTED, EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction};
pub use presenter::Presenter;
