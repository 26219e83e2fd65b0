//! Formprobe CLI library
//!
//! Argument parsing, config layering, live runs and terminal output for
//! the `formprobe` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)] // String building is clear and correct
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    CheckConfigArgs, Cli, ColorArg, Commands, MarkersArgs, MarkersFormat, ModeArg, RunArgs,
};
pub use config::{
    apply_run_args, describe_values, load_form_config, CliConfig, ColorChoice, Verbosity,
};
pub use error::{CliError, CliResult};
pub use output::{field_lines, render_markers, ProgressReporter};
pub use runner::{run_modes, run_session, verdict, TestRunner};
