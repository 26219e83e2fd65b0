//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use formprobe::FillMode;
use std::path::PathBuf;

/// Formprobe: fill, submit and verify a rendered web form end to end
#[derive(Parser, Debug)]
#[command(name = "formprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fill, submit and verify a form
    Run(RunArgs),

    /// Print the marker table in effect
    Markers(MarkersArgs),

    /// Validate a configuration file
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Form URL (overrides the config file)
    #[arg(env = "FORMPROBE_URL")]
    pub url: Option<String>,

    /// Which fields to fill
    #[arg(short, long, default_value = "both")]
    pub mode: ModeArg,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for per-field failure screenshots
    #[arg(long, conflicts_with = "no_artifacts")]
    pub artifacts: Option<PathBuf>,

    /// Skip failure screenshots
    #[arg(long)]
    pub no_artifacts: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Path to the chromium binary
    #[arg(long)]
    pub chromium: Option<String>,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Write the JSON report here
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Print the JSON report to stdout instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Which fill pass(es) to run
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModeArg {
    /// Required fields only
    Required,
    /// Every field
    All,
    /// Required-only, then all fields on a fresh page
    #[default]
    Both,
}

impl ModeArg {
    /// Fill modes to run, in order
    #[must_use]
    pub fn modes(self) -> Vec<FillMode> {
        match self {
            Self::Required => vec![FillMode::RequiredOnly],
            Self::All => vec![FillMode::AllFields],
            Self::Both => vec![FillMode::RequiredOnly, FillMode::AllFields],
        }
    }
}

/// Arguments for the markers command
#[derive(Parser, Debug)]
pub struct MarkersArgs {
    /// YAML configuration file whose marker table to print
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: MarkersFormat,
}

/// Marker table output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkersFormat {
    /// Human-readable rule listing
    #[default]
    Text,
    /// YAML, loadable as the `markers:` section of a config
    Yaml,
    /// JSON
    Json,
}

/// Arguments for the check-config command
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    /// Configuration file to validate
    pub path: PathBuf,
}

/// Color choice argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
