//! CLI configuration

use crate::commands::{Cli, RunArgs};
use crate::error::{CliError, CliResult};
use formprobe::{FormConfig, ValueSynthesizer};
use serde::{Deserialize, Serialize};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` / `-v` count onto a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default `tracing` filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn,formprobe=info",
            Self::Verbose => "info,formprobe=debug",
            Self::Debug => "debug,formprobe=trace",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Global CLI settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// JSON log lines
    pub log_json: bool,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed global flags
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new()
            .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
            .with_color(cli.color.clone().into())
            .with_log_json(cli.log_json)
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set JSON logging
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }
}

/// Load a form config file, or the defaults when no path is given
pub fn load_form_config(path: Option<&std::path::Path>) -> CliResult<FormConfig> {
    match path {
        Some(p) => FormConfig::from_file(p).map_err(|e| {
            CliError::config(format!("{}: {e}", p.display()))
        }),
        None => Ok(FormConfig::default()),
    }
}

/// Layer `run` flags over a file config; flags win
pub fn apply_run_args(mut config: FormConfig, args: &RunArgs) -> CliResult<FormConfig> {
    if let Some(url) = &args.url {
        config = config.with_url(url.clone());
    }
    if let Some(dir) = &args.artifacts {
        config = config.with_artifacts_dir(dir.clone());
    }
    if args.no_artifacts {
        config = config.without_artifacts();
    }
    let mut browser = config.browser.clone();
    if args.headed {
        browser = browser.with_headless(false);
    }
    if let Some(path) = &args.chromium {
        browser = browser.with_chromium_path(path.clone());
    }
    if args.no_sandbox {
        browser = browser.with_no_sandbox();
    }
    config = config.with_browser(browser);

    if config.url.as_deref().map_or(true, str::is_empty) {
        return Err(CliError::invalid_argument(
            "no form URL: pass one, set FORMPROBE_URL or add `url:` to the config",
        ));
    }
    config.validate().map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}

/// Values a config would synthesize, for display
#[must_use]
pub fn describe_values(values: &ValueSynthesizer) -> Vec<(&'static str, String)> {
    vec![
        ("email", values.email.clone()),
        ("text", values.text_template.clone()),
        ("number", values.number.clone()),
        ("paragraph", values.paragraph.clone()),
        ("other", values.other_text.clone()),
    ]
}
