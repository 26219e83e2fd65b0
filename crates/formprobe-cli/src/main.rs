//! Formprobe CLI: fill, submit and verify a rendered web form
//!
//! ## Usage
//!
//! ```bash
//! formprobe run http://localhost:3000/embed/form/abc        # both passes
//! formprobe run <url> --mode required --report out/run.json
//! formprobe markers --format yaml > markers.yaml
//! formprobe check-config formprobe.yaml
//! ```

use clap::Parser;
use formprobe::{FormConfig, FormError};
use formprobe_cli::{
    apply_run_args, describe_values, load_form_config, render_markers, verdict, CheckConfigArgs,
    Cli, CliConfig, CliResult, Commands, MarkersArgs, MarkersFormat, ProgressReporter,
    RunArgs, TestRunner,
};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    init_tracing(&config);

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.filter_directive()));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(config.color.should_color())
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn run(command: Commands, config: &CliConfig) -> CliResult<()> {
    match command {
        Commands::Run(args) => run_forms(config, &args),
        Commands::Markers(args) => run_markers(&args),
        Commands::CheckConfig(args) => run_check_config(config, &args),
    }
}

fn run_forms(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let form_config = apply_run_args(load_form_config(args.config.as_deref())?, args)?;
    let runner = TestRunner::new(form_config, args.mode.modes());
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let rt = tokio::runtime::Runtime::new()?;
    let reports = rt.block_on(runner.run())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports).map_err(FormError::from)?);
    } else {
        for report in &reports {
            reporter.run_report(report);
        }
    }

    if let Some(path) = &args.report {
        write_reports(path, &reports)?;
        reporter.info(&format!("report written to {}", path.display()));
    }
    verdict(&reports)
}

/// One report is written as-is; several go into `<stem>-<mode>.json` siblings
fn write_reports(path: &std::path::Path, reports: &[formprobe::RunReport]) -> CliResult<()> {
    if let [single] = reports {
        single.write_json(path)?;
        return Ok(());
    }
    let stem = path
        .file_stem()
        .map_or_else(|| "report".to_string(), |s| s.to_string_lossy().into_owned());
    for report in reports {
        let file = path.with_file_name(format!("{stem}-{}.json", report.fill.mode));
        report.write_json(&file)?;
    }
    Ok(())
}

fn run_markers(args: &MarkersArgs) -> CliResult<()> {
    let form_config = load_form_config(args.config.as_deref())?;
    let markers = &form_config.markers;
    match args.format {
        MarkersFormat::Text => print!("{}", render_markers(markers)),
        MarkersFormat::Yaml => print!(
            "{}",
            serde_yaml_ng::to_string(markers).map_err(FormError::from)?
        ),
        MarkersFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(markers).map_err(FormError::from)?
        ),
    }
    Ok(())
}

fn run_check_config(config: &CliConfig, args: &CheckConfigArgs) -> CliResult<()> {
    let form_config: FormConfig = load_form_config(Some(&args.path))?;
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.success(&format!(
        "{}: {} rules, {} submit controls, {} success signals",
        args.path.display(),
        form_config.markers.rules.len(),
        form_config.markers.submit_controls.len(),
        form_config.markers.success_signals.len()
    ));
    if config.verbosity.is_verbose() {
        for (name, value) in describe_values(&form_config.values) {
            reporter.info(&format!("{name}: {value}"));
        }
    }
    Ok(())
}
