use anyhow::{Context, Result};
use clap::Parser;
use emsrt::charts::{
    render_analysis_chart, render_trials_chart, render_waveform_chart, ANALYSIS_CHART_FILE_NAME,
    TRIALS_CHART_FILE_NAME, WAVEFORM_CHART_FILE_NAME,
};
use emsrt::cli::{AnalyzeArgs, Cli, Command, OutputFormat, WaveformArgs};
use emsrt::config::AnalysisConfig;
use emsrt::csv_output::{SummaryCsv, TrialsCsv, SUMMARY_FILE_NAME, TRIALS_FILE_NAME};
use emsrt::json_output::{JsonReport, REPORT_FILE_NAME};
use emsrt::pipeline::run_analysis;
use emsrt::report::render_report;
use emsrt::waveform::{generate_biphasic, WAVEFORM_FILE_NAME};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE, otherwise RUST_LOG (default warn)
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_output(dir: &Path, name: &str, content: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {}", path.display());
    Ok(())
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let base = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    let config = args.apply(base);
    config.validate()?;

    let outcome = run_analysis(&config)
        .with_context(|| format!("Analysis of {} failed", config.input_dir.display()))?;

    print!("{}", render_report(&outcome));
    println!();

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;
    write_output(
        &config.output_dir,
        SUMMARY_FILE_NAME,
        &SummaryCsv::from_results(&outcome.subjects).to_csv(),
    )?;
    write_output(
        &config.output_dir,
        TRIALS_FILE_NAME,
        &TrialsCsv::from_results(&outcome.subjects).to_csv(),
    )?;
    write_output(
        &config.output_dir,
        ANALYSIS_CHART_FILE_NAME,
        &render_analysis_chart(&outcome.subjects, &outcome.group)?,
    )?;
    write_output(
        &config.output_dir,
        TRIALS_CHART_FILE_NAME,
        &render_trials_chart(&outcome.subjects)?,
    )?;
    if args.format == OutputFormat::Json {
        let json = JsonReport::new(&outcome, &config).to_json()?;
        write_output(&config.output_dir, REPORT_FILE_NAME, &json)?;
    }

    Ok(())
}

fn run_waveform(args: &WaveformArgs) -> Result<()> {
    let config = args.to_config();
    config.validate().context("Invalid waveform parameters")?;

    let waveform = generate_biphasic(&config)?;
    println!("{}", waveform.summary(&config));
    println!("Net charge: {} (amplitude x samples)", waveform.net_charge()?);

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;
    write_output(&config.output_dir, WAVEFORM_FILE_NAME, &waveform.to_csv())?;
    write_output(
        &config.output_dir,
        WAVEFORM_CHART_FILE_NAME,
        &render_waveform_chart(&waveform, &config)?,
    )
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    match &args.command {
        Command::Analyze(analyze) => run_analyze(analyze),
        Command::Waveform(waveform) => run_waveform(waveform),
    }
}
