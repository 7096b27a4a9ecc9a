//! CLI entry point for the preparation pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use quarterline::{Pipeline, PrepConfig, RunResult, SheetLayout};
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Quarterly cleaning and alignment for housing and unemployment series",
    long_about = "Loads a housing sheet and an unemployment sheet from one workbook,\n\
                  aligns both to a shared quarterly range, flags IQR outliers, writes\n\
                  the cleaned tables to a new workbook and opens an interactive chart\n\
                  window.\n\n\
                  EXAMPLES:\n  \
                  # Default sheets and region\n  \
                  quarterline -i dataset.xlsx -o dataset_prepared.xlsx\n\n  \
                  # Another region, no chart window\n  \
                  quarterline -i dataset.xlsx -o out.xlsx --region \"North East\" --headless\n\n  \
                  # Preview the raw tables without processing\n  \
                  quarterline -i dataset.xlsx --dry-run"
)]
struct Args {
    /// Path to the source workbook
    #[arg(short, long, default_value = "dataset.xlsx")]
    input: String,

    /// Path for the cleaned output workbook
    #[arg(short, long, default_value = "dataset_prepared.xlsx")]
    output: String,

    /// Region rate column to analyse and chart
    #[arg(short, long, default_value = "London")]
    region: String,

    /// Name of the housing sheet in the source workbook
    #[arg(long, default_value = "housing")]
    housing_sheet: String,

    /// Name of the unemployment sheet in the source workbook
    #[arg(long, default_value = "unemployment")]
    unemployment_sheet: String,

    /// Metadata rows to skip above the housing header
    #[arg(long, default_value = "6")]
    housing_skip_rows: usize,

    /// Metadata rows to skip above the unemployment header
    #[arg(long, default_value = "6")]
    unemployment_skip_rows: usize,

    /// Load and profile the raw tables, then exit without processing
    #[arg(long)]
    dry_run: bool,

    /// Skip the interactive chart window
    #[arg(long)]
    headless: bool,

    /// Output the run summary as JSON on stdout instead of the
    /// human-readable report
    ///
    /// Disables logging and the chart window; useful for piping:
    /// `quarterline -i data.xlsx --json | jq .summary`
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled entirely so stdout
/// only carries the JSON report.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Serializable view of a run for `--json` output.
#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a str,
    output: &'a str,
    region: &'a str,
    summary: &'a quarterline::RunSummary,
    outliers: &'a [quarterline::OutlierReport],
    profiles: &'a [quarterline::TableProfile],
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !std::path::Path::new(&args.input).exists() {
        return Err(anyhow!("Input workbook not found: {}", args.input));
    }

    let config = PrepConfig::builder()
        .input_path(&args.input)
        .output_path(&args.output)
        .region(&args.region)
        .housing_sheet(SheetLayout::new(&args.housing_sheet, args.housing_skip_rows, 2))
        .unemployment_sheet(SheetLayout::new(
            &args.unemployment_sheet,
            args.unemployment_skip_rows,
            1,
        ))
        .build()?;

    let pipeline = Pipeline::new(config)?;

    if args.dry_run {
        return run_dry_run(&pipeline);
    }

    info!("Starting preparation pipeline...");
    let result = match pipeline.run() {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {e}");
            return Err(anyhow!("Pipeline failed: {e}"));
        }
    };

    if args.json {
        let report = JsonReport {
            input: &args.input,
            output: &args.output,
            region: &args.region,
            summary: &result.summary,
            outliers: &result.outliers,
            profiles: &result.profiles,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&result, &args);

    if !args.headless {
        quarterline::chart::show(&result.dataset, &args.region)?;
    }

    Ok(())
}

/// Load and profile the raw tables without processing them.
///
/// Uses `println!` intentionally: this output is the point of --dry-run
/// and should be visible regardless of log level.
fn run_dry_run(pipeline: &Pipeline) -> Result<()> {
    let (housing, unemployment) = pipeline.load()?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - raw table profiles");
    println!("{}\n", "=".repeat(80));

    let config = pipeline.config();
    for (df, name) in [
        (&housing, config.housing_sheet.name.as_str()),
        (&unemployment, config.unemployment_sheet.name.as_str()),
    ] {
        let profile = quarterline::profile_table(df, name)?;
        println!("{profile}");
    }

    println!("Date range: {}", config.window());
    println!("To execute the preparation, run without --dry-run");
    Ok(())
}

/// Print the human-readable run report.
fn print_summary(result: &RunResult, args: &Args) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("PREPARATION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    for profile in &result.profiles {
        println!("{profile}");
    }

    println!(
        "Housing:      {} monthly rows -> {} quarters",
        summary.housing_rows_in, summary.housing_rows_out
    );
    println!(
        "Unemployment: {} rows -> {} quarters",
        summary.unemployment_rows_in, summary.unemployment_rows_out
    );
    println!("Duration:     {}ms", summary.duration_ms);
    println!();

    println!("Outlier scan:");
    for report in &result.outliers {
        print!("  {report}");
    }
    println!();

    if !summary.actions.is_empty() {
        println!("Actions taken:");
        for action in &summary.actions {
            println!("  - {action}");
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {warning}");
        }
        println!();
    }

    println!("Cleaned workbook: {}", args.output);
    if args.headless {
        println!("Chart window skipped (--headless)");
    }
    println!("{}", "=".repeat(80));
}
