// Entry point and high-level CLI flow.
//
// Reads one trip CSV, runs the risk pipeline once, writes the report files
// and prints a markdown preview of every view. Logs go to stderr.
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fleet_risk::config::{ImpactNullPolicy, PipelineConfig, DEFAULT_TOP_N};
use fleet_risk::output;
use fleet_risk::pipeline;
use fleet_risk::util::{format_int, format_number, largest_magnitude};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImpactPolicyArg {
    /// Skip trips with a missing distance when averaging
    Exclude,
    /// Report no value for a day with any missing distance
    Poison,
}

impl From<ImpactPolicyArg> for ImpactNullPolicy {
    fn from(arg: ImpactPolicyArg) -> Self {
        match arg {
            ImpactPolicyArg::Exclude => ImpactNullPolicy::Exclude,
            ImpactPolicyArg::Poison => ImpactNullPolicy::Poison,
        }
    }
}

#[derive(Parser)]
#[command(name = "fleet_risk")]
#[command(about = "Scores daily vehicle trips and ranks fleet risk", long_about = None)]
struct Cli {
    /// Trip CSV to analyze
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Directory for the report files
    #[arg(short, long, default_value = "reports")]
    out_dir: PathBuf,

    /// Rows kept by the hub ranking and per zone
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// How daily impact treats trips with a missing distance
    #[arg(long, value_enum, default_value_t = ImpactPolicyArg::Exclude)]
    impact_policy: ImpactPolicyArg,

    /// Rows shown per table preview
    #[arg(short, long, default_value_t = 5)]
    preview: usize,

    /// Only print previews, do not write files
    #[arg(long, default_value_t = false)]
    no_files: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::default()
        .with_top_n(cli.top_n)
        .with_impact_policy(cli.impact_policy.into());

    let (report, load_report) = pipeline::run_from_path(&cli.input, &config)
        .with_context(|| format!("failed to analyze {}", cli.input.display()))?;

    info!(
        "Processing dataset... ({} trips loaded, {} flagged)",
        format_int(load_report.total_rows),
        format_int(report.summary.flagged_trips)
    );
    if load_report.date_coercions + load_report.numeric_coercions > 0 {
        warn!(
            "{} date and {} numeric cells could not be parsed and were left empty",
            format_int(load_report.date_coercions),
            format_int(load_report.numeric_coercions)
        );
    }

    let top_note = format!("Top {} by Risk Value", config.top_n);
    output::preview_table("Top Risk Hubs", Some(&top_note), &report.hub_rankings, cli.preview);
    output::preview_table(
        "Top Risk Vehicles per Zone",
        Some(&top_note),
        &report.zone_rankings,
        cli.preview,
    );
    output::preview_table(
        "Vehicle Risk Summary",
        Some("All flagged vehicles"),
        &report.vehicle_summaries,
        cli.preview,
    );
    output::preview_table(
        "Daily Distance Impact",
        Some("Mean manual minus GPS distance (KM)"),
        &report.daily_impact,
        cli.preview,
    );
    println!(
        "Total risk value: {} across {} vehicles",
        format_int(report.summary.total_risk_value),
        format_int(report.summary.flagged_vehicles)
    );
    if let Some(worst) = largest_magnitude(report.daily_impact.iter().filter_map(|d| d.impact_value)) {
        println!("Largest daily impact (by magnitude): {} KM", format_number(worst, 2));
    }

    if !cli.no_files {
        let written = output::write_report(&cli.out_dir, &report)
            .with_context(|| format!("failed to write reports to {}", cli.out_dir.display()))?;
        for path in written {
            println!("(Exported {})", path.display());
        }
    }
    Ok(())
}
