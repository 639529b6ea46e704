use accident_stats::accident_record::load_csv;
use accident_stats::bulk_load::BulkElasticLoad;
use accident_stats::config::AppConfig;
use accident_stats::elastic_load::{map_documents, ElasticLoad};
use accident_stats::report::{render_summary, write_json, DashboardReport};
use accident_stats::{AccidentRecord, AgeBracket, LabelTable};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use elasticsearch::auth::Credentials;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Traffic accident statistics by age group", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    #[arg(short, long, value_name = "FILE", default_value = "accident-stats.toml")]
    config: PathBuf,
    /// Accident CSV, overriding `input.data_csv`
    #[arg(short, long, value_name = "CSV")]
    input: Option<PathBuf>,
    /// Age bracket to single out on the map, overriding `dashboard.highlight`
    #[arg(long, value_name = "BRACKET")]
    highlight: Option<AgeBracket>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print accident counts and rates per age group
    Summary(CommonArgs),
    /// Write every dashboard view to dashboard.json
    Report {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Bulk-index geolocated accidents into Elasticsearch
    Export(CommonArgs),
}

fn load(common: &CommonArgs) -> Result<(AppConfig, Vec<AccidentRecord>)> {
    LabelTable::validated()?;
    let mut config = AppConfig::load_or_default(&common.config)?;
    if let Some(input) = &common.input {
        config.input.data_csv = input.clone();
    }
    if let Some(highlight) = common.highlight {
        config.dashboard.highlight = highlight;
    }
    let records = load_csv(&config.input.data_csv, &config.input.columns)?;
    info!("loaded {} accident records from {:?}", records.len(), config.input.data_csv);
    Ok((config, records))
}

fn build_report(config: &AppConfig, records: &[AccidentRecord]) -> Result<DashboardReport> {
    let reference = config.license_reference()?;
    let report = DashboardReport::build(records, &reference, config.dashboard.highlight, &config.severity_rule())?;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Summary(common) => {
            let (config, records) = load(common)?;
            let report = build_report(&config, &records)?;
            println!("{}", render_summary(&report.aggregate));
            println!("Skipped (unknown age label): {}", report.dataset.unmapped);
        }
        Commands::Report { common, output } => {
            let (config, records) = load(common)?;
            let report = build_report(&config, &records)?;
            let dir = output.clone().unwrap_or(config.dashboard.output_dir);
            let path = write_json(&dir, &report)?;
            println!("Report written to {:?}", path);
        }
        Commands::Export(common) => {
            let (config, records) = load(common)?;
            let start = Instant::now();

            let mut builder = BulkElasticLoad::builder()
                .with_uri(config.elastic.uri.clone())
                .with_index(config.elastic.index.clone())
                .with_batch_size(config.elastic.batch_size)
                .with_throttle(config.elastic.throttle);
            if let (Some(user), Some(password)) = (&config.elastic.username, &config.elastic.password) {
                builder = builder.with_credentials(Credentials::Basic(user.clone(), password.clone()));
            }
            let loader = builder.build()?;

            let documents = map_documents(&records, config.dashboard.highlight);
            let totals = loader.load(&documents).await?;

            let duration = start.elapsed();
            println!("Total Records: {:?}", totals.num_total);
            println!("Total Created: {:?}", totals.num_created);
            println!("Total Failed: {:?}", totals.num_failed);
            println!("Duration: {duration:?}");
            let seconds = duration.as_secs_f64();
            if seconds > 0.0 {
                println!("Records Per Second: {:.0}", totals.num_total as f64 / seconds);
            }
        }
    }

    Ok(())
}
