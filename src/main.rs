use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tfcost::billing::{CatalogIndex, CatalogSource, CloudCatalogClient, FileCatalogSource, MatchPolicy};
use tfcost::config::{self, Config, API_KEY_ENV};
use tfcost::error::{ConfigError, CostError};
use tfcost::estimate::Estimator;
use tfcost::exit_codes::{codes, exit_code_for_anyhow};
use tfcost::plan;
use tfcost::report::{self, OutputFormat};
use tfcost::resources::StaticReference;
use tfcost::retry::ExponentialBackoffPolicy;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tfcost")]
#[command(
    about = "Estimate the hourly cost change of Terraform plans on Compute Engine",
    long_about = "tfcost prices the Compute Engine instances and disks a Terraform plan creates, \
updates or deletes against the Cloud Billing catalog.\n\nGenerate the input with:\n  \
terraform plan -out=plan.tfplan\n  terraform show -json plan.tfplan > plan.json"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the cost change of one or more JSON plans
    Estimate {
        /// Terraform plans in JSON format
        #[arg(required = true)]
        plans: Vec<PathBuf>,
        /// "stdout" or a comma-separated list of files, one per plan
        #[arg(short, long, default_value = "stdout")]
        output: String,
        /// Report format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Read billing SKUs from a JSON file instead of the Cloud Billing API
        #[arg(long)]
        sku_file: Option<PathBuf>,
        /// What to do when several SKUs match one component
        #[arg(long, value_enum)]
        ambiguity: Option<MatchPolicy>,
        /// Disable colored deltas in text reports
        #[arg(long)]
        no_color: bool,
    },
    /// Write a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".tfcost.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging - only warnings and errors unless verbose or RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(exit_code_for_anyhow(&e));
    }
    std::process::exit(codes::SUCCESS);
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => {
            config::init_config(&output)?;
        }
        Commands::Estimate {
            plans,
            output,
            format,
            sku_file,
            ambiguity,
            no_color,
        } => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(path) = sku_file {
                config.catalog.sku_file = Some(path);
            }
            if let Some(policy) = ambiguity {
                config.matching.ambiguity = policy;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if no_color {
                config.output.color = false;
            }
            estimate(&plans, &output, &config).await?;
        }
    }
    Ok(())
}

/// Resolve where each plan's report goes; `None` means stdout.
fn output_targets(output: &str, plan_count: usize) -> Result<Vec<Option<PathBuf>>> {
    if output == "stdout" {
        return Ok(vec![None; plan_count]);
    }
    let paths: Vec<Option<PathBuf>> = output
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Some(PathBuf::from(p)))
        .collect();
    if paths.len() != plan_count {
        return Err(CostError::Usage(format!(
            "--output lists {} file(s) but {} plan(s) were given",
            paths.len(),
            plan_count
        ))
        .into());
    }
    Ok(paths)
}

fn catalog_source(config: &Config) -> Result<Box<dyn CatalogSource>> {
    let catalog = &config.catalog;
    if let Some(path) = &catalog.sku_file {
        info!("Reading billing SKUs from {}", path.display());
        return Ok(Box::new(FileCatalogSource::new(path.clone())));
    }

    let api_key = catalog.api_key.clone().ok_or_else(|| {
        ConfigError::MissingField(format!(
            "catalog.api_key (set it in the config file, export {}, or pass --sku-file)",
            API_KEY_ENV
        ))
    })?;
    let client = CloudCatalogClient::new(api_key)
        .with_endpoint(catalog.endpoint.clone())
        .with_currency(catalog.currency_code.clone())
        .with_page_size(catalog.page_size)
        .with_retry(ExponentialBackoffPolicy::new(catalog.retry_attempts))
        .with_progress(std::io::stderr().is_terminal());
    Ok(Box::new(client))
}

async fn estimate(plans: &[PathBuf], output: &str, config: &Config) -> Result<()> {
    let targets = output_targets(output, plans.len())?;
    let reference = StaticReference::load(&config.reference).context("Failed to load reference data")?;

    let skus = catalog_source(config)?
        .fetch_skus(&config.catalog.service_id)
        .await
        .context("Failed to fetch billing SKUs")?;
    let catalog = CatalogIndex::build(skus);
    if catalog.is_empty() {
        anyhow::bail!("The billing catalog returned no Compute Engine core, RAM or disk SKUs");
    }

    let estimator = Estimator::new(&catalog, &reference, config.matching.ambiguity);
    let color = config.output.color && targets.iter().all(Option::is_none) && std::io::stdout().is_terminal();

    for (path, target) in plans.iter().zip(targets) {
        let decoded = plan::load_plan(path).with_context(|| format!("Failed to read plan: {}", path.display()))?;
        let estimate = estimator.estimate(decoded);
        let rendered = report::render(&estimate, config.output.format, color)?;
        write_report(&rendered, target.as_deref())?;
    }
    Ok(())
}

fn write_report(rendered: &str, target: Option<&Path>) -> Result<()> {
    match target {
        None => {
            println!("{}", rendered);
        }
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            println!("Wrote cost report to {}", path.display());
        }
    }
    Ok(())
}
