use banker_sim::config::{
    ConfigError, Pacing, ScenarioBuilder, ScenarioConfig, Selection, DEFAULT_REQUESTS_PER_CUSTOMER,
};
use banker_sim::lifecycle::{setup_tracing, Simulation, SimulationReport};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Instrument};

/// Banker's Algorithm deadlock-avoidance simulation.
#[derive(Parser, Debug)]
#[command(name = "banker", version, about)]
struct Cli {
    /// Number of resource types
    #[arg(required_unless_present = "scenario")]
    resources: Option<usize>,

    /// Number of customers
    #[arg(required_unless_present = "scenario")]
    customers: Option<usize>,

    /// Transactions generated for each customer
    #[arg(long, default_value_t = DEFAULT_REQUESTS_PER_CUSTOMER)]
    requests_per_customer: usize,

    /// Shortest pause between a customer's steps
    #[arg(long, default_value_t = 1000)]
    min_delay_ms: u64,

    /// Longest pause between a customer's steps
    #[arg(long, default_value_t = 5000)]
    max_delay_ms: u64,

    /// Seed for totals, claims, requests and pacing
    #[arg(long)]
    seed: Option<u64>,

    /// Work through transactions in order instead of at random
    #[arg(long)]
    round_robin: bool,

    /// Load the whole scenario from a JSON file
    #[arg(long, conflicts_with_all = ["resources", "customers"])]
    scenario: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn scenario(&self) -> Result<ScenarioConfig, ConfigError> {
        if let Some(path) = &self.scenario {
            return ScenarioConfig::from_json_file(path);
        }

        let selection = if self.round_robin {
            Selection::RoundRobin
        } else {
            Selection::Random
        };
        let mut builder = ScenarioBuilder::new()
            .random_resources(self.resources.unwrap_or_default())
            .random_maximum(self.customers.unwrap_or_default())
            .requests_per_customer(self.requests_per_customer)
            .pacing(Pacing::new(self.min_delay_ms, self.max_delay_ms))
            .selection(selection);
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        builder.build()
    }
}

fn print_summary(report: &SimulationReport) {
    println!("Total:     {}", report.total);
    println!("Available: {}", report.available);
    for customer in &report.customers {
        println!(
            "  {}: {} transactions, {} grants, {} denials",
            customer.customer, customer.transactions, customer.grants, customer.denials
        );
    }
    if report.is_consistent() {
        println!("All resources returned.");
    } else {
        println!(
            "Inconsistent end state: pools {} with {} outstanding grants",
            report.pool_free, report.outstanding_grants
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config = cli.scenario().map_err(|e| e.to_string())?;
    info!(
        total = %config.total,
        customers = config.customers(),
        "Starting simulation"
    );

    let span = tracing::info_span!("simulation");
    let result = async {
        let simulation = Simulation::start(&config).await?;
        simulation.wait().await
    }
    .instrument(span)
    .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Simulation failed");
            return Err(e.to_string());
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        print_summary(&report);
    }

    if !report.is_consistent() {
        return Err("simulation ended with resources still allocated".to_string());
    }
    Ok(())
}
