use arbor_ops::error::AppError;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::demo::{run_assess, run_batch, run_demo, run_quick, DemoArgs};
use crate::infra::parse_date;
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Arbor Estimating Platform",
    about = "Run and demonstrate the tree assessment and estimating service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Price trees without starting the service
    Estimate {
        #[command(subcommand)]
        command: EstimateCommand,
    },
    /// Run an end-to-end CLI demo covering assessment and job aggregation
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum EstimateCommand {
    /// Instant ballpark from geometry alone
    Quick(QuickArgs),
    /// Full assessment with hazards and the business-rule pass
    Assess(AssessArgs),
    /// Import a tree-inventory CSV and price the whole job
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct QuickArgs {
    /// Tree height in feet
    #[arg(long)]
    pub(crate) height_ft: f64,
    /// Canopy radius in feet
    #[arg(long)]
    pub(crate) canopy_radius_ft: f64,
    /// Diameter at breast height in inches
    #[arg(long)]
    pub(crate) dbh_in: f64,
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Tree height in feet
    #[arg(long)]
    pub(crate) height_ft: f64,
    /// Canopy radius in feet
    #[arg(long)]
    pub(crate) canopy_radius_ft: f64,
    /// Diameter at breast height in inches
    #[arg(long)]
    pub(crate) dbh_in: f64,
    /// Species name for the line item
    #[arg(long)]
    pub(crate) species: Option<String>,
    /// Hazard indicator present on site (repeatable, e.g. --hazard overhead_lines)
    #[arg(long = "hazard")]
    pub(crate) hazards: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Path to the tree-inventory CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Job identifier to aggregate the inventory under
    #[arg(long)]
    pub(crate) job_id: String,
    /// Assessment date stamped on each attachment (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) assessed_on: Option<NaiveDate>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Estimate {
            command: EstimateCommand::Quick(args),
        } => run_quick(args),
        Command::Estimate {
            command: EstimateCommand::Assess(args),
        } => run_assess(args),
        Command::Estimate {
            command: EstimateCommand::Batch(args),
        } => run_batch(args),
        Command::Demo(args) => run_demo(args),
    }
}
