use crate::commands::{
    run_catalog, run_insights, run_leads_export, run_leads_list, CatalogArgs, InsightsArgs,
    LeadsExportArgs, LeadsListArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use opportunity_insights::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Opportunity Insights",
    about = "Serve product opportunity insights and manage captured leads",
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
    /// Print the insight metrics for a category/product pair
    Insights(InsightsArgs),
    /// List the categories and products of a market catalog
    Catalog(CatalogArgs),
    /// Inspect captured leads (requires the admin token)
    Leads {
        #[command(subcommand)]
        command: LeadsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum LeadsCommand {
    /// Print stored leads, newest first
    List(LeadsListArgs),
    /// Write the spreadsheet export of stored leads
    Export(LeadsExportArgs),
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

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Insights(args) => run_insights(args),
        Command::Catalog(args) => run_catalog(args),
        Command::Leads {
            command: LeadsCommand::List(args),
        } => run_leads_list(args),
        Command::Leads {
            command: LeadsCommand::Export(args),
        } => run_leads_export(args),
    }
}
