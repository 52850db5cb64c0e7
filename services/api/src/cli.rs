use crate::commands::{run_clean, run_report, CleanArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grant_insights::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "grant-insights",
    about = "Clean grant request exports and serve year-by-year breakdowns",
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
    /// Clean a CSV export and print what changed per field
    Clean(CleanArgs),
    /// Print the breakdown views for one year of a CSV export
    Report(ReportArgs),
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
        Command::Clean(args) => run_clean(args),
        Command::Report(args) => run_report(args),
    }
}
