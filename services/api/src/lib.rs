mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use grant_insights::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
