mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use opportunity_insights::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
