pub mod config;
pub mod editor;
pub mod error;
pub mod telemetry;

mod cli;
mod infra;
mod server;

use crate::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
