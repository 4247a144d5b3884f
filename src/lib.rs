use anyhow::Context;

use crate::{config::Config, startup::Application};

pub mod auth;
pub mod config;
pub mod content;
pub mod controllers;
pub mod error;
pub mod identity;
pub mod middlewares;
pub mod notify;
pub mod progress;
pub mod routes;
pub mod scope;
pub mod search;
pub mod startup;
pub mod state;
pub mod storage;
pub mod telemetry;

pub async fn run() -> Result<(), anyhow::Error> {
    let config = Config::new().context("Failed to read configuration.")?;
    let application = Application::build(config).await?;

    tracing::info!(
        "Starting server: {}:{}",
        application.host(),
        application.port()
    );

    application.run_until_stopped().await?;

    Ok(())
}
