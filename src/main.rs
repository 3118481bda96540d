mod app;
mod config;
mod effects;
mod format;
mod input;
mod messages;
mod schedule;
mod services;
mod store;
mod terminal;
mod timer;
mod view;

use app::App;
use config::Config;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they stay out of the timer window on stdout
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    tracing::info!("Starting chronos countdown timer");

    let config = Config::load()?;
    config.validate()?;

    App::new(config)?.run().await
}
