use std::sync::Arc;

use clap::Parser;

use studydesk::{
    api::{ContentApi, HttpContentApi, InMemoryContentApi},
    app::App,
    cli::Cli,
    config::AppConfig,
    error::user_friendly_message,
    logging, Result,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { offline, files } = Cli::parse();

    let config = AppConfig::load()?;
    let log_path = logging::init(&config.log_level)?;
    info!(log = %log_path.display(), offline, "starting studydesk");

    let api: Arc<dyn ContentApi> = if offline {
        Arc::new(InMemoryContentApi::new())
    } else {
        Arc::new(HttpContentApi::from_config(&config)?)
    };

    let mut app = App::new(config, api)?;
    if !files.is_empty() {
        let queued = app.queue_files(&files)?;
        info!(queued, "files queued for upload");
    }

    app.init()?;
    let result = app.run().await;
    app.restore()?;

    if let Err(e) = result {
        eprintln!("Application error: {}", user_friendly_message(&e));
        std::process::exit(1);
    }
    Ok(())
}
