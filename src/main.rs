mod telemetry;

use anyhow::Context as _;
use calgate_api::Application;
use calgate_infra::{setup_context, Config};
use telemetry::init_subscriber;
use tracing::info;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber("calgate=info");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CONFIG_FILE").ok())
        .context("no configuration file given, set CONFIG_FILE or pass it as argument")?;

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path))?;

    let context = setup_context(config).await?;
    let shutdown = context.shutdown.clone();

    let app = Application::new(context).await?;
    info!(port = app.port(), "calendar service listening");

    let result = app.start().await;

    // stop the sync, feed and cache loops before exiting
    shutdown.cancel();

    result.context("server terminated abnormally")
}
