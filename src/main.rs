//! Binary entry point: CLI parsing, logging setup and service wiring.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use outage_watch::{
    config::AppConfig,
    executor::ActionExecutor,
    http_client::create_retryable_http_client,
    notifier::TelegramChannel,
    observer::DtekObserver,
    persistence::sqlite::SqliteStateRepository,
    render::CaptionRenderer,
    supervisor::Supervisor,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing app.yaml.
    #[arg(long)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the polling daemon.
    Run,
    /// Performs a single reconciliation cycle and exits.
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    let supervisor = build_supervisor(cli.config_dir.as_deref()).await?;
    match cli.command {
        Commands::Run => supervisor.run().await?,
        Commands::Check => supervisor.run_once().await?,
    }

    Ok(())
}

async fn build_supervisor(
    config_dir: Option<&str>,
) -> Result<Supervisor, Box<dyn std::error::Error>> {
    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(config_dir)?;
    config.validate()?;
    tracing::debug!(street = %config.street, house = %config.house, "Configuration loaded.");

    if let Some(parent) = config.snapshot_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let repo = Arc::new(SqliteStateRepository::new(&config.database_url).await?);
    repo.run_migrations().await?;
    tracing::info!("Database migrations completed.");

    let retry_client = create_retryable_http_client(
        &config.http_retry,
        reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?,
    );
    let observer = Arc::new(DtekObserver::new(
        Arc::new(retry_client),
        config.shutdowns_url.clone(),
        config.ajax_url.clone(),
        config.street.clone(),
        config.house.clone(),
        config.snapshot_path.clone(),
        config.browser_binary.clone(),
        config.fetch_timeout_secs,
        config.time_format.clone(),
        config.time_zone,
    ));

    let channel = Arc::new(TelegramChannel::new(
        reqwest::Client::new(),
        config.telegram_bot_token.clone(),
        config.telegram_chat_id,
    ));
    let renderer = CaptionRenderer::new(config.time_format.clone(), config.time_zone);
    let executor = ActionExecutor::new(channel, repo.clone(), renderer);

    tracing::info!("Services initialized.");

    let supervisor = Supervisor::builder()
        .config(config)
        .observer(observer)
        .executor(executor)
        .state(repo)
        .build()?;

    Ok(supervisor)
}
