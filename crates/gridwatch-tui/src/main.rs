//! gridwatch — terminal wallboard for network-interface telemetry.

mod app;
mod editor;
mod event;
mod grid;
mod rate_fmt;
mod term;
mod theme;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use gridwatch_api::GatewayClient;
use gridwatch_config::GridwatchConfig;
use gridwatch_core::Wallboard;

#[derive(Parser)]
#[command(name = "gridwatch", about = "Real-time network-interface telemetry wallboard")]
struct Args {
    /// Path to a gridwatch.toml (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the fleet gateway URL from the config file.
    #[arg(long)]
    url: Option<url::Url>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let mut config = GridwatchConfig::load(args.config.as_deref())
        .wrap_err("failed to load configuration")?;
    if let Some(url) = args.url {
        config.gateway_url = url;
    }

    // Log to a file — the alternate screen must stay clean.
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("cannot create log dir {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(&log_dir, "gridwatch.log");
    let (writer, _log_guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let cache_file = config.cache_file()?;
    if let Some(parent) = cache_file.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("cannot create cache dir {}", parent.display()))?;
    }

    let api = GatewayClient::from_token(config.gateway_url.as_str(), &config.api_token)
        .wrap_err("failed to build gateway client")?;
    let wallboard = Wallboard::new(api, cache_file, config.poll_interval);

    term::install_panic_hook();
    let mut terminal = term::init().wrap_err("failed to initialize terminal")?;

    let mut app = app::App::new(wallboard);
    let result = app.run(&mut terminal).await;

    term::restore().wrap_err("failed to restore terminal")?;
    result
}
