use gold_rate_bot::config::Config;
use gold_rate_bot::scrapers::{GoodReturnsSource, HttpFetcher, LiveChennaiSource, RateSource};
use gold_rate_bot::services::{DiscordWebhook, RatePipeline};

use anyhow::Context;
use clap::{App, SubCommand};
use log::{info, warn};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    // 唯一的操作就是运行一次；不带子命令时同样执行 run
    let app = App::new("GoldRateBot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Daily gold & silver rate notifier")
        .subcommand(
            SubCommand::with_name("run")
                .about("Fetch today's rates, send the notification and update the history file"),
        );
    let _matches = app.get_matches();

    let config = Config::from_env().context("invalid configuration")?;
    let now = chrono::Utc::now().with_timezone(&config.timezone);
    if config.webhook_endpoint.is_none() {
        warn!("DISCORD_WEBHOOK_URL is not set, the notification will not be delivered");
    }

    let sources: Vec<Arc<dyn RateSource + Send + Sync>> = vec![
        Arc::new(GoodReturnsSource::new()?),
        Arc::new(LiveChennaiSource::new()?),
    ];
    let fetcher = Arc::new(HttpFetcher::new()?);
    let notifier = Arc::new(DiscordWebhook::new(config.webhook_endpoint.clone(), config.fetch_timeout)?);

    let pipeline = RatePipeline::new(config, sources, fetcher, notifier);
    let report = pipeline
        .run(now)
        .await
        .with_context(|| format!("could not save history to {}", pipeline.store().path().display()))?;

    if report.skipped {
        info!("Skipped run for {}", report.date);
    } else {
        info!(
            "Run for {} complete: {} instrument(s), delivered: {}",
            report.date,
            report.record.len(),
            report.delivered
        );
    }

    Ok(())
}
