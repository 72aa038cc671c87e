use anyhow::Result;
use clap::Parser;
use rss_notifier::cli::{Cli, Command};
use rss_notifier::orchestrator::{Orchestrator, ReplyStrategy, RunConfig};
use rss_notifier::poster::{Credentials, StubPoster, XApiClient};
use rss_notifier::summarizer::GeminiClient;
use rss_notifier::{output, PostApi};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let orchestrator = match cli.command {
        Command::Post {
            rss_url,
            toc_url,
            minutes,
            strategy,
            tags,
            viewer_url,
            debug,
        } => {
            info!("RSS URL: {}", rss_url);
            info!("TOC URL: {}", toc_url);

            let config = RunConfig {
                primary_url: rss_url,
                toc_url,
                window_minutes: minutes,
                strategy,
                base_tags: tags,
                viewer_url,
                debug,
                ..RunConfig::default()
            };

            let orchestrator = Orchestrator::new(config.clone());
            match build_poster(&config) {
                Some(poster) => orchestrator.with_poster(poster),
                None => orchestrator,
            }
        }
        Command::Digest {
            toc_url,
            date,
            model,
            tags,
            debug,
        } => {
            info!("TOC URL: {}", toc_url);

            let config = RunConfig {
                toc_url,
                strategy: ReplyStrategy::DailySummaryPost,
                target_date: date,
                model: model.unwrap_or_else(|| rss_notifier::summarizer::DEFAULT_MODEL.to_string()),
                base_tags: tags,
                debug,
                ..RunConfig::default()
            };

            let orchestrator =
                Orchestrator::new(config.clone()).with_summarizer(Box::new(GeminiClient::from_env()?));
            match build_poster(&config) {
                Some(poster) => orchestrator.with_poster(poster),
                None => orchestrator,
            }
        }
    };

    let outcome = orchestrator.run().await?;
    output::emit(&outcome)?;

    Ok(())
}

/// Resolve the posting client for a run. Debug mode short-circuits to the
/// stub; missing credentials leave posting disabled for the whole run.
fn build_poster(config: &RunConfig) -> Option<Box<dyn PostApi>> {
    if config.debug {
        return Some(Box::new(StubPoster));
    }

    match Credentials::from_env() {
        Some(credentials) => match XApiClient::new(credentials) {
            Ok(client) => Some(Box::new(client)),
            Err(e) => {
                warn!("Failed to build posting client: {}", e);
                None
            }
        },
        None => {
            warn!("Posting credentials are not set, posting will be skipped");
            None
        }
    }
}
