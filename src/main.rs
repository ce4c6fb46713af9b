use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use restock_watcher::config::AppConfig;
use restock_watcher::monitor::{ProductMonitor, product_name_from_url};
use restock_watcher::plugins::traits::AvailabilityEvent;

#[derive(Parser)]
#[command(
    name = "restock-watcher",
    about = "Product restock monitor with Discord/SMS alert bursts"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the product page until interrupted
    Run,
    /// Run a single polling cycle and print the outcome as JSON
    Once,
    /// Fetch a page and show which availability indicators were found
    Debug {
        /// Page URL; defaults to the configured product URL
        url: Option<String>,
    },
    /// Send a test alert burst through every configured channel
    TestNotify,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Log to stderr and to a daily-rolled monitor.log
    let file_appender = tracing_appender::rolling::daily(".", "monitor.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("restock_watcher=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let monitor = ProductMonitor::from_config(config)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => monitor.run().await?,
        Command::Once => {
            let outcome = monitor.check_once().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Debug { url } => {
            let url = url.unwrap_or_else(|| monitor.product_url().to_string());
            let page = monitor.fetcher().fetch(&url).await?;
            println!("{}", monitor.classifier().detection_report(&page));
        }
        Command::TestNotify => {
            if monitor.notifiers().is_empty() {
                println!("No notification channels configured");
            } else {
                let url = monitor.product_url();
                let event = AvailabilityEvent::new(&product_name_from_url(url), url, Utc::now());
                let summary = monitor.notifiers().send_burst(&event).await;
                println!(
                    "Delivered {}/{} notifications",
                    summary.delivered, summary.attempted
                );
            }
        }
    }

    Ok(())
}
