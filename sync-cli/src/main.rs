use anyhow::Result;
use clap::Parser;
use sftp_sync::{NotificationSink, SftpEndpoint, SlackWebhook, SyncConfig, SyncEngine};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "sftp-sync")]
#[command(about = "Transfer files between SFTP endpoints, tracking what has already moved")]
struct Cli {
    /// Path to the config file
    config: std::path::PathBuf,

    /// Print what would happen, but don't transfer anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let cli = Cli::parse();

    if cli.dry_run {
        println!("--dry-run specified. Nothing will be transferred\n");
    }

    let config = match SyncConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    info!(
        "Connecting source {} and destination {}",
        config.source.address(),
        config.dest.address()
    );

    let source = match SftpEndpoint::connect(&config.source, config.timeout).await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };
    let dest = match SftpEndpoint::connect(&config.dest, config.timeout).await {
        Ok(endpoint) => endpoint,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };

    let sink = config.webhook_url.clone().map(SlackWebhook::new);
    let engine = SyncEngine::new(config, cli.dry_run);

    let report = engine
        .run(
            &source,
            &dest,
            sink.as_ref().map(|s| s as &dyn NotificationSink),
        )
        .await?;

    if report.dry_run {
        for name in &report.pending {
            println!("Would transfer {name}");
        }
        println!("{} files would be transferred", report.found);
    } else {
        println!(
            "Transferred {} of {} new files ({} failed)",
            report.transferred, report.found, report.failed
        );
    }

    Ok(())
}
