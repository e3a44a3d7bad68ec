//! Blogsmith maintenance tool.
//!
//! Usage:
//!   blogsmith-maint backfill-engagement
//!   blogsmith-maint refresh-share-urls [--dry-run]
//!
//! Reads the same settings as the server (`blogsmith.toml`, `MONGODB_URI`,
//! `PUBLIC_BASE_URL`, ...).

use anyhow::Context;
use clap::{Parser, Subcommand};

use blogsmith::config::Settings;
use blogsmith::db::connection::MongoConnection;
use blogsmith::db::repository::MongoBlogRepository;
use blogsmith::maintenance;

#[derive(Parser, Debug)]
#[command(name = "blogsmith-maint")]
#[command(about = "Data maintenance tasks for the Blogsmith database")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Give blogs created before likes existed `likes: 0, likedBy: []`
    BackfillEngagement,
    /// Recompute the share URL of every published blog from PUBLIC_BASE_URL
    RefreshShareUrls {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogsmith=info".into()),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::load().context("Failed to load settings")?;

    let connection = MongoConnection::connect(&settings.mongodb_uri, &settings.mongodb_database)
        .await
        .context("Failed to connect to MongoDB")?;
    let repo = MongoBlogRepository::new(connection.database());

    match args.command {
        Command::BackfillEngagement => {
            let modified = maintenance::backfill_engagement(&repo).await?;
            println!("Updated {modified} blog(s) with likes fields");
        }
        Command::RefreshShareUrls { dry_run } => {
            let report =
                maintenance::refresh_share_urls(&repo, &settings.public_base_url, dry_run).await?;
            let verb = if dry_run { "Would update" } else { "Updated" };
            println!(
                "{verb} {} share URL(s), {} already current",
                report.updated, report.unchanged
            );
        }
    }

    connection.shutdown().await;
    Ok(())
}
