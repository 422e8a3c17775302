use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zeitgeist::app::AppContext;
use zeitgeist::cli::{commands, Cli, Commands};
use zeitgeist::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Sync {
            pages,
            tag,
            show_videos,
            hide_images,
        } => {
            commands::sync(&ctx, pages, tag, show_videos, hide_images).await?;
        }
        Commands::List { limit } => {
            commands::list_items(&ctx, limit);
        }
        Commands::Tag { id, expression } => {
            commands::update_tags(&ctx, id, &expression).await?;
        }
        Commands::Delete { id } => {
            commands::delete_item(&ctx, id).await?;
        }
        Commands::Thumbs { limit } => {
            commands::load_thumbnails(&ctx, limit).await?;
        }
        Commands::ClearCache => {
            commands::clear_cache(&ctx).await?;
        }
    }

    ctx.items.shutdown();
    Ok(())
}
