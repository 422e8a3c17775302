use std::sync::Arc;

use futures::future::join_all;
use image::GenericImageView;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::app::{AppContext, Result, ZeitgeistError};
use crate::domain::{Item, ItemKind};
use crate::index::IndexEvent;

pub async fn sync(
    ctx: &AppContext,
    pages: usize,
    tag: Option<String>,
    show_videos: bool,
    hide_images: bool,
) -> Result<()> {
    let (tx, mut events) = mpsc::unbounded_channel::<IndexEvent>();
    ctx.items.subscribe(Arc::new(tx));

    if show_videos {
        ctx.items.set_kind_visible(ItemKind::Video, true);
    }
    if hide_images {
        ctx.items.set_kind_visible(ItemKind::Image, false);
    }
    if tag != ctx.items.tag_filter() {
        ctx.items.set_tag_filter(tag);
    }

    let mut fetched = 0;
    let mut errors = 0;

    for page in 0..pages {
        if page == 0 {
            ctx.items.query_newer();
            // an empty newer page says nothing about older ones
            ctx.items.reset_locked_query();
        } else if ctx.items.is_locked_query() {
            break;
        } else {
            ctx.items.query_older();
        }
        ctx.items.flush().await?;

        while let Ok(event) = events.try_recv() {
            match event {
                IndexEvent::Updated(Some(items)) => fetched += items.len(),
                IndexEvent::Updated(None) => {}
                IndexEvent::Error(message) => {
                    eprintln!("  Error fetching items: {}", message);
                    errors += 1;
                }
            }
        }
        if errors > 0 {
            break;
        }
    }

    save_snapshot(ctx).await;
    // prefetched thumbnails are lost if the runtime stops under them
    ctx.thumbnails.idle().await;
    println!(
        "Sync complete: {} items fetched, {} shown, {} errors",
        fetched,
        ctx.items.count(),
        errors
    );
    Ok(())
}

pub fn list_items(ctx: &AppContext, limit: usize) {
    let view = ctx.items.view();

    if view.is_empty() {
        println!("No items");
        return;
    }

    for &id in view.positions().iter().take(limit) {
        if let Some(item) = view.get_by_id(id) {
            print_item(&item);
        }
    }

    if view.count() > limit {
        println!("... {} more", view.count() - limit);
    }
}

fn print_item(item: &Item) {
    let date = item
        .created_at
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "          ".to_string());

    let tags = if item.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", item.tags.join(", "))
    };

    println!(
        "{:>8} {:<5} {} {}{}",
        item.id,
        item.kind,
        date,
        item.display_title(),
        tags
    );
}

pub async fn update_tags(ctx: &AppContext, id: u64, expression: &str) -> Result<()> {
    let item = ctx.items.update_tags(id, expression).await?;
    println!("Tags of {}: {}", item.id, item.tags.join(", "));
    save_snapshot(ctx).await;
    Ok(())
}

pub async fn delete_item(ctx: &AppContext, id: u64) -> Result<()> {
    ctx.items.delete_item(id).await?;
    println!("Deleted item {}", id);
    save_snapshot(ctx).await;
    Ok(())
}

pub async fn load_thumbnails(ctx: &AppContext, limit: usize) -> Result<()> {
    let view = ctx.items.view();
    let items: Vec<Arc<Item>> = view
        .positions()
        .iter()
        .filter_map(|&id| view.get_by_id(id))
        .filter(|item| item.image.is_some())
        .take(limit)
        .collect();

    if items.is_empty() {
        println!("No thumbnails to load");
        return Ok(());
    }

    println!("Loading {} thumbnails...", items.len());

    let pending = items.into_iter().map(|item| {
        let (tx, rx) = oneshot::channel();
        ctx.thumbnails.load_thumbnail(item, move |id, thumbnail| {
            let _ = tx.send((id, thumbnail));
        });
        rx
    });

    let mut loaded = 0;
    let mut failed = 0;
    for result in join_all(pending).await {
        let (id, thumbnail) = result.map_err(|_| ZeitgeistError::WorkerClosed)?;
        match thumbnail {
            Some(image) => {
                loaded += 1;
                let (width, height) = image.dimensions();
                println!("  {} {}x{}", id, width, height);
            }
            None => {
                failed += 1;
                eprintln!("  {} failed", id);
            }
        }
    }

    println!(
        "Thumbnails complete: {} loaded, {} failed ({})",
        loaded,
        failed,
        ctx.thumbnails.cache_dir().display()
    );
    Ok(())
}

pub async fn clear_cache(ctx: &AppContext) -> Result<()> {
    ctx.thumbnails.clear_memory();
    let removed = ctx.thumbnails.clear_disk_cache().await?;
    println!("Removed {} cached thumbnails", removed);
    Ok(())
}

async fn save_snapshot(ctx: &AppContext) {
    if let Err(e) = ctx.items.save_snapshot().await {
        warn!("Failed to save item snapshot: {}", e);
    }
}
