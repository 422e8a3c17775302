// Shared test fixtures: an in-memory Zeitgeist server

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

use zeitgeist::api::FeedApi;
use zeitgeist::app::{Result, ZeitgeistError};
use zeitgeist::domain::{ImageDescriptor, Item, ItemKind, TagExpression};

pub const BASE_URL: &str = "http://zeitgeist.test";

/// In-memory feed answering pages of `page_size` items, newest first.
pub struct MockFeedApi {
    items: Mutex<BTreeMap<u64, Item>>,
    page_size: usize,
    calls: Mutex<Vec<String>>,
    downloads: AtomicUsize,
    download_delay: Mutex<Duration>,
    fail: AtomicBool,
    thumbnail: Vec<u8>,
}

impl MockFeedApi {
    pub fn new(items: Vec<Item>, page_size: usize) -> Self {
        Self {
            items: Mutex::new(items.into_iter().map(|item| (item.id, item)).collect()),
            page_size,
            calls: Mutex::new(Vec::new()),
            downloads: AtomicUsize::new(0),
            download_delay: Mutex::new(Duration::ZERO),
            fail: AtomicBool::new(false),
            thumbnail: jpeg_fixture(64, 48),
        }
    }

    /// Every request fails with an API error while set.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.lock().unwrap() = delay;
    }

    pub fn insert(&self, item: Item) {
        self.items.lock().unwrap().insert(item.id, item);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ZeitgeistError::Api("server unavailable".into()));
        }
        Ok(())
    }

    fn page<F>(&self, tag: Option<&str>, keep: F, oldest_first: bool) -> Vec<Item>
    where
        F: Fn(u64) -> bool,
    {
        let items = self.items.lock().unwrap();
        let matching = items
            .values()
            .filter(|item| keep(item.id))
            .filter(|item| tag.map_or(true, |tag| item.has_tag(tag)));

        let mut page: Vec<Item> = if oldest_first {
            matching.take(self.page_size).cloned().collect()
        } else {
            matching.rev().take(self.page_size).cloned().collect()
        };
        page.sort_by(|a, b| b.id.cmp(&a.id));
        page
    }
}

#[async_trait]
impl FeedApi for MockFeedApi {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn list(&self) -> Result<Vec<Item>> {
        self.record("list".into())?;
        Ok(self.page(None, |_| true, false))
    }

    async fn list_after(&self, id: u64) -> Result<Vec<Item>> {
        self.record(format!("list_after({})", id))?;
        Ok(self.page(None, |candidate| candidate > id, true))
    }

    async fn list_before(&self, id: u64) -> Result<Vec<Item>> {
        self.record(format!("list_before({})", id))?;
        Ok(self.page(None, |candidate| candidate < id, false))
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Item>> {
        self.record(format!("list_by_tag({})", tag))?;
        Ok(self.page(Some(tag), |_| true, false))
    }

    async fn list_by_tag_after(&self, tag: &str, id: u64) -> Result<Vec<Item>> {
        self.record(format!("list_by_tag_after({}, {})", tag, id))?;
        Ok(self.page(Some(tag), |candidate| candidate > id, true))
    }

    async fn list_by_tag_before(&self, tag: &str, id: u64) -> Result<Vec<Item>> {
        self.record(format!("list_by_tag_before({}, {})", tag, id))?;
        Ok(self.page(Some(tag), |candidate| candidate < id, false))
    }

    async fn update(&self, id: u64, tags: &TagExpression) -> Result<Item> {
        self.record(format!("update({}, {})", id, tags))?;
        let mut items = self.items.lock().unwrap();
        let item = items.get_mut(&id).ok_or(ZeitgeistError::ItemNotFound(id))?;
        tags.apply(&mut item.tags);
        Ok(item.clone())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        self.record(format!("delete({})", id))?;
        match self.items.lock().unwrap().remove(&id) {
            Some(_) => Ok(()),
            None => Err(ZeitgeistError::ItemNotFound(id)),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.download_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.record(format!("download({})", url))?;
        Ok(self.thumbnail.clone())
    }
}

pub fn item(id: u64, kind: ItemKind, tags: &[&str]) -> Item {
    let mut item = Item::new(id, kind);
    item.tags = tags.iter().map(|tag| tag.to_string()).collect();
    item.image = Some(ImageDescriptor {
        thumbnail: format!("/images/thumb_{}.jpg", id),
        image: format!("/images/{}.jpg", id),
    });
    item
}

/// Items 10..=14 where 12 is a video; 11, 12 and 14 carry "cats".
pub fn sample_items() -> Vec<Item> {
    vec![
        item(10, ItemKind::Image, &[]),
        item(11, ItemKind::Image, &["cats"]),
        item(12, ItemKind::Video, &["cats"]),
        item(13, ItemKind::Image, &[]),
        item(14, ItemKind::Image, &["cats"]),
    ]
}

/// A solid grey JPEG.
pub fn jpeg_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([40, 40, 40]));
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, 90)
        .encode_image(&image)
        .unwrap();
    bytes
}
