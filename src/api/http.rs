use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{ApiConfig, FeedApi, PageRequest};
use crate::app::{Result, ZeitgeistError};
use crate::domain::{Item, TagExpression};

#[derive(Deserialize)]
struct ItemsBody {
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct ItemBody {
    item: Item,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct UpdateBody {
    id: u64,
    add_tags: String,
    del_tags: String,
}

#[derive(Serialize)]
struct DeleteBody {
    id: u64,
}

/// reqwest-based client for the Zeitgeist JSON API.
pub struct HttpFeedApi {
    client: Client,
    base: Url,
    base_url: String,
}

impl HttpFeedApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))?;
        if base.cannot_be_a_base() {
            return Err(ZeitgeistError::Config(format!(
                "Base URL cannot be used for API paths: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        let base_url = base.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base,
            base_url,
        })
    }

    /// URL of a plain or tag-scoped listing with its page boundary.
    pub fn list_url(&self, tag: Option<&str>, page: PageRequest) -> Url {
        let mut url = match tag {
            Some(tag) => self.endpoint(&["show", "tag", tag]),
            None => self.base.clone(),
        };

        match page {
            PageRequest::First => {}
            PageRequest::After(id) => {
                url.query_pairs_mut().append_pair("after", &id.to_string());
            }
            PageRequest::Before(id) => {
                url.query_pairs_mut().append_pair("before", &id.to_string());
            }
        }

        url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_items(&self, tag: Option<&str>, page: PageRequest) -> Result<Vec<Item>> {
        let url = self.list_url(tag, page);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let parsed: ItemsBody = parse_body(status, &body)?;
        Ok(parsed.items)
    }

    async fn post<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<(StatusCode, Vec<u8>)> {
        let url = self.endpoint(&[endpoint]);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok((status, body))
    }
}

#[async_trait]
impl FeedApi for HttpFeedApi {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn list(&self) -> Result<Vec<Item>> {
        self.get_items(None, PageRequest::First).await
    }

    async fn list_after(&self, id: u64) -> Result<Vec<Item>> {
        self.get_items(None, PageRequest::After(id)).await
    }

    async fn list_before(&self, id: u64) -> Result<Vec<Item>> {
        self.get_items(None, PageRequest::Before(id)).await
    }

    async fn list_by_tag(&self, tag: &str) -> Result<Vec<Item>> {
        self.get_items(Some(tag), PageRequest::First).await
    }

    async fn list_by_tag_after(&self, tag: &str, id: u64) -> Result<Vec<Item>> {
        self.get_items(Some(tag), PageRequest::After(id)).await
    }

    async fn list_by_tag_before(&self, tag: &str, id: u64) -> Result<Vec<Item>> {
        self.get_items(Some(tag), PageRequest::Before(id)).await
    }

    async fn update(&self, id: u64, tags: &TagExpression) -> Result<Item> {
        let body = UpdateBody {
            id,
            add_tags: tags.additions().join(","),
            del_tags: tags.removals().join(","),
        };
        let (status, bytes) = self.post("update", &body).await?;
        let parsed: ItemBody = parse_body(status, &bytes)?;
        Ok(parsed.item)
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let (status, bytes) = self.post("delete", &DeleteBody { id }).await?;
        check_body(status, &bytes)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Fail on non-2xx statuses and on `{"error": ...}` bodies.
fn check_body(status: StatusCode, body: &[u8]) -> Result<()> {
    if let Ok(ErrorBody { error }) = serde_json::from_slice::<ErrorBody>(body) {
        return Err(ZeitgeistError::Api(error));
    }
    if !status.is_success() {
        return Err(ZeitgeistError::Api(format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown status")
        )));
    }
    Ok(())
}

fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T> {
    check_body(status, body)?;
    Ok(serde_json::from_slice(body)?)
}
