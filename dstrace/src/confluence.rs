//! # Confluence publisher
//!
//! Implements [`Publisher`] against the Confluence REST API: the transformed
//! notebook is rendered to storage format and written over the target page as
//! a new version.
//!
//! Page targets are page URLs as copied from the browser, either
//! `https://<site>/wiki/spaces/<KEY>/pages/<id>/<title>` or
//! `https://<site>/pages/viewpage.action?pageId=<id>`.

use async_trait::async_trait;
use dstrace_core::contract::{PublishError, PublishRequest, PublishedPage, Publisher};
use dstrace_core::notebook::Notebook;
use dstrace_core::storage_format::render_notebook;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

/// Where a page lives in the REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocator {
    pub api_base: String,
    pub page_id: String,
}

impl PageLocator {
    pub fn parse(url: &str) -> Result<Self, PublishError> {
        let id_re = Regex::new(r"/pages/(\d+)|[?&]pageId=(\d+)")?;
        let caps = id_re
            .captures(url)
            .ok_or_else(|| format!("No Confluence page id in URL: {url}"))?;
        let page_id = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| format!("No Confluence page id in URL: {url}"))?;

        let cut = url
            .find("/spaces/")
            .or_else(|| url.find("/pages/"))
            .ok_or_else(|| format!("Unrecognised Confluence page URL: {url}"))?;
        let api_base = url[..cut].trim_end_matches('/').to_string();

        Ok(Self { api_base, page_id })
    }

    pub fn content_url(&self) -> String {
        format!("{}/rest/api/content/{}", self.api_base, self.page_id)
    }
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    title: String,
    version: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    number: u64,
}

/// Request body for replacing a page's content with `storage` as `version`.
pub fn update_body(page_id: &str, title: &str, version: u64, storage: &str) -> Value {
    json!({
        "id": page_id,
        "type": "page",
        "title": title,
        "version": { "number": version },
        "body": {
            "storage": {
                "value": storage,
                "representation": "storage",
            }
        }
    })
}

pub struct ConfluenceClient {
    http: reqwest::Client,
}

impl ConfluenceClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for ConfluenceClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, PublishError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp
        .text()
        .await
        .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
    tracing::error!(
        status = %status,
        url = %url,
        "Confluence API returned error. Response body: {text}"
    );
    Err(format!("Confluence API error {status} for {url}: {text}").into())
}

#[async_trait]
impl Publisher for ConfluenceClient {
    async fn publish<'a>(&self, req: PublishRequest<'a>) -> Result<PublishedPage, PublishError> {
        let locator = PageLocator::parse(req.target)?;
        let url = locator.content_url();

        let raw = std::fs::read_to_string(req.source)?;
        let storage = render_notebook(&Notebook::from_json(&raw)?);

        tracing::info!(url = %url, page_id = %locator.page_id, "Fetching Confluence page");
        let resp = self
            .http
            .get(&url)
            .query(&[("expand", "version")])
            .basic_auth(&req.credentials.username, Some(&req.credentials.token))
            .send()
            .await?;
        let page: PageInfo = check(resp, &url).await?.json().await?;

        let next = page.version.number + 1;
        tracing::info!(
            page_id = %locator.page_id,
            title = %page.title,
            version = next,
            bytes = storage.len(),
            "Updating Confluence page"
        );
        let resp = self
            .http
            .put(&url)
            .basic_auth(&req.credentials.username, Some(&req.credentials.token))
            .json(&update_body(&locator.page_id, &page.title, next, &storage))
            .send()
            .await?;
        check(resp, &url).await?;

        Ok(PublishedPage {
            page_id: locator.page_id,
            title: page.title,
            version: next,
        })
    }
}
