use async_trait::async_trait;
use log2::debug;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

use super::config::CrawlerConfig;
use super::error::FetchError;
use super::graph::Links;

/// Turns a page url into the absolute urls it links to.
///
/// Implementations own their timeouts: the crawler waits on a fetch for as
/// long as it takes.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_and_extract(&self, url: &Url) -> Result<Links, FetchError>;
}

/// Fetcher backed by a real HTTP client
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    scraping_foreign_hosts: bool,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            timeout: config.request_timeout(),
            scraping_foreign_hosts: config.scraping_foreign_hosts,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_and_extract(&self, url: &Url) -> Result<Links, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(FetchError::NotHtml(content_type));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        extract_links(&html, url, self.scraping_foreign_hosts)
    }
}

/// Resolves `href` against the page it was found on.
/// Only http(s) targets are kept; anything else (mailto:, javascript:, ...) is None.
pub fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let resolved = page_url.join(href.trim()).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Collect every `<a href>` of a document as absolute urls.
pub fn extract_links(html: &str, page_url: &Url, scraping_foreign_hosts: bool) -> Result<Links, FetchError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]")
        .map_err(|e| FetchError::Markup(format!("failed to parse <a> selector: {}", e)))?;

    let base_host = page_url.host_str();
    let mut found_urls = Links::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve_link(href, page_url) else {
            debug!("Skipped unusable link {:?} on {}", href, page_url);
            continue;
        };

        let should_include = scraping_foreign_hosts || (base_host.is_some() && base_host == link.host_str());
        if should_include {
            found_urls.insert(link);
        } else {
            debug!("Skipped foreign host link: {}", link);
        }
    }

    debug!("Found {} urls on page {}", found_urls.len(), page_url);

    Ok(found_urls)
}
