//! Minimal JSON client for hosting APIs.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LINK};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::SourceError;

/// Number of items requested per page.
pub const PER_PAGE: u32 = 100;

/// Upper bound on pages followed for one listing.
const MAX_PAGES: usize = 1000;

/// A JSON API client with fixed authentication headers.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    headers: HeaderMap,
}

impl ApiClient {
    /// Creates a client sending `headers` with every request.
    pub fn new(headers: HeaderMap) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("git-backup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, headers })
    }

    /// Creates a header map with a single secret header.
    pub fn secret_header(
        source_name: &str,
        name: HeaderName,
        value: &str,
    ) -> Result<HeaderMap, SourceError> {
        let mut value = HeaderValue::from_str(value)
            .map_err(|_| SourceError::invalid_spec(source_name, "token contains invalid characters"))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        Ok(headers)
    }

    /// Adds a non-secret header.
    pub fn with_header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    /// Fetches and decodes a single resource.
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let (value, _) = self.get_page(url).await?;
        Ok(value)
    }

    /// Fetches every page of a listing, following `Link: <...>; rel="next"`.
    pub async fn get_all<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, SourceError> {
        let mut items = Vec::new();
        let mut next = Some(url);
        let mut pages = 0;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                break;
            }
            let (page, link): (Vec<T>, _) = self.get_page(url).await?;
            items.extend(page);
            next = link;
        }

        debug!("Listed {} items in {} pages", items.len(), pages);
        Ok(items)
    }

    async fn get_page<T: DeserializeOwned>(&self, url: Url) -> Result<(T, Option<Url>), SourceError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let next = next_link(response.headers());
        Ok((response.json().await?, next))
    }
}

/// Returns the `rel="next"` target of a `Link` header, if any.
pub fn next_link(headers: &HeaderMap) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|link| {
            let (target, params) = link.split_once(';')?;
            let is_next = params
                .split(';')
                .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
            if !is_next {
                return None;
            }
            let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
            Url::parse(target).ok()
        })
}

/// Parses a base URL, making sure it ends with `/` so it can be joined.
pub fn base_url(source_name: &str, url: &str) -> Result<Url, SourceError> {
    let mut url = Url::parse(url)
        .map_err(|e| SourceError::invalid_spec(source_name, format!("invalid URL {}: {}", url, e)))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Joins a relative API path onto a base URL.
pub fn endpoint(source_name: &str, base: &Url, path: &str) -> Result<Url, SourceError> {
    base.join(path)
        .map_err(|e| SourceError::invalid_spec(source_name, format!("invalid URL: {}", e)))
}
