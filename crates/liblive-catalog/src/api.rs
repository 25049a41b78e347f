// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{thread, time::Duration};

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

const USER_AGENT: &str = concat!("live-catalog/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 100;

/// blocking http client shared by the catalog store and the release notes fetcher.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// fetches a url as text, retrying transport failures and 5xx responses.
    pub fn get_text(&self, url: &str) -> Result<String> {
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        for attempt in 0..MAX_RETRIES {
            return match self.get_once(url) {
                Ok(text) => Ok(text),
                Err(e) if is_retryable(&e) && attempt + 1 < MAX_RETRIES => {
                    log::debug!("**api:** GET {url} failed ({e}), retrying in {backoff_ms}ms");
                    thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms *= 2;
                    continue;
                }
                Err(e) => Err(e),
            };
        }

        Err(Error::other("max retries exceeded"))
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get_text(url)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// posts a json body once. the response body is not interpreted.
    pub fn post_json(&self, url: &str, body: String) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiError(status.as_u16()));
        }

        Ok(())
    }

    fn get_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::ApiError(status.as_u16()));
        }

        Ok(response.text()?)
    }
}

fn is_retryable(error: &Error) -> bool {
    match error {
        Error::Network(_) => true,
        Error::ApiError(status) => *status >= 500,
        _ => false,
    }
}

/// something that can hand back the text of a remote document.
pub trait DocumentSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// fetches documents over http, optionally through a relay proxy that takes
/// the real target in its `url` query parameter.
#[derive(Clone)]
pub struct HttpDocumentSource {
    client: ApiClient,
    proxy: Option<String>,
}

impl HttpDocumentSource {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// the url actually requested for `target`.
    pub fn request_url(&self, target: &str) -> Result<String> {
        let Some(proxy) = &self.proxy else {
            return Ok(target.to_string());
        };

        let mut url = reqwest::Url::parse(proxy)
            .map_err(|e| Error::config(format!("invalid proxy url {proxy}: {e}")))?;
        url.query_pairs_mut().append_pair("url", target);

        Ok(url.into())
    }
}

impl DocumentSource for HttpDocumentSource {
    fn fetch(&self, url: &str) -> Result<String> {
        let request_url = self.request_url(url)?;
        log::debug!("**api:** fetching {request_url}");
        self.client.get_text(&request_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: &str = "https://www.ableton.com/en/release-notes/live-12/";

    #[test]
    fn test_request_url_without_proxy_is_target() {
        let source = HttpDocumentSource::new(ApiClient::new().unwrap());
        assert_eq!(source.request_url(TARGET).unwrap(), TARGET);
    }

    #[test]
    fn test_request_url_through_proxy_encodes_target() {
        let source = HttpDocumentSource::new(ApiClient::new().unwrap())
            .with_proxy(Some("https://relay.example.dev".to_string()));

        assert_eq!(
            source.request_url(TARGET).unwrap(),
            "https://relay.example.dev/?url=https%3A%2F%2Fwww.ableton.com%2Fen%2Frelease-notes%2Flive-12%2F"
        );
    }

    #[test]
    fn test_request_url_rejects_bad_proxy() {
        let source = HttpDocumentSource::new(ApiClient::new().unwrap())
            .with_proxy(Some("not a url".to_string()));
        assert!(matches!(source.request_url(TARGET), Err(Error::Config(_))));
    }

    #[test]
    fn test_retry_classification() {
        assert!(is_retryable(&Error::ApiError(503)));
        assert!(!is_retryable(&Error::ApiError(404)));
        assert!(!is_retryable(&Error::version("x")));
    }
}
