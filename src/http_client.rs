//! Page fetcher
//!
//! Features:
//! - Cookie jar shared across requests (keeps the login session)
//! - Per-request header profiles: plain document, JSON, or browser XHR
//! - Connect and total timeouts from [`Settings`]
//! - Non-2xx responses returned as data so callers can map 403 themselves

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};

use crate::config::Settings;
use crate::error::{DafilmsError, Result};

/// Which header profile to send with a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// Regular HTML page.
    Document,
    /// In-page XHR as issued by the site's player script.
    Xhr { referer: String },
}

/// A fetched response body with its final URL and status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx response into [`DafilmsError::HttpStatus`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DafilmsError::HttpStatus {
                url: self.url,
                status: self.status,
            })
        }
    }
}

/// Retrieves raw pages from the site.
///
/// Implemented by [`SiteClient`] for real traffic and by in-memory fakes in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` with the header profile for `kind`.
    async fn get(&self, url: &str, kind: RequestKind) -> Result<FetchedPage>;

    /// POST an urlencoded form.
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<FetchedPage>;

    /// GET and fail on non-2xx.
    async fn get_ok(&self, url: &str, kind: RequestKind) -> Result<FetchedPage> {
        self.get(url, kind).await?.error_for_status()
    }
}

/// reqwest-backed [`PageFetcher`].
pub struct SiteClient {
    client: Client,
    base_url: String,
    browser_user_agent: String,
    accept_language: String,
}

impl SiteClient {
    /// Create a client configured from `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .use_rustls_tls()
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .connect_timeout(settings.connect_timeout())
            .timeout(settings.timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()
            .map_err(|e| DafilmsError::transport(&settings.base_url, e))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            browser_user_agent: settings.browser_user_agent.clone(),
            accept_language: settings.accept_language.clone(),
        })
    }

    fn headers_for(&self, kind: &RequestKind) -> HashMap<&'static str, String> {
        let mut headers = HashMap::new();
        match kind {
            RequestKind::Document => {}
            RequestKind::Xhr { referer } => {
                headers.insert("User-Agent", self.browser_user_agent.clone());
                headers.insert("Accept", "*/*".to_string());
                headers.insert("Accept-Language", self.accept_language.clone());
                headers.insert("X-Requested-With", "XMLHttpRequest".to_string());
                headers.insert("Referer", referer.clone());
                headers.insert("Sec-Fetch-Dest", "empty".to_string());
                headers.insert("Sec-Fetch-Mode", "cors".to_string());
                headers.insert("Sec-Fetch-Site", "same-origin".to_string());
            }
        }
        headers
    }

    async fn into_page(url: &str, response: reqwest::Response) -> Result<FetchedPage> {
        let status = response.status();
        let final_url = response.url().to_string();
        info!(status = %status, version = ?response.version(), "Response received");
        let body = response
            .text()
            .await
            .map_err(|e| DafilmsError::transport(url, e))?;
        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for SiteClient {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &str, kind: RequestKind) -> Result<FetchedPage> {
        debug!(?kind, "Fetching");
        let mut request = self.client.get(url);
        for (name, value) in self.headers_for(&kind) {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| DafilmsError::transport(url, e))?;
        Self::into_page(url, response).await
    }

    #[instrument(skip(self, fields), fields(url = %url))]
    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<FetchedPage> {
        let body = encode_form(fields);
        let response = self
            .client
            .post(url)
            .header(USER_AGENT, &self.browser_user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, &self.accept_language)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Origin", &self.base_url)
            .header(REFERER, format!("{}/", self.base_url))
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "same-origin")
            .body(body)
            .send()
            .await
            .map_err(|e| DafilmsError::transport(url, e))?;
        Self::into_page(url, response).await
    }
}

/// Encode form fields as `application/x-www-form-urlencoded`, keeping field order.
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_form_in_order() {
        let body = encode_form(&[("email", "a@b.cz"), ("password", "p w"), ("remember_me", "on")]);
        assert_eq!(body, "email=a%40b.cz&password=p%20w&remember_me=on");
    }

    #[test]
    fn xhr_profile_carries_browser_headers() {
        let client = SiteClient::new(&Settings::default()).unwrap();
        let headers = client.headers_for(&RequestKind::Xhr {
            referer: "https://dafilms.cz/film/1".into(),
        });
        assert_eq!(headers["X-Requested-With"], "XMLHttpRequest");
        assert_eq!(headers["Referer"], "https://dafilms.cz/film/1");
        assert!(headers["User-Agent"].contains("Firefox"));
        assert!(client.headers_for(&RequestKind::Document).is_empty());
    }

    #[test]
    fn error_for_status_maps_non_success() {
        let page = FetchedPage {
            url: "https://dafilms.cz/x".into(),
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        let err = page.error_for_status().unwrap_err();
        assert!(matches!(err, DafilmsError::HttpStatus { status, .. } if status == StatusCode::NOT_FOUND));
    }
}
