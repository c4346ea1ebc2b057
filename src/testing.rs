//! In-memory [`PageFetcher`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::Result;
use crate::http_client::{encode_form, FetchedPage, PageFetcher, RequestKind};

/// Serves canned pages by URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, (u16, String)>,
    posts: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<(String, RequestKind)>>,
    posted: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(url.to_string(), (status, body.to_string()));
        self
    }

    pub fn post(mut self, url: &str, status: u16, body: &str) -> Self {
        self.posts.insert(url.to_string(), (status, body.to_string()));
        self
    }

    /// GET requests seen so far.
    pub fn requests(&self) -> Vec<(String, RequestKind)> {
        self.requests.lock().unwrap().clone()
    }

    /// Encoded form bodies posted so far.
    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }

    fn respond(table: &HashMap<String, (u16, String)>, url: &str) -> FetchedPage {
        let (status, body) = table.get(url).cloned().unwrap_or((404, String::new()));
        FetchedPage {
            url: url.to_string(),
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn get(&self, url: &str, kind: RequestKind) -> Result<FetchedPage> {
        self.requests.lock().unwrap().push((url.to_string(), kind));
        Ok(Self::respond(&self.pages, url))
    }

    async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<FetchedPage> {
        self.posted.lock().unwrap().push(encode_form(fields));
        Ok(Self::respond(&self.posts, url))
    }
}
