//! Remote quote source.
//!
//! The remote endpoint serves generic posts; [`HttpFetcher`] maps each post to
//! a quote (`title` becomes the text, `userId` the category) and drops posts
//! without a usable title.

use futures::future::{BoxFuture, FutureExt};
use quotesync_engine::{Error, QuoteRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

type Result<T> = std::result::Result<T, Error>;

/// Supplies batches of remote quotes.
pub trait RemoteFetcher: Send + Sync {
    /// Fetch up to `limit` quotes.
    ///
    /// Any failure is reported as [`Error::RemoteUnavailable`].
    fn fetch_batch(&self, limit: usize) -> BoxFuture<'_, Result<Vec<QuoteRecord>>>;

    /// Send a locally added quote upstream. Best effort; the default does
    /// nothing.
    fn publish<'a>(&'a self, _quote: &'a QuoteRecord) -> BoxFuture<'a, Result<()>> {
        futures::future::ready(Ok(())).boxed()
    }
}

/// A post as served by the remote endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePost {
    #[serde(default)]
    pub title: Value,
    #[serde(default, rename = "userId")]
    pub user_id: Value,
}

impl RemotePost {
    /// Map to a quote, or `None` if the title is empty.
    pub fn into_quote(self) -> Option<QuoteRecord> {
        let text = match self.title {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        };
        let category = match self.user_id {
            Value::Null => "Category Server".to_string(),
            Value::String(s) => format!("Category {}", s),
            other => format!("Category {}", other),
        };
        QuoteRecord::new(text, category).ok()
    }
}

/// Body sent when publishing a quote.
#[derive(Debug, Serialize)]
struct PublishBody<'a> {
    title: &'a str,
    body: &'a str,
}

/// Fetches quotes over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpFetcher {
    /// Create a fetcher for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<QuoteRecord>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("_limit", limit)])
            .send()
            .await
            .map_err(|e| Error::RemoteUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::RemoteUnavailable(format!(
                "remote responded with {}",
                status
            )));
        }

        let posts: Vec<RemotePost> = response
            .json()
            .await
            .map_err(|e| Error::RemoteUnavailable(format!("malformed payload: {}", e)))?;

        let received = posts.len();
        let quotes: Vec<QuoteRecord> = posts
            .into_iter()
            .filter_map(RemotePost::into_quote)
            .collect();

        tracing::debug!(
            received,
            usable = quotes.len(),
            endpoint = %self.endpoint,
            "Fetched remote batch"
        );
        Ok(quotes)
    }

    async fn post(&self, quote: &QuoteRecord) -> Result<()> {
        let body = PublishBody {
            title: quote.text(),
            body: quote.category(),
        };

        self.client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| Error::RemoteUnavailable(e.to_string()))?;

        Ok(())
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch_batch(&self, limit: usize) -> BoxFuture<'_, Result<Vec<QuoteRecord>>> {
        self.fetch(limit).boxed()
    }

    fn publish<'a>(&'a self, quote: &'a QuoteRecord) -> BoxFuture<'a, Result<()>> {
        self.post(quote).boxed()
    }
}
