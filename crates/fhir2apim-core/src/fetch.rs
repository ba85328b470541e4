//! HTTP retrieval of remote documents.
//!
//! Every request honors the configured timeout and the caller's
//! cancellation token. Transport failures, timeouts and non-2xx statuses all
//! surface as [`Error::Fetch`]; cancellation surfaces as [`Error::Cancelled`].

// Internal imports (std, crate)
use std::time::Duration;

use crate::Error;

// External imports (alphabetized)
use log::info;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Fetches text documents for a single generation call
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(timeout: Option<Duration>, cancel: CancellationToken) -> crate::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, cancel })
    }

    /// GET a URL and return the body as text
    pub async fn get_text(&self, url: &Url) -> crate::Result<String> {
        info!("Fetching {}", url);
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = self.request(url) => result,
        }
    }

    async fn request(&self, url: &Url) -> crate::Result<String> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Failed to fetch {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::fetch(format!(
                "Failed to fetch {}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read response from {}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_text_success() -> crate::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fhir/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(None, CancellationToken::new())?;
        let url = Url::parse(&format!("{}/fhir/metadata", server.uri())).unwrap();
        assert_eq!(fetcher.get_text(&url).await?, "{\"ok\":true}");
        Ok(())
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(None, CancellationToken::new()).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let err = fetcher.get_text(&url).await.unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(Some(Duration::from_millis(100)), CancellationToken::new())
            .unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert!(fetcher.get_text(&url).await.unwrap_err().is_fetch_failure());
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let fetcher = Fetcher::new(None, cancel).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert!(matches!(
            fetcher.get_text(&url).await,
            Err(Error::Cancelled)
        ));
    }
}
