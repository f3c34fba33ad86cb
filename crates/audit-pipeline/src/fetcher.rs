use async_trait::async_trait;
use audit_core::{SignalReport, WebsiteSignals};
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[async_trait]
pub trait WebFetcher: Send + Sync {
    /// Raw markup served at `url`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            // Error pages still carry markup worth auditing.
            log::warn!("Fetching {} returned HTTP {}", url, status);
        }

        response.text().await.map_err(request_error)
    }
}

/// Fetch `url` once and read its signals, turning failures into an error record.
pub async fn extract_signals(fetcher: &dyn WebFetcher, url: &str) -> SignalReport {
    match fetcher.fetch(url).await {
        Ok(markup) => SignalReport::Signals(WebsiteSignals::from_markup(url, &markup)),
        Err(error) => {
            log::error!("Error fetching website data: {}", error);
            SignalReport::Error {
                error: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn http_fetcher_reads_page_signals() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>Acme</title></head><body><h1>Widgets</h1></body></html>",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new();
        let url = format!("{}/", server.uri());
        let report = extract_signals(&fetcher, &url).await;

        match report {
            SignalReport::Signals(signals) => {
                assert_eq!(signals.url, url);
                assert_eq!(signals.title, "Acme");
                assert_eq!(signals.h1_tags, vec!["Widgets"]);
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_fetcher_keeps_markup_of_error_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not Found</title>"))
            .mount(&server)
            .await;

        let markup = HttpFetcher::new()
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .expect("markup");
        assert_eq!(markup, "<title>Not Found</title>");
    }

    #[tokio::test]
    async fn unreachable_site_yields_error_record() {
        let report = extract_signals(&HttpFetcher::new(), "http://127.0.0.1:1/").await;

        let error = report.error().expect("error record");
        assert!(error.contains("http://127.0.0.1:1/"));
    }
}
