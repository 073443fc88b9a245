use crate::domain::ports::HttpSource;
use crate::utils::error::Result;
use reqwest::Client;

#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl HttpSource for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        tracing::debug!("Making HTTP request to: {}", url);
        let response = self.client.get(url).send().await?;

        tracing::debug!("HTTP response status: {}", response.status());
        let body = response.error_for_status()?.text().await?;

        tracing::debug!("Received {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
