//! HTTP implementation of [`Upstream`].

use url::Url;

use crate::upstream::{LatencyReport, Upstream, UpstreamError};

/// Calls the configured upstream URL with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    url: Url,
}

impl HttpUpstream {
    pub fn new(url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Use a pre-built client (connection pool shared with the caller).
    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

impl Upstream for HttpUpstream {
    async fn fetch(&self) -> Result<LatencyReport, UpstreamError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status));
        }

        let body = response.bytes().await.map_err(UpstreamError::BodyRead)?;
        let report = serde_json::from_slice::<LatencyReport>(&body)?;
        Ok(report)
    }
}
