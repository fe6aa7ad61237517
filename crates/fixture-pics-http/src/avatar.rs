use std::time::Duration;

use fixture_pics::{AvatarFetcher, FetchError};

/// Configuration for the placeholder avatar service.
#[derive(Debug, Clone)]
pub struct PravatarConfig {
    /// Defaults to `https://i.pravatar.cc`.
    pub base_url: Option<String>,
    /// Edge length in pixels requested from the service.
    pub size: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for PravatarConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            size: 200,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches avatars from a pravatar-style service:
/// `GET {base}/{size}?img={index}` returns image bytes.
pub struct PravatarClient {
    config: PravatarConfig,
    client: reqwest::Client,
}

impl PravatarClient {
    pub fn new(config: PravatarConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent("fixture-pics")
            .build()
            .map_err(|e| FetchError::Other(format!("could not build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or("https://i.pravatar.cc")
            .trim_end_matches('/')
    }

    /// URL of avatar number `index`.
    pub fn avatar_url(&self, index: u32) -> String {
        format!("{}/{}?img={index}", self.base_url(), self.config.size)
    }
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(error.to_string())
    }
}

#[async_trait::async_trait]
impl AvatarFetcher for PravatarClient {
    fn label(&self) -> &str {
        self.base_url()
    }

    async fn fetch(&self, index: u32) -> Result<Vec<u8>, FetchError> {
        let url = self.avatar_url(index);
        tracing::debug!(%url, "fetching avatar");

        let response = self.client.get(&url).send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".into()),
            });
        }

        let bytes = response.bytes().await.map_err(classify)?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(bytes.to_vec())
    }
}
