use std::sync::Arc;

/// Errors that can occur while fetching a single avatar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("empty response body")]
    EmptyBody,

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout | Self::EmptyBody => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Other(_) => false,
        }
    }
}

/// A remote source of placeholder avatars, addressed by a numeric selector.
///
/// The returned bytes are opaque: callers must not assume any image format.
#[async_trait::async_trait]
pub trait AvatarFetcher: Send + Sync {
    /// Human-readable label identifying this service.
    fn label(&self) -> &str;

    /// Fetch the raw content of avatar number `index`.
    async fn fetch(&self, index: u32) -> Result<Vec<u8>, FetchError>;
}

#[async_trait::async_trait]
impl<T: AvatarFetcher + ?Sized> AvatarFetcher for Arc<T> {
    fn label(&self) -> &str {
        (**self).label()
    }

    async fn fetch(&self, index: u32) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(index).await
    }
}
