use async_trait::async_trait;
use thiserror::Error;

/// Errors from the blob store.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The object does not exist (yet). Records are uploaded some time
    /// after finalization, so this is an expected outcome.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The transfer failed; the fetch can be retried.
    #[error("blob transfer failed: {0}")]
    Transport(String),

    /// The store answered with something other than success or absence.
    #[error("unexpected blob store response: status {0}")]
    UnexpectedStatus(u16),
}

impl BlobError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether the same fetch may succeed later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotFound(_))
    }
}

/// Source of execution-record objects, addressed by object name.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait BlobSource: Send + Sync + 'static {
    /// Fetches a whole object. Absence is [`BlobError::NotFound`], not
    /// an empty body.
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, BlobError>;
}

/// HTTP object-store client: objects live at `<base>/<bucket>/<name>`.
#[derive(Debug, Clone)]
pub struct HttpBucket {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl HttpBucket {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bucket: bucket.into(),
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.bucket,
            name
        )
    }
}

#[async_trait]
impl BlobSource for HttpBucket {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, BlobError> {
        let url = self.object_url(name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| BlobError::transport(err.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|err| BlobError::transport(err.to_string()))?;
                Ok(body.to_vec())
            }
            reqwest::StatusCode::NOT_FOUND => Err(BlobError::NotFound(name.to_string())),
            status if status.is_server_error() => {
                Err(BlobError::transport(format!("{url}: status {status}")))
            }
            status => Err(BlobError::UnexpectedStatus(status.as_u16())),
        }
    }
}
