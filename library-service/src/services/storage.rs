//! Blob storage collaborator. Uploads happen outside this core; purge only
//! needs deletion by artifact URL.

use async_trait::async_trait;
use service_core::error::AppError;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn delete_artifact(&self, url: &str) -> Result<(), AppError>;
}

/// Deletes artifacts from a hosted blob store with a DELETE on the artifact
/// URL, optionally bearer-authenticated.
pub struct HttpBlobStorage {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl HttpBlobStorage {
    pub fn new(auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_token,
        }
    }
}

#[async_trait]
impl Storage for HttpBlobStorage {
    async fn delete_artifact(&self, url: &str) -> Result<(), AppError> {
        let mut request = self.client.delete(url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Blob delete request failed: {}", e))
        })?;

        // An already-gone artifact counts as deleted.
        if response.status().is_success() || response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        Err(AppError::InternalError(anyhow::anyhow!(
            "Blob delete for {} returned {}",
            url,
            response.status()
        )))
    }
}
