use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

/// Caller identity extractor.
///
/// Session issuance and verification live with the identity-provider
/// integration; the trusted frontend propagates the resolved user id in the
/// X-User-ID header. Every operation takes the caller explicitly through this
/// extractor rather than reading ambient session state.
#[derive(Debug, Clone, Copy)]
pub struct RequesterId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for RequesterId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing X-User-ID header")))?;

        let user_id = raw
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid X-User-ID header")))?;

        tracing::Span::current().record("user_id", raw);

        Ok(RequesterId(user_id))
    }
}
