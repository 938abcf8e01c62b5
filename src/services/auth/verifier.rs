use async_trait::async_trait;
use thiserror::Error;

/// The identity provider could not give an answer.
///
/// Distinct from "token invalid", which is `Ok(None)`.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity provider returned status {status}")]
    Upstream { status: u16 },
    #[error("unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

/// Resolves the raw `Authorization` header value to a user id.
///
/// - `Ok(Some(id))`: token accepted
/// - `Ok(None)`: no user for this token (invalid, expired, malformed)
/// - `Err(_)`: verification unavailable
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token_and_get_user_id(
        &self,
        auth_header: &str,
    ) -> Result<Option<String>, VerificationError>;
}
