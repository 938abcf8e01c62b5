//! Appwrite-backed token verification.
//!
//! Appwrite issues short-lived JWTs to signed-in clients. The server does not verify them
//! locally; it asks Appwrite who the token belongs to (`GET /account` as that user).
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::AppwriteConfig;
use crate::services::auth::verifier::{TokenVerifier, VerificationError};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const JWT_HEADER: &str = "X-Appwrite-JWT";

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(rename = "$id", default)]
    id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AppwriteTokenService {
    client: reqwest::Client,
    account_url: String,
    project_id: String,
}

impl AppwriteTokenService {
    pub fn new(config: &AppwriteConfig) -> Result<Self, VerificationError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            account_url: format!("{}/account", config.endpoint.as_str().trim_end_matches('/')),
            project_id: config.project_id.clone(),
        })
    }
}

/// Token part of the header. Accepts `Bearer <jwt>` (scheme case-insensitive) or a bare jwt.
fn bearer_token(auth_header: &str) -> Option<&str> {
    let value = auth_header.trim();
    if value.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };

    (!token.is_empty()).then_some(token)
}

#[async_trait]
impl TokenVerifier for AppwriteTokenService {
    async fn verify_token_and_get_user_id(
        &self,
        auth_header: &str,
    ) -> Result<Option<String>, VerificationError> {
        let Some(token) = bearer_token(auth_header) else {
            return Ok(None);
        };

        let res = self
            .client
            .get(&self.account_url)
            .header(PROJECT_HEADER, &self.project_id)
            .header(JWT_HEADER, token)
            .send()
            .await?;

        let status = res.status();

        if status.is_success() {
            let account: AccountResponse = res
                .json()
                .await
                .map_err(|e| VerificationError::InvalidResponse(e.to_string()))?;

            return Ok(account
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()));
        }

        if status.is_client_error() {
            if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
                tracing::debug!(status = %status, "appwrite rejected account lookup");
            }
            return Ok(None);
        }

        Err(VerificationError::Upstream {
            status: status.as_u16(),
        })
    }
}
