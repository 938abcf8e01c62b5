/// Factory: build the token verifier from application `Config`.
use std::{sync::Arc, time::Duration};

use anyhow::Context;

use crate::config::Config;
use crate::services::auth::{AppwriteTokenService, CachingVerifier, TokenVerifier};
use crate::services::cache::ValkeyClient;

pub async fn build_token_verifier(config: &Config) -> anyhow::Result<Arc<dyn TokenVerifier>> {
    let appwrite: Arc<dyn TokenVerifier> = Arc::new(
        AppwriteTokenService::new(&config.appwrite).context("build appwrite http client")?,
    );

    let Some(valkey_url) = config.valkey_url.as_deref() else {
        tracing::info!("token verification cache disabled");
        return Ok(appwrite);
    };

    let cache = ValkeyClient::new(valkey_url)
        .await
        .context("connect verification cache")?;

    tracing::info!(
        ttl_seconds = config.verify_cache_ttl_seconds,
        "token verification cache enabled"
    );

    Ok(Arc::new(CachingVerifier::new(
        appwrite,
        cache,
        Duration::from_secs(config.verify_cache_ttl_seconds),
    )))
}
