use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::services::auth::verifier::{TokenVerifier, VerificationError};
use crate::services::cache::CacheClient;

/// Caches positive verification results for a short TTL.
///
/// - Keys are `<prefix>:<base64url(sha256(header))>`; raw tokens are never stored.
/// - Negative results and errors are not cached.
/// - Cache backend failures are logged and treated as a miss (the inner verifier decides).
/// - A token revoked at the provider stays accepted until its entry expires.
pub struct CachingVerifier<C: CacheClient> {
    inner: Arc<dyn TokenVerifier>,
    cache: C,
    ttl: Duration,
    prefix: String,
}

impl<C: CacheClient> CachingVerifier<C> {
    pub fn new(inner: Arc<dyn TokenVerifier>, cache: C, ttl: Duration) -> Self {
        Self::new_with_prefix(inner, cache, ttl, "auth:verified")
    }

    pub fn new_with_prefix(
        inner: Arc<dyn TokenVerifier>,
        cache: C,
        ttl: Duration,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            ttl,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, auth_header: &str) -> String {
        let digest = Sha256::digest(auth_header.as_bytes());
        format!("{}:{}", self.prefix, URL_SAFE_NO_PAD.encode(digest))
    }
}

#[async_trait]
impl<C: CacheClient> TokenVerifier for CachingVerifier<C> {
    async fn verify_token_and_get_user_id(
        &self,
        auth_header: &str,
    ) -> Result<Option<String>, VerificationError> {
        let key = self.key(auth_header);

        match self.cache.get_string(&key).await {
            Ok(Some(user_id)) => return Ok(Some(user_id)),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    backend = self.cache.backend_name(),
                    error = %err,
                    "verification cache read failed"
                );
            }
        }

        let resolved = self.inner.verify_token_and_get_user_id(auth_header).await?;

        if let Some(user_id) = &resolved
            && let Err(err) = self.cache.set_with_ttl(&key, user_id, self.ttl).await
        {
            tracing::warn!(
                backend = self.cache.backend_name(),
                error = %err,
                "verification cache write failed"
            );
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::services::cache::client::{CacheError, CacheResult};

    #[derive(Clone, Default)]
    struct MemoryCache {
        entries: Arc<Mutex<HashMap<String, String>>>,
        broken: bool,
    }

    #[async_trait]
    impl CacheClient for MemoryCache {
        fn backend_name(&self) -> &'static str {
            "memory"
        }

        async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
            if self.broken {
                return Err(CacheError::BackendCommand("down".into()));
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_with_ttl(&self, key: &str, value: &str, _ttl: Duration) -> CacheResult<()> {
            if self.broken {
                return Err(CacheError::BackendCommand("down".into()));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct CountingVerifier {
        calls: AtomicUsize,
        answer: Option<&'static str>,
    }

    #[async_trait]
    impl TokenVerifier for CountingVerifier {
        async fn verify_token_and_get_user_id(
            &self,
            _auth_header: &str,
        ) -> Result<Option<String>, VerificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.map(str::to_string))
        }
    }

    fn counting(answer: Option<&'static str>) -> Arc<CountingVerifier> {
        Arc::new(CountingVerifier {
            calls: AtomicUsize::new(0),
            answer,
        })
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let inner = counting(Some("user_42"));
        let cache = MemoryCache::default();
        let verifier = CachingVerifier::new(inner.clone(), cache.clone(), Duration::from_secs(60));

        for _ in 0..2 {
            let res = verifier
                .verify_token_and_get_user_id("Bearer abc123")
                .await
                .unwrap();
            assert_eq!(res.as_deref(), Some("user_42"));
        }

        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        let entries = cache.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.keys().all(|k| !k.contains("abc123")));
    }

    #[tokio::test]
    async fn rejections_are_not_cached() {
        let inner = counting(None);
        let cache = MemoryCache::default();
        let verifier = CachingVerifier::new(inner.clone(), cache.clone(), Duration::from_secs(60));

        for _ in 0..2 {
            let res = verifier
                .verify_token_and_get_user_id("Bearer nope")
                .await
                .unwrap();
            assert!(res.is_none());
        }

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn broken_cache_falls_through_to_inner() {
        let inner = counting(Some("user_42"));
        let cache = MemoryCache {
            broken: true,
            ..Default::default()
        };
        let verifier = CachingVerifier::new(inner.clone(), cache, Duration::from_secs(60));

        let res = verifier
            .verify_token_and_get_user_id("Bearer abc123")
            .await
            .unwrap();

        assert_eq!(res.as_deref(), Some("user_42"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entry_is_written_again_after_expiry() {
        let inner = counting(Some("user_42"));
        let cache = MemoryCache::default();
        let verifier = CachingVerifier::new(inner.clone(), cache.clone(), Duration::from_secs(60));

        verifier
            .verify_token_and_get_user_id("Bearer abc123")
            .await
            .unwrap();
        let key = verifier.key("Bearer abc123");

        // TTL elapsed
        cache.entries.lock().unwrap().remove(&key);

        let res = verifier
            .verify_token_and_get_user_id("Bearer abc123")
            .await
            .unwrap();

        assert_eq!(res.as_deref(), Some("user_42"));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            cache.entries.lock().unwrap().get(&key).map(String::as_str),
            Some("user_42")
        );
    }

    #[test]
    fn keys_differ_per_header() {
        let verifier = CachingVerifier::new(
            counting(None),
            MemoryCache::default(),
            Duration::from_secs(1),
        );
        let a = verifier.key("Bearer a");
        let b = verifier.key("Bearer b");

        assert_ne!(a, b);
        assert!(a.starts_with("auth:verified:"));
    }
}
