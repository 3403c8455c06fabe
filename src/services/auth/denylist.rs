/*
 * Responsibility
 * - 失効済み refresh token の記録 (logout / rotation)
 * - check-and-store を原子的に行い、同じ refresh token の二重使用を防ぐ
 * - backend 障害は Err で返す (呼び出し側は fail-closed)
 */
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::services::cache::{CacheClient, CacheError, MemoryCache, ValkeyClient};

#[derive(Debug, thiserror::Error)]
pub enum DenylistError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}

type DenylistFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DenylistError>> + Send + 'a>>;

pub trait TokenDenylist: Send + Sync {
    // Mark `fingerprint` as revoked for `ttl_secs`.
    //
    // Returns:
    // - Ok(true)  => newly revoked by this call
    // - Ok(false) => already revoked
    // - Err(_)    => backend failure
    fn revoke<'a>(&'a self, fingerprint: &'a str, ttl_secs: u64) -> DenylistFuture<'a, bool>;

    fn is_revoked<'a>(&'a self, fingerprint: &'a str) -> DenylistFuture<'a, bool>;

    fn ping(&self) -> DenylistFuture<'_, ()>;
}

/// Stable key for a token: base64url(sha256(token)).
///
/// Raw tokens are never stored.
pub fn fingerprint(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Denylist on top of any `CacheClient`.
#[derive(Clone)]
pub struct CacheDenylist<C: CacheClient> {
    cache: Arc<C>,
    // Key prefix to avoid collisions across environments
    prefix: String,
}

impl CacheDenylist<ValkeyClient> {
    pub async fn connect(redis_url: &str) -> Result<Self, DenylistError> {
        let client = ValkeyClient::new(redis_url).await?;
        Ok(Self::new_with_cache(Arc::new(client), "token:revoked"))
    }
}

impl CacheDenylist<MemoryCache> {
    pub fn in_memory() -> Self {
        Self::new_with_cache(Arc::new(MemoryCache::new()), "token:revoked")
    }
}

impl<C: CacheClient> CacheDenylist<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    fn key(&self, fingerprint: &str) -> String {
        format!("{}:{}", self.prefix, fingerprint)
    }
}

impl<C: CacheClient> TokenDenylist for CacheDenylist<C> {
    fn revoke<'a>(&'a self, fingerprint: &'a str, ttl_secs: u64) -> DenylistFuture<'a, bool> {
        Box::pin(async move {
            // SET <key> "1" NX EX <ttl>
            let stored = self
                .cache
                .set_if_absent_with_ttl(&self.key(fingerprint), "1", Duration::from_secs(ttl_secs))
                .await?;

            Ok(stored)
        })
    }

    fn is_revoked<'a>(&'a self, fingerprint: &'a str) -> DenylistFuture<'a, bool> {
        Box::pin(async move { Ok(self.cache.get_string(&self.key(fingerprint)).await?.is_some()) })
    }

    fn ping(&self) -> DenylistFuture<'_, ()> {
        Box::pin(async move { Ok(self.cache.ping().await?) })
    }
}
