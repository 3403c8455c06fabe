//! Key/value seam under the refresh-token denylist.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Not an `AppError`: the denylist maps these itself and fails closed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// String keys and values with per-key expiry. Clones share one backend.
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    /// Short label for logs and readiness output.
    fn backend_name(&self) -> &'static str;

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    /// Atomic insert. `Ok(false)` means another writer got there first and
    /// the existing value and expiry are left alone.
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool>;

    async fn ping(&self) -> CacheResult<()>;
}
