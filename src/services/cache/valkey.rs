//! Valkey (Redis protocol) backend for the denylist.
use async_trait::async_trait;
use redis::{Cmd, FromRedisValue, aio::ConnectionManager};
use std::time::Duration;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

#[derive(Clone)]
pub struct ValkeyClient {
    manager: ConnectionManager,
}

impl ValkeyClient {
    /// `url` is a `redis://` or `rediss://` URL. Fails if the first
    /// connection cannot be made.
    pub async fn new(url: &str) -> Result<Self, CacheError> {
        let manager = redis::Client::open(url)
            .map_err(|e| CacheError::BackendConnection(e.to_string()))?
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::BackendConnection(e.to_string()))?;

        Ok(Self { manager })
    }

    // ConnectionManager reconnects on its own; each call works on a cheap clone.
    async fn run<T: FromRedisValue>(&self, cmd: &Cmd) -> CacheResult<T> {
        let mut conn = self.manager.clone();
        cmd.query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendCommand(e.to_string()))
    }
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        "valkey"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        self.run(redis::cmd("GET").arg(key)).await
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool> {
        // nil reply when NX loses; EX has whole-second granularity
        let reply: Option<String> = self
            .run(
                redis::cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl.as_secs().max(1)),
            )
            .await?;

        Ok(reply.is_some())
    }

    async fn ping(&self) -> CacheResult<()> {
        let _pong: String = self.run(&redis::cmd("PING")).await?;
        Ok(())
    }
}
