//! Redis implementation of [`KeyValueStore`]

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::traits::*;
use crate::types::*;

/// Connection parameters for a Redis database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl StoreConfig {
    pub fn new(host: impl Into<String>, port: u16, db: i64) -> Self {
        Self {
            host: host.into(),
            port,
            db,
        }
    }

    /// Connection URL understood by the redis client
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("localhost", 6379, 5)
    }
}

/// Store backed by a single multiplexed Redis connection
///
/// The connection is opened once and kept for the lifetime of the store.
/// There is no pooling and no reconnect; a dropped connection surfaces as
/// [`StoreError::Redis`] on the next call.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Connect to the database described by `config`
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.url())?;
        let connection = client.get_multiplexed_async_connection().await?;
        log::debug!("Connected to redis at {}:{} db {}", config.host, config.port, config.db);
        Ok(Self { connection })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn hash_set(&mut self, key: &str, fields: &Fields) -> StoreResult<()> {
        let items: Vec<(&str, &str)> = fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let _: () = self.connection.hset_multiple(key, &items).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<RawFields> {
        // multiplexed handles are cheap to clone and share the same socket
        let mut connection = self.connection.clone();
        Ok(connection.hgetall(key).await?)
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let mut connection = self.connection.clone();
        Ok(connection.exists(key).await?)
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let mut connection = self.connection.clone();
        Ok(connection.keys("*").await?)
    }

    async fn delete(&mut self, keys: &[String]) -> StoreResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        Ok(self.connection.del(keys.to_vec()).await?)
    }
}
