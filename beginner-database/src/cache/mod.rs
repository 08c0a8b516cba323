mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use redis_store::RedisCacheStore;

/// How long per-guild kudos configuration stays cached.
pub const CONFIG_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled,
    Redis(RedisCacheStore),
}

/// JSON cache in front of Postgres reads. A disabled cache behaves as a
/// permanent miss so callers never need to branch on it.
#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled,
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled => None,
            CacheBackend::Redis(store) => store.get(key).await?,
        };

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let CacheBackend::Redis(store) = &self.backend else {
            return Ok(());
        };

        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;
        store.set(key, payload, ttl.as_secs().max(1)).await
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled => Ok(()),
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    /// Read `key` from the cache, falling back to `loader` on a miss or a
    /// cache error. Loaded values are written back on a best-effort basis.
    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(
                ?e,
                cache_key = key,
                "cache set failed; returning database value"
            );
        }

        Ok(loaded)
    }
}

pub fn kudos_emoji_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("kudos:emoji:{guild_id}"))
}

pub fn ledger_channel_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("kudos:ledger_channel:{guild_id}"))
}

/// Drop every cached kudos config entry for a guild after a write.
pub async fn invalidate_kudos_config(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&kudos_emoji_key(cache, guild_id)).await?;
    cache.del(&ledger_channel_key(cache, guild_id)).await
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_CACHE_TTL, CacheService, kudos_emoji_key, ledger_channel_key};

    #[test]
    fn keys_are_prefixed_per_guild() {
        let cache = CacheService::disabled("beginner:test");
        assert_eq!(kudos_emoji_key(&cache, 7), "beginner:test:kudos:emoji:7");
        assert_eq!(
            ledger_channel_key(&cache, 7),
            "beginner:test:kudos:ledger_channel:7"
        );
    }

    #[tokio::test]
    async fn disabled_cache_always_loads() {
        let cache = CacheService::disabled("beginner:test");
        assert!(!cache.is_redis_enabled());

        let first: u64 = cache
            .get_or_load_json("k", CONFIG_CACHE_TTL, || async { Ok(1) })
            .await
            .unwrap();
        let second: u64 = cache
            .get_or_load_json("k", CONFIG_CACHE_TTL, || async { Ok(2) })
            .await
            .unwrap();

        assert_eq!((first, second), (1, 2));
        cache.ping().await.unwrap();
    }
}
