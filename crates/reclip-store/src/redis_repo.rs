//! Redis-backed job repository.

use async_trait::async_trait;
use redis::{AsyncCommands, Script};
use tracing::debug;

use reclip_models::{Job, JobId};

use crate::error::{StoreError, StoreResult};
use crate::repository::JobRepository;

/// Job records expire a week after their last write.
pub const JOB_RECORD_TTL_SECS: u64 = 7 * 24 * 3600;

/// Swap the record only when its stored revision matches ARGV[1].
///
/// Returns 1 on success, 0 on revision mismatch, -1 if the key is missing.
const COMPARE_AND_SET_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return -1
end
local decoded = cjson.decode(current)
local revision = tonumber(decoded['revision'] or 0)
if revision ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

/// Redis repository configuration.
#[derive(Debug, Clone)]
pub struct RedisRepoConfig {
    /// Redis URL
    pub redis_url: String,
    /// Key prefix for job records
    pub key_prefix: String,
    /// Record TTL in seconds
    pub ttl_secs: u64,
}

impl Default for RedisRepoConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "reclip:job".to_string(),
            ttl_secs: JOB_RECORD_TTL_SECS,
        }
    }
}

impl RedisRepoConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            key_prefix: std::env::var("JOB_KEY_PREFIX")
                .unwrap_or_else(|_| "reclip:job".to_string()),
            ttl_secs: std::env::var("JOB_RECORD_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(JOB_RECORD_TTL_SECS),
        }
    }
}

/// Job records stored as JSON strings under `{prefix}:{job_id}`.
pub struct RedisJobRepository {
    client: redis::Client,
    config: RedisRepoConfig,
}

impl RedisJobRepository {
    /// Create a new repository. Does not connect until first use.
    pub fn new(config: RedisRepoConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        Self::new(RedisRepoConfig::from_env())
    }

    fn key(&self, id: &JobId) -> String {
        format!("{}:{}", self.config.key_prefix, id)
    }

    async fn connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::connection_failed(e.to_string()))
    }
}

#[async_trait]
impl JobRepository for RedisJobRepository {
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = conn.get(self.key(id)).await?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, job: &Job) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(job)?;

        conn.set_ex::<_, _, ()>(self.key(&job.id), payload, self.config.ttl_secs)
            .await?;

        debug!(job_id = %job.id, revision = job.revision, "Stored job record");
        Ok(())
    }

    async fn compare_and_set(&self, expected_revision: u64, job: &Job) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(job)?;

        let outcome: i64 = Script::new(COMPARE_AND_SET_SCRIPT)
            .key(self.key(&job.id))
            .arg(expected_revision)
            .arg(payload)
            .arg(self.config.ttl_secs)
            .invoke_async(&mut conn)
            .await?;

        match outcome {
            1 => Ok(true),
            0 => Ok(false),
            _ => Err(StoreError::not_found(job.id.as_str())),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
