//! Per-user attendance read-cache invalidation.
//!
//! Batch jobs report which user ids they touched; this service evicts the
//! corresponding cached reads so clients never see a stale day.

use crate::db::redis::RedisPool;
use crate::types::UserId;
use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;

#[async_trait]
pub trait AttendanceCacheTrait: Send + Sync {
    async fn invalidate_users(&self, user_ids: &[UserId]) -> anyhow::Result<()>;
}

pub struct RedisAttendanceCache {
    pool: RedisPool,
}

impl RedisAttendanceCache {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn user_key(user_id: UserId) -> String {
        format!("attendance:user:{}", user_id)
    }
}

#[async_trait]
impl AttendanceCacheTrait for RedisAttendanceCache {
    async fn invalidate_users(&self, user_ids: &[UserId]) -> anyhow::Result<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.pool.get().await?;
        let keys: Vec<String> = user_ids.iter().copied().map(Self::user_key).collect();
        let _: () = conn.del(keys).await?;
        tracing::debug!(count = user_ids.len(), "evicted attendance cache entries");
        Ok(())
    }
}

/// Used when Redis is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAttendanceCache;

#[async_trait]
impl AttendanceCacheTrait for NoopAttendanceCache {
    async fn invalidate_users(&self, _user_ids: &[UserId]) -> anyhow::Result<()> {
        Ok(())
    }
}
