//! One-shot auto-checkout, for cron or manual reruns after a failure.
//! Closes yesterday's open check-ins by default; pass a date argument
//! (YYYY-MM-DD) to rerun a specific day.

use chrono::{Duration, NaiveDate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoattend_backend::{
    config::Config,
    db::{connection::create_pool, redis::create_redis_pool},
    jobs::{self, PgJobStore},
    services::{
        attendance_cache::{AttendanceCacheTrait, NoopAttendanceCache, RedisAttendanceCache},
        notifier::LogFlagNotifier,
    },
    utils::time,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoattend_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let cache: Box<dyn AttendanceCacheTrait> = match create_redis_pool(&config).await? {
        Some(redis) => Box::new(RedisAttendanceCache::new(redis)),
        None => Box::new(NoopAttendanceCache),
    };

    let date = match std::env::args().nth(1) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("invalid date argument (expected YYYY-MM-DD): {raw}"))?,
        None => time::today_local(&config.time_zone) - Duration::days(1),
    };

    let store = PgJobStore::new((*pool).clone());
    let summary = jobs::auto_checkout::run(
        &store,
        &LogFlagNotifier,
        cache.as_ref(),
        date,
        config.auto_checkout_at,
    )
    .await?;
    tracing::info!(
        date = %summary.date,
        closed = summary.closed,
        skipped = summary.skipped,
        failed = summary.failed,
        "auto-checkout run complete"
    );
    Ok(())
}
