//! One-shot absentee marking, for cron or manual reruns after a failure.
//! Marks yesterday by default; pass a date argument (YYYY-MM-DD) to rerun
//! a specific day.

use chrono::{Duration, NaiveDate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geoattend_backend::{
    config::Config,
    db::connection::create_pool,
    jobs::{self, PgJobStore},
    services::notifier::LogFlagNotifier,
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

    let date = match std::env::args().nth(1) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("invalid date argument (expected YYYY-MM-DD): {raw}"))?,
        None => time::today_local(&config.time_zone) - Duration::days(1),
    };

    let store = PgJobStore::new((*pool).clone());
    let summary = jobs::absentee::run(&store, &LogFlagNotifier, date).await?;
    tracing::info!(
        date = %summary.date,
        absentees = summary.absentees,
        on_leave = summary.on_leave,
        failed = summary.failed,
        "absentee marking run complete"
    );
    Ok(())
}
