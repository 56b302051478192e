//! Manager review queue and manual job triggers.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    error::AppError,
    jobs::{self, AbsenteeSummary, AutoCheckoutSummary, PgJobStore},
    models::{
        attendance::{AttendanceResponse, AttendanceStatus},
        user::User,
    },
    repositories::{AttendanceRepository, AttendanceRepositoryTrait},
    state::AppState,
    types::AttendanceId,
    utils::time,
};

#[derive(Debug, Deserialize)]
pub struct FlaggedQuery {
    /// Defaults to today in the configured time zone.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// Optional status override applied while settling the record.
    pub status: Option<AttendanceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct JobRunQuery {
    /// Defaults to yesterday in the configured time zone; the nightly jobs
    /// settle the day that just ended.
    pub date: Option<NaiveDate>,
}

pub async fn list_flagged(
    State(state): State<AppState>,
    Query(query): Query<FlaggedQuery>,
) -> Result<Json<Vec<AttendanceResponse>>, AppError> {
    let date = query
        .date
        .unwrap_or_else(|| time::today_local(&state.config.time_zone));
    let records = AttendanceRepository::new()
        .find_flagged_for_date(&state.pool, date)
        .await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Settles a flagged record: clears the flag, optionally overrides the
/// status, and stamps the approving manager.
pub async fn approve_record(
    State(state): State<AppState>,
    Extension(manager): Extension<User>,
    Path(id): Path<AttendanceId>,
    Json(payload): Json<ApproveRequest>,
) -> Result<Json<AttendanceResponse>, AppError> {
    let repo = AttendanceRepository::new();
    let mut record = repo.find_by_id(&state.pool, id).await?;

    if let Some(status) = payload.status {
        record.status = status;
        // Keep the half-day marker consistent with an overridden status.
        match status {
            AttendanceStatus::HalfDay => record.is_half_day = true,
            AttendanceStatus::Present => {
                record.is_half_day = false;
                record.half_day_type = None;
            }
            _ => {}
        }
    }

    record.clear_flag();
    record.approved_by = Some(manager.id);
    record.approved_at = Some(Utc::now());
    record.updated_at = Utc::now();

    let record = repo.update(&state.pool, &record).await?;

    if let Err(err) = state.cache.invalidate_users(&[record.user_id]).await {
        tracing::warn!(error = %err, "attendance cache invalidation failed");
    }

    Ok(Json(record.into()))
}

fn job_date(state: &AppState, requested: Option<NaiveDate>) -> NaiveDate {
    requested
        .unwrap_or_else(|| time::today_local(&state.config.time_zone) - Duration::days(1))
}

/// Manual trigger for the absentee-marking job; safe to re-run.
pub async fn run_absentee(
    State(state): State<AppState>,
    Query(query): Query<JobRunQuery>,
) -> Result<Json<AbsenteeSummary>, AppError> {
    let date = job_date(&state, query.date);
    let store = PgJobStore::new((*state.pool).clone());
    let summary = jobs::absentee::run(&store, state.notifier.as_ref(), date).await?;
    Ok(Json(summary))
}

/// Manual trigger for the auto-checkout job; safe to re-run.
pub async fn run_auto_checkout(
    State(state): State<AppState>,
    Query(query): Query<JobRunQuery>,
) -> Result<Json<AutoCheckoutSummary>, AppError> {
    let date = job_date(&state, query.date);
    let store = PgJobStore::new((*state.pool).clone());
    let summary = jobs::auto_checkout::run(
        &store,
        state.notifier.as_ref(),
        state.cache.as_ref(),
        date,
        state.config.auto_checkout_at,
    )
    .await?;
    Ok(Json(summary))
}
