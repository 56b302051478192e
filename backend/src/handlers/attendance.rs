//! Check-in / check-out handlers and the employee's own attendance reads.

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::{AppError, AttendanceError},
    models::{
        attendance::{
            AttendanceRecord, AttendanceResponse, CheckInRequest, CheckOutRequest,
        },
        branch::{Branch, GeoPoint},
        user::User,
    },
    repositories::{AttendanceRepository, AttendanceRepositoryTrait, BranchRepository},
    services::{
        geo::haversine_distance_m,
        notifier::{notify_best_effort, FlagEvent},
        status::{evaluate_check_in, evaluate_check_out, StatusRules},
    },
    state::AppState,
    types::BranchId,
    utils::time,
};

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Resolves the branch an event is validated against: the claimed branch
/// when one is given, otherwise the nearest active branch.
async fn resolve_branch(
    state: &AppState,
    claimed: Option<BranchId>,
    position: GeoPoint,
) -> Result<Branch, AppError> {
    let repo = BranchRepository::new();
    if let Some(id) = claimed {
        return repo
            .find_active_by_id(&state.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Branch not found".into()));
    }

    let branches = repo.find_active(&state.pool).await?;
    branches
        .into_iter()
        .min_by(|a, b| {
            let da = haversine_distance_m(position, a.location());
            let db = haversine_distance_m(position, b.location());
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or_else(|| AppError::BadRequest("No active branches configured".into()))
}

pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CheckInRequest>,
) -> Result<Json<AttendanceResponse>, AppError> {
    payload.validate()?;

    let position = GeoPoint::new(payload.lat, payload.lng);
    let now_local = time::now_in_timezone(&state.config.time_zone);
    let date = now_local.date_naive();
    let rules = StatusRules::from(&state.config);

    let branch = resolve_branch(&state, payload.branch_id, position).await?;

    let repo = AttendanceRepository::new();
    let existing = repo
        .find_by_user_and_date(&state.pool, user.id, date)
        .await?;

    let eval = evaluate_check_in(
        &rules,
        existing.as_ref(),
        &branch,
        position,
        now_local.naive_local(),
    )?;

    let record = match existing {
        Some(mut record) => {
            eval.apply_to(&mut record, Utc::now());
            repo.update(&state.pool, &record).await?
        }
        None => {
            let mut record = AttendanceRecord::new(user.id, date, Utc::now());
            eval.apply_to(&mut record, Utc::now());
            match repo.insert_if_absent(&state.pool, &record).await? {
                Some(inserted) => inserted,
                // Unique-index race: someone created the row first. Retry
                // as a read and re-apply the determiner against it.
                None => {
                    let current = repo
                        .find_by_user_and_date(&state.pool, user.id, date)
                        .await?
                        .ok_or_else(|| {
                            AppError::InternalServerError(anyhow::anyhow!(
                                "attendance row vanished after conflict"
                            ))
                        })?;
                    if current.check_in_time.is_some() {
                        return Err(AttendanceError::DuplicateCheckIn.into());
                    }
                    let mut current = current;
                    eval.apply_to(&mut current, Utc::now());
                    repo.update(&state.pool, &current).await?
                }
            }
        }
    };

    if let Some(reason) = record.flag_reason() {
        notify_best_effort(
            state.notifier.as_ref(),
            FlagEvent {
                user_id: user.id,
                manager_id: user.manager_id,
                date,
                reason,
            },
        )
        .await;
    }

    Ok(Json(record.into()))
}

pub async fn check_out(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CheckOutRequest>,
) -> Result<Json<AttendanceResponse>, AppError> {
    payload.validate()?;

    let position = GeoPoint::new(payload.lat, payload.lng);
    let now_local = time::now_in_timezone(&state.config.time_zone);
    let date = now_local.date_naive();

    let branch = resolve_branch(&state, payload.branch_id, position).await?;

    let repo = AttendanceRepository::new();
    let mut record = repo
        .find_by_user_and_date(&state.pool, user.id, date)
        .await?
        .ok_or(AttendanceError::NoOpenCheckIn)
        .map_err(AppError::from)?;

    let eval = evaluate_check_out(
        &record,
        &branch,
        position,
        now_local.naive_local(),
        payload.half_day_type,
    )?;

    eval.apply_to(&mut record, Utc::now());
    let record = repo
        .apply_check_out(&state.pool, &record)
        .await?
        // Guarded update lost a race with another close.
        .ok_or(AttendanceError::AlreadyCheckedOut)
        .map_err(AppError::from)?;

    if let Some(reason) = record.flag_reason() {
        notify_best_effort(
            state.notifier.as_ref(),
            FlagEvent {
                user_id: user.id,
                manager_id: user.manager_id,
                date,
                reason,
            },
        )
        .await;
    }

    Ok(Json(record.into()))
}

pub async fn get_today(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Option<AttendanceResponse>>, AppError> {
    let date = time::today_local(&state.config.time_zone);
    let record = AttendanceRepository::new()
        .find_by_user_and_date(&state.pool, user.id, date)
        .await?;
    Ok(Json(record.map(Into::into)))
}

pub async fn get_my_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<AttendanceResponse>>, AppError> {
    let records = AttendanceRepository::new()
        .find_by_user_with_range_options(&state.pool, user.id, query.from, query.to)
        .await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}
