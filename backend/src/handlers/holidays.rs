//! Holiday directory administration.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        holiday::{CreateHolidayRequest, Holiday},
        user::User,
    },
    repositories::HolidayRepository,
    state::AppState,
    types::HolidayId,
};

pub async fn list_holidays(
    State(state): State<AppState>,
) -> Result<Json<Vec<Holiday>>, AppError> {
    let holidays = HolidayRepository::new().find_all(&state.pool).await?;
    Ok(Json(holidays))
}

pub async fn create_holiday(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Json(payload): Json<CreateHolidayRequest>,
) -> Result<(StatusCode, Json<Holiday>), AppError> {
    payload.validate()?;

    let holiday = Holiday::new(
        payload.holiday_date,
        payload.name,
        payload.is_recurring_sunday,
        Some(admin.id),
    );
    let created = HolidayRepository::new().create(&state.pool, &holiday).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_holiday(
    State(state): State<AppState>,
    Path(id): Path<HolidayId>,
) -> Result<StatusCode, AppError> {
    HolidayRepository::new().delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
