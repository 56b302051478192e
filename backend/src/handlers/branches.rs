//! Branch directory: listing for clients, creation for admins.

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    error::AppError,
    models::branch::{Branch, CreateBranchRequest, GeoPoint},
    repositories::BranchRepository,
    state::AppState,
};

pub async fn list_branches(State(state): State<AppState>) -> Result<Json<Vec<Branch>>, AppError> {
    let branches = BranchRepository::new().find_active(&state.pool).await?;
    Ok(Json(branches))
}

pub async fn create_branch(
    State(state): State<AppState>,
    Json(payload): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<Branch>), AppError> {
    payload.validate()?;

    let branch = Branch::new(
        payload.name,
        GeoPoint::new(payload.lat, payload.lng),
        payload.radius_m,
    );
    let created = BranchRepository::new().create(&state.pool, &branch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
