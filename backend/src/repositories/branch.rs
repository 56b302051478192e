//! Branch directory. Read-only from the attendance engine's perspective.

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::branch::Branch;
use crate::types::BranchId;

const SELECT_COLUMNS: &str =
    "id, name, latitude, longitude, radius_m, is_active, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct BranchRepository;

impl BranchRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_active(&self, db: &PgPool) -> Result<Vec<Branch>, AppError> {
        let query = format!(
            "SELECT {} FROM branches WHERE is_active = TRUE ORDER BY name",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Branch>(&query).fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn find_active_by_id(
        &self,
        db: &PgPool,
        id: BranchId,
    ) -> Result<Option<Branch>, AppError> {
        let query = format!(
            "SELECT {} FROM branches WHERE id = $1 AND is_active = TRUE",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Branch>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, db: &PgPool, branch: &Branch) -> Result<Branch, AppError> {
        let query = format!(
            "INSERT INTO branches (id, name, latitude, longitude, radius_m, is_active, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Branch>(&query)
            .bind(branch.id)
            .bind(branch.name.as_str())
            .bind(branch.latitude)
            .bind(branch.longitude)
            .bind(branch.radius_m)
            .bind(branch.is_active)
            .bind(branch.created_at)
            .bind(branch.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }
}
