//! Employee directory.

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::user::{User, UserRole};
use crate::types::UserId;

const SELECT_COLUMNS: &str =
    "id, emp_id, username, full_name, role, manager_id, is_active, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(&self, db: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    /// Active accounts with the given role, ordered by employee number.
    pub async fn find_active_by_role(
        &self,
        db: &PgPool,
        role: UserRole,
    ) -> Result<Vec<User>, AppError> {
        let query = format!(
            "SELECT {} FROM users WHERE role = $1 AND is_active = TRUE ORDER BY emp_id",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, User>(&query)
            .bind(role)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }
}
