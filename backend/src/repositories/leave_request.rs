//! Leave directory. The attendance engine only asks one question of it:
//! does an approved request excuse this employee on this date?

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::leave_request::LeaveRequest;
use crate::types::UserId;

const SELECT_COLUMNS: &str = "id, user_id, start_date, end_date, reason, status, decided_by, \
     decided_at, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct LeaveRequestRepository;

impl LeaveRequestRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_approved_covering(
        &self,
        db: &PgPool,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<LeaveRequest>, AppError> {
        let query = format!(
            "SELECT {} FROM leave_requests \
             WHERE user_id = $1 AND status = 'approved' \
             AND start_date <= $2 AND end_date >= $2 \
             LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, LeaveRequest>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }
}
