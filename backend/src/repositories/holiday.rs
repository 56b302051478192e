//! Holiday directory.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::holiday::Holiday;
use crate::types::HolidayId;

const SELECT_COLUMNS: &str =
    "id, holiday_date, name, is_recurring_sunday, created_by, created_at, updated_at";

#[derive(Debug, Default, Clone, Copy)]
pub struct HolidayRepository;

impl HolidayRepository {
    pub fn new() -> Self {
        Self
    }

    /// Exact calendar-date match.
    pub async fn find_by_date(
        &self,
        db: &PgPool,
        date: NaiveDate,
    ) -> Result<Option<Holiday>, AppError> {
        let query = format!(
            "SELECT {} FROM holidays WHERE holiday_date = $1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Holiday>(&query)
            .bind(date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    /// Any recurring-Sunday declaration; applies to every Sunday.
    pub async fn find_recurring_sunday(&self, db: &PgPool) -> Result<Option<Holiday>, AppError> {
        let query = format!(
            "SELECT {} FROM holidays WHERE is_recurring_sunday = TRUE \
             ORDER BY holiday_date LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Holiday>(&query).fetch_optional(db).await?;
        Ok(row)
    }

    pub async fn find_all(&self, db: &PgPool) -> Result<Vec<Holiday>, AppError> {
        let query = format!(
            "SELECT {} FROM holidays ORDER BY holiday_date ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Holiday>(&query).fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn create(&self, db: &PgPool, holiday: &Holiday) -> Result<Holiday, AppError> {
        let query = format!(
            "INSERT INTO holidays (id, holiday_date, name, is_recurring_sunday, created_by, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Holiday>(&query)
            .bind(holiday.id)
            .bind(holiday.holiday_date)
            .bind(holiday.name.as_str())
            .bind(holiday.is_recurring_sunday)
            .bind(holiday.created_by)
            .bind(holiday.created_at)
            .bind(holiday.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    pub async fn delete(&self, db: &PgPool, id: HolidayId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM holidays WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
