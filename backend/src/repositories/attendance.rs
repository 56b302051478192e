//! Attendance record store.
//!
//! All mutations funnel through `insert_if_absent` and guarded updates so
//! that concurrent check-in races resolve deterministically on the
//! `(user_id, date)` unique constraint: the loser of an insert race gets
//! `None` back and retries as a read.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::attendance::{AttendanceRecord, FlagReason};
use crate::types::{AttendanceId, UserId};

const SELECT_COLUMNS: &str = "id, user_id, date, check_in_time, check_out_time, status, \
     working_minutes, is_half_day, half_day_type, flagged, flag_kind, flag_message, \
     flag_distance_m, check_in_branch_id, check_in_branch_name, check_in_distance_m, \
     check_out_branch_id, check_out_branch_name, check_out_distance_m, approved_by, \
     approved_at, created_at, updated_at";

/// Repository trait for attendance records.
///
/// Mockable with mockall in unit tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceRepositoryTrait: Send + Sync {
    /// Find the record for one (user, date) key.
    async fn find_by_user_and_date(
        &self,
        db: &PgPool,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    /// Find a record by ID.
    async fn find_by_id(
        &self,
        db: &PgPool,
        id: AttendanceId,
    ) -> Result<AttendanceRecord, AppError>;

    /// Insert a new record unless one already exists for its (user, date)
    /// key. Returns `None` when a concurrent writer won the race.
    async fn insert_if_absent(
        &self,
        db: &PgPool,
        record: &AttendanceRecord,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    /// Full-row update keyed by ID.
    async fn update(
        &self,
        db: &PgPool,
        record: &AttendanceRecord,
    ) -> Result<AttendanceRecord, AppError>;

    /// Update guarded by "check-out still null"; `None` means another
    /// writer closed the record first.
    async fn apply_check_out(
        &self,
        db: &PgPool,
        record: &AttendanceRecord,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    /// Records for a date with a check-in and no check-out.
    async fn find_open_for_date(
        &self,
        db: &PgPool,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;

    /// Force-close one open record at the given instant. Returns `false`
    /// when the record was already closed (idempotence guard).
    async fn close_open_record(
        &self,
        db: &PgPool,
        id: AttendanceId,
        check_out_time: NaiveDateTime,
        working_minutes: i32,
        flag: &FlagReason,
    ) -> Result<bool, AppError>;

    /// Flagged records for a date, for the manager review queue.
    async fn find_flagged_for_date(
        &self,
        db: &PgPool,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;

    /// A user's records, optionally bounded by an inclusive date range.
    async fn find_by_user_with_range_options(
        &self,
        db: &PgPool,
        user_id: UserId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AppError>;
}

/// Concrete Postgres implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttendanceRepository;

impl AttendanceRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AttendanceRepositoryTrait for AttendanceRepository {
    async fn find_by_user_and_date(
        &self,
        db: &PgPool,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM attendance WHERE user_id = $1 AND date = $2",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_by_id(
        &self,
        db: &PgPool,
        id: AttendanceId,
    ) -> Result<AttendanceRecord, AppError> {
        let query = format!("SELECT {} FROM attendance WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;
        Ok(row)
    }

    async fn insert_if_absent(
        &self,
        db: &PgPool,
        record: &AttendanceRecord,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let query = format!(
            "INSERT INTO attendance (id, user_id, date, check_in_time, check_out_time, status, \
             working_minutes, is_half_day, half_day_type, flagged, flag_kind, flag_message, \
             flag_distance_m, check_in_branch_id, check_in_branch_name, check_in_distance_m, \
             check_out_branch_id, check_out_branch_name, check_out_distance_m, approved_by, \
             approved_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21, $22, $23) \
             ON CONFLICT ON CONSTRAINT attendance_user_date_key DO NOTHING \
             RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(record.id)
            .bind(record.user_id)
            .bind(record.date)
            .bind(record.check_in_time)
            .bind(record.check_out_time)
            .bind(record.status)
            .bind(record.working_minutes)
            .bind(record.is_half_day)
            .bind(record.half_day_type)
            .bind(record.flagged)
            .bind(record.flag_kind)
            .bind(record.flag_message.as_deref())
            .bind(record.flag_distance_m)
            .bind(record.check_in_branch_id)
            .bind(record.check_in_branch_name.as_deref())
            .bind(record.check_in_distance_m)
            .bind(record.check_out_branch_id)
            .bind(record.check_out_branch_name.as_deref())
            .bind(record.check_out_distance_m)
            .bind(record.approved_by)
            .bind(record.approved_at)
            .bind(record.created_at)
            .bind(record.updated_at)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn update(
        &self,
        db: &PgPool,
        record: &AttendanceRecord,
    ) -> Result<AttendanceRecord, AppError> {
        let query = format!(
            "UPDATE attendance SET check_in_time = $2, check_out_time = $3, status = $4, \
             working_minutes = $5, is_half_day = $6, half_day_type = $7, flagged = $8, \
             flag_kind = $9, flag_message = $10, flag_distance_m = $11, \
             check_in_branch_id = $12, check_in_branch_name = $13, check_in_distance_m = $14, \
             check_out_branch_id = $15, check_out_branch_name = $16, check_out_distance_m = $17, \
             approved_by = $18, approved_at = $19, updated_at = $20 \
             WHERE id = $1 RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(record.id)
            .bind(record.check_in_time)
            .bind(record.check_out_time)
            .bind(record.status)
            .bind(record.working_minutes)
            .bind(record.is_half_day)
            .bind(record.half_day_type)
            .bind(record.flagged)
            .bind(record.flag_kind)
            .bind(record.flag_message.as_deref())
            .bind(record.flag_distance_m)
            .bind(record.check_in_branch_id)
            .bind(record.check_in_branch_name.as_deref())
            .bind(record.check_in_distance_m)
            .bind(record.check_out_branch_id)
            .bind(record.check_out_branch_name.as_deref())
            .bind(record.check_out_distance_m)
            .bind(record.approved_by)
            .bind(record.approved_at)
            .bind(record.updated_at)
            .fetch_one(db)
            .await?;
        Ok(row)
    }

    async fn apply_check_out(
        &self,
        db: &PgPool,
        record: &AttendanceRecord,
    ) -> Result<Option<AttendanceRecord>, AppError> {
        let query = format!(
            "UPDATE attendance SET check_out_time = $2, status = $3, working_minutes = $4, \
             is_half_day = $5, half_day_type = $6, flagged = $7, flag_kind = $8, \
             flag_message = $9, flag_distance_m = $10, check_out_branch_id = $11, \
             check_out_branch_name = $12, check_out_distance_m = $13, updated_at = $14 \
             WHERE id = $1 AND check_out_time IS NULL RETURNING {}",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(record.id)
            .bind(record.check_out_time)
            .bind(record.status)
            .bind(record.working_minutes)
            .bind(record.is_half_day)
            .bind(record.half_day_type)
            .bind(record.flagged)
            .bind(record.flag_kind)
            .bind(record.flag_message.as_deref())
            .bind(record.flag_distance_m)
            .bind(record.check_out_branch_id)
            .bind(record.check_out_branch_name.as_deref())
            .bind(record.check_out_distance_m)
            .bind(record.updated_at)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }

    async fn find_open_for_date(
        &self,
        db: &PgPool,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM attendance \
             WHERE date = $1 AND check_in_time IS NOT NULL AND check_out_time IS NULL \
             ORDER BY user_id",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(date)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn close_open_record(
        &self,
        db: &PgPool,
        id: AttendanceId,
        check_out_time: NaiveDateTime,
        working_minutes: i32,
        flag: &FlagReason,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE attendance SET check_out_time = $2, working_minutes = $3, flagged = TRUE, \
             flag_kind = $4, flag_message = $5, flag_distance_m = $6, updated_at = $7 \
             WHERE id = $1 AND check_out_time IS NULL",
        )
        .bind(id)
        .bind(check_out_time)
        .bind(working_minutes)
        .bind(flag.kind)
        .bind(flag.message.as_str())
        .bind(flag.distance_m)
        .bind(Utc::now())
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_flagged_for_date(
        &self,
        db: &PgPool,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let query = format!(
            "SELECT {} FROM attendance WHERE date = $1 AND flagged = TRUE ORDER BY user_id",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceRecord>(&query)
            .bind(date)
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    async fn find_by_user_with_range_options(
        &self,
        db: &PgPool,
        user_id: UserId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        use sqlx::{Postgres, QueryBuilder};
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM attendance WHERE user_id = ",
            SELECT_COLUMNS
        ));
        builder.push_bind(user_id);

        if let Some(f) = from {
            builder.push(" AND date >= ").push_bind(f);
        }
        if let Some(t) = to {
            builder.push(" AND date <= ").push_bind(t);
        }
        builder.push(" ORDER BY date DESC");

        let rows = builder
            .build_query_as::<AttendanceRecord>()
            .fetch_all(db)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_attendance_repository_can_be_created() {
        let _mock = MockAttendanceRepositoryTrait::new();
    }

    #[test]
    fn mock_attendance_repository_trait_bounds() {
        fn check_send_sync<T: Send + Sync>() {}
        check_send_sync::<MockAttendanceRepositoryTrait>();
    }
}
