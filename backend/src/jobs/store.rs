//! Persistence seams for the nightly batch jobs.
//!
//! The jobs are written against these narrow traits so their idempotence and
//! flagging behavior can be exercised with in-memory stores; the Postgres
//! adapter wires them to the repositories.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::attendance::{AttendanceRecord, FlagReason};
use crate::models::holiday::Holiday;
use crate::models::user::{User, UserRole};
use crate::repositories::{
    AttendanceRepository, AttendanceRepositoryTrait, HolidayRepository, LeaveRequestRepository,
    UserRepository,
};
use crate::types::{AttendanceId, UserId};

#[async_trait]
pub trait AbsenteeStore: Send + Sync {
    /// Active accounts with the employee role.
    async fn active_employees(&self) -> Result<Vec<User>, AppError>;

    /// Exact-date holiday declaration, if any.
    async fn declared_holiday(&self, date: NaiveDate) -> Result<Option<Holiday>, AppError>;

    /// Recurring-Sunday holiday declaration, if any.
    async fn recurring_sunday_holiday(&self) -> Result<Option<Holiday>, AppError>;

    async fn record_exists(&self, user_id: UserId, date: NaiveDate) -> Result<bool, AppError>;

    async fn has_approved_leave(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<bool, AppError>;

    /// Inserts unless a record already exists for the (user, date) key.
    /// Returns `false` when the row was already there (re-run or race).
    async fn insert_absentee(&self, record: &AttendanceRecord) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AutoCheckoutStore: Send + Sync {
    /// Records for the date with a check-in and no check-out.
    async fn open_records(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, AppError>;

    /// Force-closes one record; `false` when it was already closed.
    async fn close_record(
        &self,
        id: AttendanceId,
        check_out_time: NaiveDateTime,
        working_minutes: i32,
        flag: &FlagReason,
    ) -> Result<bool, AppError>;
}

/// Postgres adapter used by the scheduler and the ops binaries.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
    attendance: AttendanceRepository,
    users: UserRepository,
    holidays: HolidayRepository,
    leave_requests: LeaveRequestRepository,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            attendance: AttendanceRepository::new(),
            users: UserRepository::new(),
            holidays: HolidayRepository::new(),
            leave_requests: LeaveRequestRepository::new(),
        }
    }
}

#[async_trait]
impl AbsenteeStore for PgJobStore {
    async fn active_employees(&self) -> Result<Vec<User>, AppError> {
        self.users
            .find_active_by_role(&self.pool, UserRole::Employee)
            .await
    }

    async fn declared_holiday(&self, date: NaiveDate) -> Result<Option<Holiday>, AppError> {
        self.holidays.find_by_date(&self.pool, date).await
    }

    async fn recurring_sunday_holiday(&self) -> Result<Option<Holiday>, AppError> {
        self.holidays.find_recurring_sunday(&self.pool).await
    }

    async fn record_exists(&self, user_id: UserId, date: NaiveDate) -> Result<bool, AppError> {
        let record = self
            .attendance
            .find_by_user_and_date(&self.pool, user_id, date)
            .await?;
        Ok(record.is_some())
    }

    async fn has_approved_leave(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<bool, AppError> {
        let leave = self
            .leave_requests
            .find_approved_covering(&self.pool, user_id, date)
            .await?;
        Ok(leave.is_some())
    }

    async fn insert_absentee(&self, record: &AttendanceRecord) -> Result<bool, AppError> {
        let inserted = self.attendance.insert_if_absent(&self.pool, record).await?;
        Ok(inserted.is_some())
    }
}

#[async_trait]
impl AutoCheckoutStore for PgJobStore {
    async fn open_records(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, AppError> {
        self.attendance.find_open_for_date(&self.pool, date).await
    }

    async fn close_record(
        &self,
        id: AttendanceId,
        check_out_time: NaiveDateTime,
        working_minutes: i32,
        flag: &FlagReason,
    ) -> Result<bool, AppError> {
        self.attendance
            .close_open_record(&self.pool, id, check_out_time, working_minutes, flag)
            .await
    }
}
