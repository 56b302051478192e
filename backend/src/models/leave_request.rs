use crate::types::{LeaveRequestId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl Default for LeaveStatus {
    fn default() -> Self {
        LeaveStatus::Pending
    }
}

impl LeaveRequest {
    /// Whether this request excuses the employee on the given date.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.start_date <= date && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: LeaveStatus) -> LeaveRequest {
        let now = Utc::now();
        LeaveRequest {
            id: LeaveRequestId::new(),
            user_id: UserId::new(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            reason: None,
            status,
            decided_by: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn approved_request_covers_dates_inclusive() {
        let req = request(LeaveStatus::Approved);
        assert!(req.covers(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()));
        assert!(req.covers(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()));
        assert!(!req.covers(NaiveDate::from_ymd_opt(2025, 3, 6).unwrap()));
    }

    #[test]
    fn pending_request_covers_nothing() {
        let req = request(LeaveStatus::Pending);
        assert!(!req.covers(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()));
    }
}
