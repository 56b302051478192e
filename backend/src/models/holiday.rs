use crate::types::{HolidayId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A declared holiday.
///
/// A date is an observed holiday when an exact-date row exists, or when a
/// row with `is_recurring_sunday` set exists and the date falls on a Sunday.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holiday {
    pub id: HolidayId,
    pub holiday_date: NaiveDate,
    pub name: String,
    pub is_recurring_sunday: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holiday {
    pub fn new(
        holiday_date: NaiveDate,
        name: String,
        is_recurring_sunday: bool,
        created_by: Option<UserId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: HolidayId::new(),
            holiday_date,
            name,
            is_recurring_sunday,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct CreateHolidayRequest {
    pub holiday_date: NaiveDate,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[serde(default)]
    pub is_recurring_sunday: bool,
}
