//! Attendance record model and its API representations.
//!
//! The database row is the single canonical representation. The legacy
//! `branch`/`distance_from_branch` aliases expected by older clients are
//! populated only at the serialization step, in [`AttendanceResponse`].

use crate::types::{AttendanceId, BranchId, UserId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Final (or provisional, before check-out) status of a day's attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    HalfDay,
    OnLeave,
    OutsideDuty,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        AttendanceStatus::Present
    }
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::HalfDay => "half-day",
            AttendanceStatus::OnLeave => "on-leave",
            AttendanceStatus::OutsideDuty => "outside-duty",
        }
    }
}

/// Which half of the day a half-day record covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HalfDayType {
    Morning,
    Afternoon,
}

/// Why a record was flagged for manager review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// Check-in or check-out geolocation fell outside the branch geofence.
    LocationBreach,
    /// Check-in happened outside configured office hours.
    OffHours,
    /// The nightly job force-closed an open check-in.
    AutoCheckout,
    /// Absence fell on a declared holiday.
    HolidayAbsence,
    /// Absence fell on a Sunday.
    SundayAbsence,
}

/// Structured reason attached to a flagged record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagReason {
    #[serde(rename = "type")]
    pub kind: FlagKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

impl FlagReason {
    pub fn new(kind: FlagKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            distance_m: None,
        }
    }

    pub fn with_distance(kind: FlagKind, message: impl Into<String>, distance_m: f64) -> Self {
        Self {
            kind,
            message: message.into(),
            distance_m: Some(distance_m),
        }
    }
}

/// Which branch an event was validated against, and how far away it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchStamp {
    pub branch_id: BranchId,
    pub branch_name: String,
    pub distance_m: f64,
}

/// One attendance record per (employee, calendar date).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub user_id: UserId,
    pub date: NaiveDate,
    /// Wall-clock instants in the configured business time zone.
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    /// Minutes between check-in and check-out, clamped to >= 0.
    pub working_minutes: i32,
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    pub flagged: bool,
    pub flag_kind: Option<FlagKind>,
    pub flag_message: Option<String>,
    pub flag_distance_m: Option<f64>,
    pub check_in_branch_id: Option<BranchId>,
    pub check_in_branch_name: Option<String>,
    pub check_in_distance_m: Option<f64>,
    pub check_out_branch_id: Option<BranchId>,
    pub check_out_branch_name: Option<String>,
    pub check_out_distance_m: Option<f64>,
    /// Set when a manager has approved the record; approved records are
    /// never touched by the nightly auto-checkout.
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn new(user_id: UserId, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: AttendanceId::new(),
            user_id,
            date,
            check_in_time: None,
            check_out_time: None,
            status: AttendanceStatus::Present,
            working_minutes: 0,
            is_half_day: false,
            half_day_type: None,
            flagged: false,
            flag_kind: None,
            flag_message: None,
            flag_distance_m: None,
            check_in_branch_id: None,
            check_in_branch_name: None,
            check_in_distance_m: None,
            check_out_branch_id: None,
            check_out_branch_name: None,
            check_out_distance_m: None,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_open_check_in(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_none()
    }

    pub fn is_approved(&self) -> bool {
        self.approved_by.is_some()
    }

    pub fn flag_reason(&self) -> Option<FlagReason> {
        if !self.flagged {
            return None;
        }
        Some(FlagReason {
            kind: self.flag_kind?,
            message: self.flag_message.clone().unwrap_or_default(),
            distance_m: self.flag_distance_m,
        })
    }

    pub fn apply_flag(&mut self, reason: FlagReason) {
        self.flagged = true;
        self.flag_kind = Some(reason.kind);
        self.flag_message = Some(reason.message);
        self.flag_distance_m = reason.distance_m;
    }

    pub fn clear_flag(&mut self) {
        self.flagged = false;
        self.flag_kind = None;
        self.flag_message = None;
        self.flag_distance_m = None;
    }

    pub fn check_in_stamp(&self) -> Option<BranchStamp> {
        Some(BranchStamp {
            branch_id: self.check_in_branch_id?,
            branch_name: self.check_in_branch_name.clone()?,
            distance_m: self.check_in_distance_m?,
        })
    }

    pub fn check_out_stamp(&self) -> Option<BranchStamp> {
        Some(BranchStamp {
            branch_id: self.check_out_branch_id?,
            branch_name: self.check_out_branch_name.clone()?,
            distance_m: self.check_out_distance_m?,
        })
    }
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct CheckInRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// Branch the employee claims to be at; nearest active branch when unset.
    pub branch_id: Option<BranchId>,
}

#[derive(Debug, Deserialize, validator::Validate)]
pub struct CheckOutRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    pub branch_id: Option<BranchId>,
    pub half_day_type: Option<HalfDayType>,
}

/// API representation of an attendance record.
///
/// This is the explicit serialization step that also fills in the legacy
/// single-branch aliases (`branch`, `distance_from_branch`) kept for older
/// report consumers: the check-out stamp wins when present, otherwise the
/// check-in stamp is used.
#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub id: AttendanceId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub working_minutes: i32,
    pub is_half_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_day_type: Option<HalfDayType>,
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged_reason: Option<FlagReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_branch: Option<BranchStamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_branch: Option<BranchStamp>,
    pub approved: bool,
    // Legacy aliases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_branch: Option<f64>,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(record: AttendanceRecord) -> Self {
        let check_in_branch = record.check_in_stamp();
        let check_out_branch = record.check_out_stamp();
        let legacy = check_out_branch.clone().or_else(|| check_in_branch.clone());
        AttendanceResponse {
            id: record.id,
            user_id: record.user_id,
            date: record.date,
            check_in_time: record.check_in_time,
            check_out_time: record.check_out_time,
            status: record.status,
            working_minutes: record.working_minutes,
            is_half_day: record.is_half_day,
            half_day_type: record.half_day_type,
            flagged: record.flagged,
            flagged_reason: record.flag_reason(),
            check_in_branch,
            check_out_branch,
            approved: record.is_approved(),
            branch: legacy.as_ref().map(|stamp| stamp.branch_name.clone()),
            distance_from_branch: legacy.map(|stamp| stamp.distance_m),
        }
    }
}
