//! Attendance state determiner.
//!
//! Pure decision logic: given a check-in/check-out attempt (or an absentee
//! backfill), compute the resulting status, flags, and distance fields.
//! No IO happens here; handlers and batch jobs persist the outcome.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AttendanceError;
use crate::models::attendance::{
    AttendanceRecord, AttendanceStatus, BranchStamp, FlagKind, FlagReason, HalfDayType,
};
use crate::models::branch::{Branch, GeoPoint};
use crate::models::holiday::Holiday;
use crate::services::geo::haversine_distance_m;
use crate::utils::time::{is_sunday, is_within_attendance_window, is_within_office_hours};

/// Working time at or below this many minutes makes the day a half-day.
pub const HALF_DAY_THRESHOLD_MIN: i32 = 300;

/// Office-hour bounds the determiner checks check-ins against.
#[derive(Debug, Clone, Copy)]
pub struct StatusRules {
    pub office_open_hour: u32,
    pub office_close_hour: u32,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self {
            office_open_hour: 9,
            office_close_hour: 20,
        }
    }
}

impl From<&crate::config::Config> for StatusRules {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            office_open_hour: config.office_open_hour,
            office_close_hour: config.office_close_hour,
        }
    }
}

/// Outcome of a check-in attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInEvaluation {
    pub check_in_time: NaiveDateTime,
    pub status: AttendanceStatus,
    pub flag: Option<FlagReason>,
    pub stamp: BranchStamp,
}

/// Outcome of a check-out attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutEvaluation {
    pub check_out_time: NaiveDateTime,
    pub status: AttendanceStatus,
    pub working_minutes: i32,
    pub is_half_day: bool,
    pub half_day_type: Option<HalfDayType>,
    pub flag: Option<FlagReason>,
    pub stamp: BranchStamp,
}

impl CheckInEvaluation {
    /// Writes this outcome into the day's record.
    pub fn apply_to(&self, record: &mut AttendanceRecord, now: chrono::DateTime<chrono::Utc>) {
        record.check_in_time = Some(self.check_in_time);
        record.status = self.status;
        match self.flag.clone() {
            Some(flag) => record.apply_flag(flag),
            None => record.clear_flag(),
        }
        record.check_in_branch_id = Some(self.stamp.branch_id);
        record.check_in_branch_name = Some(self.stamp.branch_name.clone());
        record.check_in_distance_m = Some(self.stamp.distance_m);
        record.updated_at = now;
    }
}

impl CheckOutEvaluation {
    /// Writes this outcome into the day's record.
    pub fn apply_to(&self, record: &mut AttendanceRecord, now: chrono::DateTime<chrono::Utc>) {
        record.check_out_time = Some(self.check_out_time);
        record.status = self.status;
        record.working_minutes = self.working_minutes;
        record.is_half_day = self.is_half_day;
        record.half_day_type = self.half_day_type;
        if let Some(flag) = self.flag.clone() {
            record.apply_flag(flag);
        }
        record.check_out_branch_id = Some(self.stamp.branch_id);
        record.check_out_branch_name = Some(self.stamp.branch_name.clone());
        record.check_out_distance_m = Some(self.stamp.distance_m);
        record.updated_at = now;
    }
}

fn stamp_against(branch: &Branch, position: GeoPoint) -> BranchStamp {
    BranchStamp {
        branch_id: branch.id,
        branch_name: branch.name.clone(),
        distance_m: haversine_distance_m(position, branch.location()),
    }
}

/// Decides what a check-in attempt does to the day's record.
///
/// Rejects when a record for the day already carries a check-in. A geofence
/// breach is not a rejection: the record is created as `outside-duty` and
/// flagged, with branch and distance stored for audit.
pub fn evaluate_check_in(
    rules: &StatusRules,
    existing: Option<&AttendanceRecord>,
    branch: &Branch,
    position: GeoPoint,
    now_local: NaiveDateTime,
) -> Result<CheckInEvaluation, AttendanceError> {
    if !is_within_attendance_window(&now_local.time()) {
        return Err(AttendanceError::OutsideAttendanceWindow);
    }
    if existing.is_some_and(|record| record.check_in_time.is_some()) {
        return Err(AttendanceError::DuplicateCheckIn);
    }

    let stamp = stamp_against(branch, position);

    // Distance exactly equal to the radius is inside the fence.
    if stamp.distance_m > branch.radius_m {
        return Ok(CheckInEvaluation {
            check_in_time: now_local,
            status: AttendanceStatus::OutsideDuty,
            flag: Some(FlagReason::with_distance(
                FlagKind::LocationBreach,
                format!(
                    "Check-in {:.0} m from {} (allowed {:.0} m)",
                    stamp.distance_m, stamp.branch_name, branch.radius_m
                ),
                stamp.distance_m,
            )),
            stamp,
        });
    }

    if !is_within_office_hours(
        &now_local.time(),
        rules.office_open_hour,
        rules.office_close_hour,
    ) {
        // Provisional present; final status is resolved at check-out.
        return Ok(CheckInEvaluation {
            check_in_time: now_local,
            status: AttendanceStatus::Present,
            flag: Some(FlagReason::new(
                FlagKind::OffHours,
                format!("Check-in at {} is outside office hours", now_local.time()),
            )),
            stamp,
        });
    }

    Ok(CheckInEvaluation {
        check_in_time: now_local,
        status: AttendanceStatus::Present,
        flag: None,
        stamp,
    })
}

/// Decides what a check-out attempt does to the day's record.
///
/// Requires an open check-in. A geofence breach short-circuits to
/// `outside-duty` (flagged, no half-day marker); otherwise the 5-hour rule
/// decides between `half-day` (exactly 5 hours included) and `present`.
pub fn evaluate_check_out(
    record: &AttendanceRecord,
    branch: &Branch,
    position: GeoPoint,
    now_local: NaiveDateTime,
    half_day_type: Option<HalfDayType>,
) -> Result<CheckOutEvaluation, AttendanceError> {
    if !is_within_attendance_window(&now_local.time()) {
        return Err(AttendanceError::OutsideAttendanceWindow);
    }
    if record.check_out_time.is_some() {
        return Err(AttendanceError::AlreadyCheckedOut);
    }
    let Some(check_in_time) = record.check_in_time else {
        return Err(AttendanceError::NoOpenCheckIn);
    };

    let working_minutes = working_minutes_between(check_in_time, now_local);
    let stamp = stamp_against(branch, position);

    if stamp.distance_m > branch.radius_m {
        // The half-day marker belongs to the `half-day` status only; an
        // `outside-duty` record keeps the minutes but never the marker.
        return Ok(CheckOutEvaluation {
            check_out_time: now_local,
            status: AttendanceStatus::OutsideDuty,
            working_minutes,
            is_half_day: false,
            half_day_type: None,
            flag: Some(FlagReason::with_distance(
                FlagKind::LocationBreach,
                format!(
                    "Check-out {:.0} m from {} (allowed {:.0} m)",
                    stamp.distance_m, stamp.branch_name, branch.radius_m
                ),
                stamp.distance_m,
            )),
            stamp,
        });
    }

    let is_half_day = working_minutes <= HALF_DAY_THRESHOLD_MIN;
    let status = if is_half_day {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Present
    };

    Ok(CheckOutEvaluation {
        check_out_time: now_local,
        status,
        working_minutes,
        is_half_day,
        half_day_type: is_half_day.then_some(half_day_type).flatten(),
        flag: None,
        stamp,
    })
}

/// Whole minutes between check-in and check-out, clamped to >= 0.
pub fn working_minutes_between(check_in: NaiveDateTime, check_out: NaiveDateTime) -> i32 {
    (check_out - check_in).num_minutes().max(0) as i32
}

/// Holiday classification of a calendar date for absentee marking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayKind {
    Working,
    /// An exact-date holiday row exists.
    DeclaredHoliday(String),
    /// The date falls on a Sunday. Carries the recurring-Sunday holiday's
    /// name when one is declared; plain Sundays are still flagged.
    Sunday(Option<String>),
}

/// Classifies a date against the holiday directory lookups.
pub fn classify_day(
    date: NaiveDate,
    declared: Option<&Holiday>,
    recurring_sunday: Option<&Holiday>,
) -> DayKind {
    if let Some(holiday) = declared {
        return DayKind::DeclaredHoliday(holiday.name.clone());
    }
    if is_sunday(date) {
        return DayKind::Sunday(recurring_sunday.map(|holiday| holiday.name.clone()));
    }
    DayKind::Working
}

/// What the absentee batch writes for one employee with no record today.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsenteeOutcome {
    pub status: AttendanceStatus,
    pub flag: Option<FlagReason>,
}

/// Absentee rule: approved leave wins; otherwise absent, flagged when the
/// day is a holiday, with reasons distinguishing Sunday from declared.
pub fn absentee_outcome(day: &DayKind, on_leave: bool) -> AbsenteeOutcome {
    if on_leave {
        return AbsenteeOutcome {
            status: AttendanceStatus::OnLeave,
            flag: None,
        };
    }

    let flag = match day {
        DayKind::Working => None,
        DayKind::DeclaredHoliday(name) => Some(FlagReason::new(
            FlagKind::HolidayAbsence,
            format!("Absent on declared holiday: {}", name),
        )),
        DayKind::Sunday(name) => Some(FlagReason::new(
            FlagKind::SundayAbsence,
            match name {
                Some(name) => format!("Absent on Sunday holiday: {}", name),
                None => "Absent on Sunday".to_string(),
            },
        )),
    };

    AbsenteeOutcome {
        status: AttendanceStatus::Absent,
        flag,
    }
}
