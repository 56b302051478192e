//! Nightly absentee marking.
//!
//! Backfills an attendance record for every active employee who never
//! checked in on the given date: `on-leave` when an approved leave request
//! covers the date, otherwise `absent` (flagged on holidays and Sundays).
//!
//! Safe to re-run: each per-employee unit is guarded by the existing-record
//! check and the `(user_id, date)` unique constraint, so a re-run after a
//! partial failure neither duplicates nor overwrites.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::jobs::store::AbsenteeStore;
use crate::models::attendance::AttendanceRecord;
use crate::services::notifier::{notify_best_effort, FlagEvent, FlagNotifierTrait};
use crate::services::status::{absentee_outcome, classify_day, DayKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsenteeSummary {
    pub date: NaiveDate,
    pub absentees: u32,
    pub on_leave: u32,
    pub total_processed: u32,
    pub failed: u32,
}

pub async fn run(
    store: &dyn AbsenteeStore,
    notifier: &dyn FlagNotifierTrait,
    date: NaiveDate,
) -> Result<AbsenteeSummary, AppError> {
    // Directory lookups are job-fatal; per-employee failures are not.
    let employees = store.active_employees().await?;
    let declared = store.declared_holiday(date).await?;
    let recurring = store.recurring_sunday_holiday().await?;
    let day = classify_day(date, declared.as_ref(), recurring.as_ref());

    if day != DayKind::Working {
        tracing::info!(%date, kind = ?day, "marking absentees on a holiday");
    }

    let mut summary = AbsenteeSummary {
        date,
        absentees: 0,
        on_leave: 0,
        total_processed: 0,
        failed: 0,
    };

    for employee in &employees {
        summary.total_processed += 1;

        let result = mark_one(store, notifier, employee, &day, date).await;
        match result {
            Ok(Some(Marked::Absent)) => summary.absentees += 1,
            Ok(Some(Marked::OnLeave)) => summary.on_leave += 1,
            Ok(None) => {}
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(
                    user_id = %employee.id,
                    emp_id = %employee.emp_id,
                    %date,
                    error = ?err,
                    "failed to backfill attendance record; continuing"
                );
            }
        }
    }

    tracing::info!(
        %date,
        absentees = summary.absentees,
        on_leave = summary.on_leave,
        total = summary.total_processed,
        failed = summary.failed,
        "absentee marking finished"
    );
    Ok(summary)
}

enum Marked {
    Absent,
    OnLeave,
}

async fn mark_one(
    store: &dyn AbsenteeStore,
    notifier: &dyn FlagNotifierTrait,
    employee: &crate::models::user::User,
    day: &DayKind,
    date: NaiveDate,
) -> Result<Option<Marked>, AppError> {
    if store.record_exists(employee.id, date).await? {
        return Ok(None);
    }

    let on_leave = store.has_approved_leave(employee.id, date).await?;
    let outcome = absentee_outcome(day, on_leave);

    let mut record = AttendanceRecord::new(employee.id, date, Utc::now());
    record.status = outcome.status;
    if let Some(flag) = outcome.flag.clone() {
        record.apply_flag(flag);
    }

    // A checked-in record created between our existence check and this
    // insert wins; the conflict is silently treated as already-processed.
    if !store.insert_absentee(&record).await? {
        return Ok(None);
    }

    if let Some(reason) = outcome.flag {
        notify_best_effort(
            notifier,
            FlagEvent {
                user_id: employee.id,
                manager_id: employee.manager_id,
                date,
                reason,
            },
        )
        .await;
    }

    Ok(Some(if on_leave {
        Marked::OnLeave
    } else {
        Marked::Absent
    }))
}
