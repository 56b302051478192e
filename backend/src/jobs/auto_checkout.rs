//! Nightly auto-checkout.
//!
//! Force-closes every open check-in at the configured end-of-day cutoff,
//! computes working minutes, and flags the record for manager verification.
//! The 5-hour status rule is deliberately not applied here: the status is
//! left for the manager to settle.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::error::AppError;
use crate::jobs::store::AutoCheckoutStore;
use crate::models::attendance::{FlagKind, FlagReason};
use crate::services::attendance_cache::AttendanceCacheTrait;
use crate::services::notifier::{notify_best_effort, FlagEvent, FlagNotifierTrait};
use crate::services::status::working_minutes_between;
use crate::types::UserId;
use crate::utils::time::at_local_time;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoCheckoutSummary {
    pub date: NaiveDate,
    pub closed: u32,
    pub skipped: u32,
    pub failed: u32,
    /// Users whose records changed; handed to the read-cache for eviction.
    pub affected_users: Vec<UserId>,
}

pub async fn run(
    store: &dyn AutoCheckoutStore,
    notifier: &dyn FlagNotifierTrait,
    cache: &dyn AttendanceCacheTrait,
    date: NaiveDate,
    cutoff: NaiveTime,
) -> Result<AutoCheckoutSummary, AppError> {
    let open = store.open_records(date).await?;
    let cutoff_instant = at_local_time(date, cutoff);

    let mut summary = AutoCheckoutSummary {
        date,
        closed: 0,
        skipped: 0,
        failed: 0,
        affected_users: Vec::new(),
    };

    for record in open {
        // Approval protection: a record the manager has already settled is
        // never touched, even if its check-out is somehow still null.
        if record.is_approved() && !record.flagged {
            summary.skipped += 1;
            continue;
        }
        // Defends against a concurrent check-out between query and write.
        if record.check_out_time.is_some() {
            summary.skipped += 1;
            continue;
        }
        let Some(check_in_time) = record.check_in_time else {
            summary.skipped += 1;
            continue;
        };

        let working_minutes = working_minutes_between(check_in_time, cutoff_instant);
        let flag = FlagReason::new(
            FlagKind::AutoCheckout,
            "Auto-checkout applied; needs manager verification",
        );

        match store
            .close_record(record.id, cutoff_instant, working_minutes, &flag)
            .await
        {
            Ok(true) => {
                summary.closed += 1;
                summary.affected_users.push(record.user_id);
                notify_best_effort(
                    notifier,
                    FlagEvent {
                        user_id: record.user_id,
                        manager_id: None,
                        date,
                        reason: flag,
                    },
                )
                .await;
            }
            Ok(false) => summary.skipped += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(
                    user_id = %record.user_id,
                    %date,
                    error = ?err,
                    "failed to auto-close open check-in; continuing"
                );
            }
        }
    }

    if let Err(err) = cache.invalidate_users(&summary.affected_users).await {
        tracing::warn!(error = %err, "attendance cache invalidation failed");
    }

    tracing::info!(
        %date,
        closed = summary.closed,
        skipped = summary.skipped,
        failed = summary.failed,
        "auto-checkout finished"
    );
    Ok(summary)
}
