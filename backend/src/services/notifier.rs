//! Flagged-record notification signal.
//!
//! The determiner and batch jobs emit [`FlagEvent`]s; delivery is an external
//! concern and a failed delivery never rolls back the attendance write.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::attendance::FlagReason;
use crate::types::UserId;

#[derive(Debug, Clone, PartialEq)]
pub struct FlagEvent {
    pub user_id: UserId,
    pub manager_id: Option<UserId>,
    pub date: NaiveDate,
    pub reason: FlagReason,
}

#[async_trait]
pub trait FlagNotifierTrait: Send + Sync {
    async fn notify_flagged(&self, event: &FlagEvent) -> anyhow::Result<()>;
}

/// Default notifier: structured log line, picked up by ops tooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFlagNotifier;

#[async_trait]
impl FlagNotifierTrait for LogFlagNotifier {
    async fn notify_flagged(&self, event: &FlagEvent) -> anyhow::Result<()> {
        tracing::warn!(
            user_id = %event.user_id,
            manager_id = ?event.manager_id,
            date = %event.date,
            kind = ?event.reason.kind,
            message = %event.reason.message,
            "attendance record flagged for manager review"
        );
        Ok(())
    }
}

/// Fires the notifier without letting a delivery failure surface.
pub async fn notify_best_effort(notifier: &dyn FlagNotifierTrait, event: FlagEvent) {
    if let Err(err) = notifier.notify_flagged(&event).await {
        tracing::warn!(
            user_id = %event.user_id,
            error = %err,
            "flag notification delivery failed; attendance write is unaffected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::FlagKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingNotifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FlagNotifierTrait for FailingNotifier {
        async fn notify_flagged(&self, _event: &FlagEvent) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("delivery down")
        }
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let notifier = FailingNotifier {
            calls: AtomicUsize::new(0),
        };
        let event = FlagEvent {
            user_id: UserId::new(),
            manager_id: None,
            date: chrono::NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            reason: FlagReason::new(FlagKind::AutoCheckout, "auto-checkout applied"),
        };

        notify_best_effort(&notifier, event).await;
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let event = FlagEvent {
            user_id: UserId::new(),
            manager_id: Some(UserId::new()),
            date: chrono::NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            reason: FlagReason::new(FlagKind::OffHours, "late check-in"),
        };
        assert!(LogFlagNotifier.notify_flagged(&event).await.is_ok());
    }
}
