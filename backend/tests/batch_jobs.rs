//! Nightly batch job behavior against in-memory stores: idempotence of
//! absentee marking, holiday and Sunday flagging, leave precedence,
//! approval protection in auto-checkout, and per-employee failure isolation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};

use geoattend_backend::error::AppError;
use geoattend_backend::jobs::{absentee, auto_checkout, AbsenteeStore, AutoCheckoutStore};
use geoattend_backend::models::attendance::{
    AttendanceRecord, AttendanceStatus, FlagKind, FlagReason,
};
use geoattend_backend::models::holiday::Holiday;
use geoattend_backend::models::user::{User, UserRole};
use geoattend_backend::services::attendance_cache::AttendanceCacheTrait;
use geoattend_backend::services::notifier::{FlagEvent, FlagNotifierTrait};
use geoattend_backend::types::{AttendanceId, UserId};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
}

fn employee(name: &str, manager_id: Option<UserId>) -> User {
    let now = Utc::now();
    User {
        id: UserId::new(),
        emp_id: format!("E-{name}"),
        username: name.to_string(),
        full_name: name.to_string(),
        role: UserRole::Employee,
        manager_id,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<FlagEvent>>,
}

#[async_trait]
impl FlagNotifierTrait for RecordingNotifier {
    async fn notify_flagged(&self, event: &FlagEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingCache {
    invalidations: Mutex<Vec<Vec<UserId>>>,
}

#[async_trait]
impl AttendanceCacheTrait for RecordingCache {
    async fn invalidate_users(&self, user_ids: &[UserId]) -> anyhow::Result<()> {
        self.invalidations.lock().unwrap().push(user_ids.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct MemAbsenteeStore {
    employees: Vec<User>,
    declared: HashMap<NaiveDate, Holiday>,
    recurring: Option<Holiday>,
    leaves: HashSet<(UserId, NaiveDate)>,
    records: Mutex<HashMap<(UserId, NaiveDate), AttendanceRecord>>,
    /// Leave lookups for these users fail, exercising failure isolation.
    failing_users: HashSet<UserId>,
}

#[async_trait]
impl AbsenteeStore for MemAbsenteeStore {
    async fn active_employees(&self) -> Result<Vec<User>, AppError> {
        Ok(self.employees.clone())
    }

    async fn declared_holiday(&self, date: NaiveDate) -> Result<Option<Holiday>, AppError> {
        Ok(self.declared.get(&date).cloned())
    }

    async fn recurring_sunday_holiday(&self) -> Result<Option<Holiday>, AppError> {
        Ok(self.recurring.clone())
    }

    async fn record_exists(&self, user_id: UserId, date: NaiveDate) -> Result<bool, AppError> {
        Ok(self.records.lock().unwrap().contains_key(&(user_id, date)))
    }

    async fn has_approved_leave(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<bool, AppError> {
        if self.failing_users.contains(&user_id) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "leave lookup unavailable"
            )));
        }
        Ok(self.leaves.contains(&(user_id, date)))
    }

    async fn insert_absentee(&self, record: &AttendanceRecord) -> Result<bool, AppError> {
        let mut records = self.records.lock().unwrap();
        let key = (record.user_id, record.date);
        if records.contains_key(&key) {
            return Ok(false);
        }
        records.insert(key, record.clone());
        Ok(true)
    }
}

impl MemAbsenteeStore {
    fn record_for(&self, user_id: UserId, date: NaiveDate) -> Option<AttendanceRecord> {
        self.records.lock().unwrap().get(&(user_id, date)).cloned()
    }
}

#[tokio::test]
async fn marks_absent_and_on_leave_and_skips_existing_records() {
    let absent = employee("asha", None);
    let on_leave = employee("bina", None);
    let checked_in = employee("chitra", None);

    let mut store = MemAbsenteeStore::default();
    store.leaves.insert((on_leave.id, monday()));
    let mut existing = AttendanceRecord::new(checked_in.id, monday(), Utc::now());
    existing.check_in_time = monday().and_hms_opt(9, 0, 0);
    store
        .records
        .lock()
        .unwrap()
        .insert((checked_in.id, monday()), existing);
    store.employees = vec![absent.clone(), on_leave.clone(), checked_in.clone()];

    let notifier = RecordingNotifier::default();
    let summary = absentee::run(&store, &notifier, monday()).await.unwrap();

    assert_eq!(summary.total_processed, 3);
    assert_eq!(summary.absentees, 1);
    assert_eq!(summary.on_leave, 1);
    assert_eq!(summary.failed, 0);

    let absent_record = store.record_for(absent.id, monday()).unwrap();
    assert_eq!(absent_record.status, AttendanceStatus::Absent);
    assert!(!absent_record.flagged, "working-day absence is not flagged");

    let leave_record = store.record_for(on_leave.id, monday()).unwrap();
    assert_eq!(leave_record.status, AttendanceStatus::OnLeave);
    assert!(!leave_record.flagged);

    // The checked-in employee's record was left alone.
    let kept = store.record_for(checked_in.id, monday()).unwrap();
    assert!(kept.check_in_time.is_some());

    assert!(notifier.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rerunning_the_job_changes_nothing() {
    let worker = employee("asha", None);
    let mut store = MemAbsenteeStore::default();
    store.employees = vec![worker.clone()];
    let notifier = RecordingNotifier::default();

    let first = absentee::run(&store, &notifier, monday()).await.unwrap();
    assert_eq!(first.absentees, 1);

    let second = absentee::run(&store, &notifier, monday()).await.unwrap();
    assert_eq!(second.absentees, 0);
    assert_eq!(second.on_leave, 0);
    assert_eq!(second.total_processed, 1);
    assert_eq!(store.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn holiday_absence_is_flagged_and_manager_is_notified() {
    let manager = UserId::new();
    let worker = employee("asha", Some(manager));
    let mut store = MemAbsenteeStore::default();
    store.employees = vec![worker.clone()];
    store.declared.insert(
        monday(),
        Holiday::new(monday(), "Holi".into(), false, None),
    );

    let notifier = RecordingNotifier::default();
    let summary = absentee::run(&store, &notifier, monday()).await.unwrap();
    assert_eq!(summary.absentees, 1);

    let record = store.record_for(worker.id, monday()).unwrap();
    assert_eq!(record.status, AttendanceStatus::Absent);
    assert_eq!(record.flag_kind, Some(FlagKind::HolidayAbsence));
    assert!(record.flag_message.as_deref().unwrap().contains("Holi"));

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, worker.id);
    assert_eq!(events[0].manager_id, Some(manager));
}

#[tokio::test]
async fn sunday_absence_is_flagged() {
    let worker = employee("asha", None);
    let mut store = MemAbsenteeStore::default();
    store.employees = vec![worker.clone()];

    let notifier = RecordingNotifier::default();
    absentee::run(&store, &notifier, sunday()).await.unwrap();

    let record = store.record_for(worker.id, sunday()).unwrap();
    assert_eq!(record.status, AttendanceStatus::Absent);
    assert_eq!(record.flag_kind, Some(FlagKind::SundayAbsence));
}

#[tokio::test]
async fn recurring_sunday_declaration_names_the_flag() {
    let worker = employee("asha", None);
    let mut store = MemAbsenteeStore::default();
    store.employees = vec![worker.clone()];
    store.recurring = Some(Holiday::new(sunday(), "Weekly Off".into(), true, None));

    let notifier = RecordingNotifier::default();
    absentee::run(&store, &notifier, sunday()).await.unwrap();

    let record = store.record_for(worker.id, sunday()).unwrap();
    assert_eq!(record.flag_kind, Some(FlagKind::SundayAbsence));
    assert!(record.flag_message.as_deref().unwrap().contains("Weekly Off"));
}

#[tokio::test]
async fn approved_leave_wins_over_holiday_flagging() {
    let worker = employee("asha", None);
    let mut store = MemAbsenteeStore::default();
    store.leaves.insert((worker.id, sunday()));
    store.employees = vec![worker.clone()];

    let notifier = RecordingNotifier::default();
    absentee::run(&store, &notifier, sunday()).await.unwrap();

    let record = store.record_for(worker.id, sunday()).unwrap();
    assert_eq!(record.status, AttendanceStatus::OnLeave);
    assert!(!record.flagged);
    assert!(notifier.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn one_failing_employee_does_not_stop_the_run() {
    let broken = employee("asha", None);
    let fine = employee("bina", None);
    let mut store = MemAbsenteeStore::default();
    store.failing_users.insert(broken.id);
    store.employees = vec![broken.clone(), fine.clone()];

    let notifier = RecordingNotifier::default();
    let summary = absentee::run(&store, &notifier, monday()).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.absentees, 1);
    assert!(store.record_for(broken.id, monday()).is_none());
    assert!(store.record_for(fine.id, monday()).is_some());
}

#[derive(Default)]
struct MemCheckoutStore {
    records: Mutex<Vec<AttendanceRecord>>,
    failing_ids: HashSet<AttendanceId>,
}

#[async_trait]
impl AutoCheckoutStore for MemCheckoutStore {
    async fn open_records(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.date == date && r.check_in_time.is_some())
            .cloned()
            .collect())
    }

    async fn close_record(
        &self,
        id: AttendanceId,
        check_out_time: NaiveDateTime,
        working_minutes: i32,
        flag: &FlagReason,
    ) -> Result<bool, AppError> {
        if self.failing_ids.contains(&id) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "write failed"
            )));
        }
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        if record.check_out_time.is_some() {
            return Ok(false);
        }
        record.check_out_time = Some(check_out_time);
        record.working_minutes = working_minutes;
        record.apply_flag(flag.clone());
        Ok(true)
    }
}

fn open_record(date: NaiveDate, check_in_hour: u32) -> AttendanceRecord {
    let mut record = AttendanceRecord::new(UserId::new(), date, Utc::now());
    record.check_in_time = date.and_hms_opt(check_in_hour, 0, 0);
    record
}

fn cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(21, 0, 0).unwrap()
}

#[tokio::test]
async fn closes_open_records_at_the_cutoff_and_invalidates_caches() {
    let a = open_record(monday(), 9);
    let b = open_record(monday(), 14);
    let store = MemCheckoutStore {
        records: Mutex::new(vec![a.clone(), b.clone()]),
        ..Default::default()
    };
    let notifier = RecordingNotifier::default();
    let cache = RecordingCache::default();

    let summary = auto_checkout::run(&store, &notifier, &cache, monday(), cutoff())
        .await
        .unwrap();

    assert_eq!(summary.closed, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.affected_users.len(), 2);

    let records = store.records.lock().unwrap();
    let closed_a = records.iter().find(|r| r.id == a.id).unwrap();
    assert_eq!(
        closed_a.check_out_time,
        monday().and_hms_opt(21, 0, 0),
    );
    assert_eq!(closed_a.working_minutes, 720);
    assert_eq!(closed_a.flag_kind, Some(FlagKind::AutoCheckout));
    // Status is left for the manager to settle.
    assert_eq!(closed_a.status, AttendanceStatus::Present);

    let closed_b = records.iter().find(|r| r.id == b.id).unwrap();
    assert_eq!(closed_b.working_minutes, 420);

    assert_eq!(notifier.events.lock().unwrap().len(), 2);
    let invalidations = cache.invalidations.lock().unwrap();
    assert_eq!(invalidations.len(), 1);
    assert_eq!(invalidations[0].len(), 2);
}

#[tokio::test]
async fn approved_records_are_never_touched() {
    let mut approved = open_record(monday(), 9);
    approved.approved_by = Some(UserId::new());
    approved.approved_at = Some(Utc::now());

    let store = MemCheckoutStore {
        records: Mutex::new(vec![approved.clone()]),
        ..Default::default()
    };
    let notifier = RecordingNotifier::default();
    let cache = RecordingCache::default();

    let summary = auto_checkout::run(&store, &notifier, &cache, monday(), cutoff())
        .await
        .unwrap();

    assert_eq!(summary.closed, 0);
    assert_eq!(summary.skipped, 1);
    let records = store.records.lock().unwrap();
    assert!(records[0].check_out_time.is_none());
    assert!(notifier.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rerunning_auto_checkout_skips_already_closed_records() {
    let store = MemCheckoutStore {
        records: Mutex::new(vec![open_record(monday(), 9)]),
        ..Default::default()
    };
    let notifier = RecordingNotifier::default();
    let cache = RecordingCache::default();

    let first = auto_checkout::run(&store, &notifier, &cache, monday(), cutoff())
        .await
        .unwrap();
    assert_eq!(first.closed, 1);

    let second = auto_checkout::run(&store, &notifier, &cache, monday(), cutoff())
        .await
        .unwrap();
    assert_eq!(second.closed, 0);
    assert_eq!(second.skipped, 1);
    assert!(second.affected_users.is_empty());
}

#[tokio::test]
async fn one_failing_close_does_not_stop_the_run() {
    let broken = open_record(monday(), 9);
    let fine = open_record(monday(), 10);
    let store = MemCheckoutStore {
        records: Mutex::new(vec![broken.clone(), fine.clone()]),
        failing_ids: HashSet::from([broken.id]),
    };
    let notifier = RecordingNotifier::default();
    let cache = RecordingCache::default();

    let summary = auto_checkout::run(&store, &notifier, &cache, monday(), cutoff())
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.closed, 1);
    assert_eq!(summary.affected_users, vec![fine.user_id]);
}
