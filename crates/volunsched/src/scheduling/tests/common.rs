use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::config::SchedulingConfig;
use crate::scheduling::domain::{
    day_name, week_of_month, ConfirmedSignup, NewShift, NewVolunteer, Shift, ShiftId, ShiftType,
    Signup, SignupId, SignupStatus, Volunteer, VolunteerId, VolunteerUpdate,
};
use crate::scheduling::notifications::{DispatchError, Notification, NotificationDispatcher};
use crate::scheduling::repository::{
    RepositoryError, ScheduleStore, ShiftFilter, SignupFilter, StatusTransition,
};
use crate::scheduling::{InMemoryScheduleStore, SchedulingService};

pub(super) type MemoryService = SchedulingService<InMemoryScheduleStore, RecordingNotifier>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// 2025-01-16 is a Thursday; the 13th through 15th and 17th are not.
pub(super) fn thursday() -> NaiveDate {
    date(2025, 1, 16)
}

pub(super) fn config() -> SchedulingConfig {
    SchedulingConfig {
        lock_timeout: Duration::from_secs(5),
        ..SchedulingConfig::default()
    }
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryScheduleStore>,
    Arc<RecordingNotifier>,
) {
    build_service_with(config())
}

pub(super) fn build_service_with(
    config: SchedulingConfig,
) -> (
    MemoryService,
    Arc<InMemoryScheduleStore>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(InMemoryScheduleStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let service = SchedulingService::new(store.clone(), notifier.clone(), config);
    (service, store, notifier)
}

pub(super) fn register<S, N>(
    service: &SchedulingService<S, N>,
    name: &str,
    phone: &str,
) -> Volunteer
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    service
        .register_volunteer(NewVolunteer {
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            reliability_score: None,
        })
        .expect("register volunteer")
}

pub(super) fn open_shift<S, N>(
    service: &SchedulingService<S, N>,
    date: NaiveDate,
    shift_type: ShiftType,
    capacity: Option<u32>,
) -> Shift
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    service
        .create_shift(NewShift {
            date,
            shift_type,
            capacity,
        })
        .expect("create shift")
}

/// Detached shift record for pure rule evaluation.
pub(super) fn shift_record(
    id: u64,
    date: NaiveDate,
    shift_type: ShiftType,
    capacity: u32,
) -> Shift {
    Shift {
        id: ShiftId(id),
        date,
        day_name: day_name(date),
        week_of_month: week_of_month(date),
        shift_type,
        capacity,
        created_at: Utc::now(),
    }
}

pub(super) fn confirmed(id: u64, date: NaiveDate, shift_type: ShiftType) -> ConfirmedSignup {
    ConfirmedSignup {
        signup_id: SignupId(id),
        shift_id: ShiftId(id),
        shift_type,
        date,
    }
}

pub(super) fn volunteer_record(id: u64, score: u32) -> Volunteer {
    Volunteer {
        id: VolunteerId(id),
        name: format!("Volunteer {id}"),
        phone: format!("+1555010{id}"),
        email: None,
        reliability_score: score,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationDispatcher for RecordingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), DispatchError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl NotificationDispatcher for FailingNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), DispatchError> {
        Err(DispatchError::Transport("gateway offline".to_string()))
    }
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl ScheduleStore for UnavailableStore {
    fn volunteer(&self, _id: VolunteerId) -> Result<Option<Volunteer>, RepositoryError> {
        offline()
    }

    fn volunteers(&self) -> Result<Vec<Volunteer>, RepositoryError> {
        offline()
    }

    fn insert_volunteer(&self, _volunteer: NewVolunteer) -> Result<Volunteer, RepositoryError> {
        offline()
    }

    fn update_volunteer(
        &self,
        _id: VolunteerId,
        _update: VolunteerUpdate,
    ) -> Result<Volunteer, RepositoryError> {
        offline()
    }

    fn shift(&self, _id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        offline()
    }

    fn shifts(&self, _filter: &ShiftFilter) -> Result<Vec<Shift>, RepositoryError> {
        offline()
    }

    fn insert_shift(&self, _shift: NewShift) -> Result<Shift, RepositoryError> {
        offline()
    }

    fn update_shift_capacity(
        &self,
        _id: ShiftId,
        _capacity: u32,
    ) -> Result<Shift, RepositoryError> {
        offline()
    }

    fn delete_volunteer(&self, _id: VolunteerId) -> Result<(), RepositoryError> {
        offline()
    }

    fn delete_shift(&self, _id: ShiftId) -> Result<(), RepositoryError> {
        offline()
    }

    fn confirmed_signups_for(
        &self,
        _volunteer: VolunteerId,
    ) -> Result<Vec<ConfirmedSignup>, RepositoryError> {
        offline()
    }

    fn confirmed_count(&self, _shift: ShiftId) -> Result<u32, RepositoryError> {
        offline()
    }

    fn signup(&self, _id: SignupId) -> Result<Option<Signup>, RepositoryError> {
        offline()
    }

    fn signup_for_pair(
        &self,
        _volunteer: VolunteerId,
        _shift: ShiftId,
    ) -> Result<Option<Signup>, RepositoryError> {
        offline()
    }

    fn signups(&self, _filter: &SignupFilter) -> Result<Vec<Signup>, RepositoryError> {
        offline()
    }

    fn insert_signup(
        &self,
        _volunteer: VolunteerId,
        _shift: ShiftId,
    ) -> Result<Signup, RepositoryError> {
        offline()
    }

    fn transition_signup(
        &self,
        _id: SignupId,
        _transition: StatusTransition,
    ) -> Result<Signup, RepositoryError> {
        offline()
    }
}

/// In-memory store whose volunteer, shift, and confirmed-signup reads go offline as
/// soon as a signup write commits.
#[derive(Default)]
pub(super) struct ReadsFailAfterCommit {
    inner: InMemoryScheduleStore,
    committed: AtomicBool,
}

impl ReadsFailAfterCommit {
    pub(super) fn inner(&self) -> &InMemoryScheduleStore {
        &self.inner
    }

    fn gate(&self) -> Result<(), RepositoryError> {
        if self.committed.load(Ordering::SeqCst) {
            offline()
        } else {
            Ok(())
        }
    }

    fn commit<T>(&self, result: Result<T, RepositoryError>) -> Result<T, RepositoryError> {
        if result.is_ok() {
            self.committed.store(true, Ordering::SeqCst);
        }
        result
    }
}

impl ScheduleStore for ReadsFailAfterCommit {
    fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, RepositoryError> {
        self.gate()?;
        self.inner.volunteer(id)
    }

    fn volunteers(&self) -> Result<Vec<Volunteer>, RepositoryError> {
        self.inner.volunteers()
    }

    fn insert_volunteer(&self, volunteer: NewVolunteer) -> Result<Volunteer, RepositoryError> {
        self.inner.insert_volunteer(volunteer)
    }

    fn update_volunteer(
        &self,
        id: VolunteerId,
        update: VolunteerUpdate,
    ) -> Result<Volunteer, RepositoryError> {
        self.inner.update_volunteer(id, update)
    }

    fn shift(&self, id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        self.gate()?;
        self.inner.shift(id)
    }

    fn shifts(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, RepositoryError> {
        self.inner.shifts(filter)
    }

    fn insert_shift(&self, shift: NewShift) -> Result<Shift, RepositoryError> {
        self.inner.insert_shift(shift)
    }

    fn update_shift_capacity(&self, id: ShiftId, capacity: u32) -> Result<Shift, RepositoryError> {
        self.inner.update_shift_capacity(id, capacity)
    }

    fn delete_volunteer(&self, id: VolunteerId) -> Result<(), RepositoryError> {
        self.inner.delete_volunteer(id)
    }

    fn delete_shift(&self, id: ShiftId) -> Result<(), RepositoryError> {
        self.inner.delete_shift(id)
    }

    fn confirmed_signups_for(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<ConfirmedSignup>, RepositoryError> {
        self.gate()?;
        self.inner.confirmed_signups_for(volunteer)
    }

    fn confirmed_count(&self, shift: ShiftId) -> Result<u32, RepositoryError> {
        self.inner.confirmed_count(shift)
    }

    fn signup(&self, id: SignupId) -> Result<Option<Signup>, RepositoryError> {
        self.inner.signup(id)
    }

    fn signup_for_pair(
        &self,
        volunteer: VolunteerId,
        shift: ShiftId,
    ) -> Result<Option<Signup>, RepositoryError> {
        self.inner.signup_for_pair(volunteer, shift)
    }

    fn signups(&self, filter: &SignupFilter) -> Result<Vec<Signup>, RepositoryError> {
        self.inner.signups(filter)
    }

    fn insert_signup(
        &self,
        volunteer: VolunteerId,
        shift: ShiftId,
    ) -> Result<Signup, RepositoryError> {
        self.commit(self.inner.insert_signup(volunteer, shift))
    }

    fn transition_signup(
        &self,
        id: SignupId,
        transition: StatusTransition,
    ) -> Result<Signup, RepositoryError> {
        self.commit(self.inner.transition_signup(id, transition))
    }
}

pub(super) fn status_of(store: &InMemoryScheduleStore, id: SignupId) -> SignupStatus {
    store
        .signup(id)
        .expect("read signup")
        .expect("signup present")
        .status
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
