use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::SchedulingConfig;

use super::domain::{
    ConfirmedSignup, NewShift, NewVolunteer, Shift, ShiftId, Signup, SignupId, SignupStatus,
    Volunteer, VolunteerId, VolunteerUpdate,
};
use super::eligibility::{find_eligible, rank_by_reliability, CandidateSnapshot};
use super::locks::{LockTimeout, ScheduleLocks};
use super::notifications::{Notification, NotificationDispatcher};
use super::repository::{
    RepositoryError, ScheduleStore, ShiftFilter, SignupFilter, StatusTransition,
};
use super::rules::{ReasonCode, RuleEvaluator, SignupContext, Verdict};
use super::stats::VolunteerStats;
use super::views::{
    average_reliability, BroadcastReport, CoordinatorDashboard, ShiftFillStatus, SignupReceipt,
    SubstituteCandidate, SubstituteReport, ValidationReport, DASHBOARD_UPCOMING_SHIFTS,
};

/// Service composing the rule evaluator, the store, and the notification hook.
///
/// Every validate-and-persist runs inside a lock scope over the volunteer and the
/// shift, re-reading state after the scope is held.
pub struct SchedulingService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    evaluator: RuleEvaluator,
    locks: ScheduleLocks,
}

/// Store state for one (volunteer, shift) pair, read in a single pass.
struct PairSnapshot {
    shift: Option<Shift>,
    confirmed: Vec<ConfirmedSignup>,
    shift_confirmed: u32,
    existing: Option<Signup>,
}

impl PairSnapshot {
    fn context(&self, volunteer_id: VolunteerId) -> SignupContext<'_> {
        SignupContext {
            volunteer_id,
            shift: self.shift.as_ref(),
            confirmed: &self.confirmed,
            shift_confirmed: self.shift_confirmed,
            existing: self.existing.as_ref().map(|signup| signup.status),
        }
    }
}

impl<S, N> SchedulingService<S, N>
where
    S: ScheduleStore + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: SchedulingConfig) -> Self {
        Self {
            store,
            notifier,
            evaluator: RuleEvaluator::new(config.quota, config.signup_reuse),
            locks: ScheduleLocks::new(config.lock_timeout),
        }
    }

    pub fn evaluator(&self) -> &RuleEvaluator {
        &self.evaluator
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn locks(&self) -> &ScheduleLocks {
        &self.locks
    }

    /// Pure verdict for a prospective signup. Unknown shifts are a denial; unknown
    /// volunteers are an input error.
    pub fn validate(
        &self,
        volunteer_id: VolunteerId,
        shift_id: ShiftId,
    ) -> Result<Verdict, SchedulingError> {
        self.require_volunteer(volunteer_id)?;
        let snapshot = self.snapshot(volunteer_id, shift_id)?;
        let verdict = self.evaluator.evaluate(&snapshot.context(volunteer_id));
        debug!(%volunteer_id, %shift_id, ?verdict, "signup validated");
        Ok(verdict)
    }

    pub fn validation_report(
        &self,
        volunteer_id: VolunteerId,
        shift_id: ShiftId,
    ) -> Result<ValidationReport, SchedulingError> {
        let verdict = self.validate(volunteer_id, shift_id)?;
        let stats = self.stats(volunteer_id)?;
        Ok(ValidationReport { verdict, stats })
    }

    pub fn stats(&self, volunteer_id: VolunteerId) -> Result<VolunteerStats, SchedulingError> {
        self.require_volunteer(volunteer_id)?;
        let confirmed = self.store.confirmed_signups_for(volunteer_id)?;
        Ok(VolunteerStats::compute(&confirmed, self.evaluator.policy()))
    }

    /// Volunteers the rule table would accept onto the shift, in roster order.
    pub fn eligible(
        &self,
        shift_id: ShiftId,
        exclude: Option<VolunteerId>,
    ) -> Result<Vec<Volunteer>, SchedulingError> {
        let shift = self.require_shift(shift_id)?;
        let shift_confirmed = self.store.confirmed_count(shift_id)?;
        let population = self.store.volunteers()?;
        let store = &self.store;

        let eligible = find_eligible(
            &self.evaluator,
            &shift,
            shift_confirmed,
            population,
            exclude,
            |volunteer| -> Result<CandidateSnapshot, RepositoryError> {
                Ok(CandidateSnapshot {
                    confirmed: store.confirmed_signups_for(volunteer.id)?,
                    existing: store
                        .signup_for_pair(volunteer.id, shift_id)?
                        .map(|signup| signup.status),
                })
            },
        )?;

        debug!(%shift_id, candidates = eligible.len(), "eligibility search complete");
        Ok(eligible)
    }

    /// Eligible volunteers with their stats, most reliable first.
    pub fn substitutes(
        &self,
        shift_id: ShiftId,
        exclude: Option<VolunteerId>,
    ) -> Result<SubstituteReport, SchedulingError> {
        let shift = self.require_shift(shift_id)?;
        let mut eligible = self.eligible(shift_id, exclude)?;
        rank_by_reliability(&mut eligible);

        let available_substitutes = eligible
            .into_iter()
            .map(|volunteer| {
                let confirmed = self.store.confirmed_signups_for(volunteer.id)?;
                let stats = VolunteerStats::compute(&confirmed, self.evaluator.policy());
                Ok(SubstituteCandidate { volunteer, stats })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(SubstituteReport {
            shift,
            available_substitutes,
        })
    }

    /// Validate and persist a signup, then send the confirmation.
    pub fn signup(
        &self,
        volunteer_id: VolunteerId,
        shift_id: ShiftId,
    ) -> Result<SignupReceipt, SchedulingError> {
        let volunteer = self.require_volunteer(volunteer_id)?;
        self.require_shift(shift_id)?;

        let (signup, shift, stats) = {
            let _scope = self.locks.acquire(volunteer_id, shift_id)?;
            let snapshot = self.snapshot(volunteer_id, shift_id)?;

            if let Verdict::Deny(reason) = self.evaluator.evaluate(&snapshot.context(volunteer_id))
            {
                info!(%volunteer_id, %shift_id, %reason, "signup denied");
                return Err(SchedulingError::Denied(reason));
            }

            let PairSnapshot {
                shift,
                mut confirmed,
                existing,
                ..
            } = snapshot;
            let shift = shift.ok_or(SchedulingError::ShiftNotFound(shift_id))?;
            let signup = match existing {
                Some(previous) => self.store.transition_signup(
                    previous.id,
                    StatusTransition::between(previous.status, SignupStatus::Confirmed),
                )?,
                None => self.store.insert_signup(volunteer_id, shift_id)?,
            };

            // Receipt stats come from the locked snapshot; no store read follows the commit.
            confirmed.push(ConfirmedSignup::from_parts(&signup, &shift));
            let stats = VolunteerStats::compute(&confirmed, self.evaluator.policy());
            (signup, shift, stats)
        };

        info!(%volunteer_id, %shift_id, signup_id = %signup.id, "signup confirmed");
        self.dispatch(Notification::confirmation(&volunteer, &shift));

        Ok(SignupReceipt { signup, stats })
    }

    pub fn cancel(&self, signup_id: SignupId) -> Result<Signup, SchedulingError> {
        self.update_status(signup_id, SignupStatus::Cancelled)
    }

    /// Move a signup to `next`. Confirmed to no-show costs the volunteer reliability
    /// once; rewriting the current status is a no-op.
    pub fn update_status(
        &self,
        signup_id: SignupId,
        next: SignupStatus,
    ) -> Result<Signup, SchedulingError> {
        let current = self.require_signup(signup_id)?;
        if current.status == next {
            return Ok(current);
        }

        let previous = current.status;
        let updated = if next == SignupStatus::Confirmed {
            self.reinstate(current)?
        } else {
            let transition = StatusTransition::between(previous, next);
            let updated = self.store.transition_signup(signup_id, transition)?;
            if let Some(penalty) = transition.reliability_penalty {
                info!(
                    %signup_id,
                    volunteer_id = %updated.volunteer_id,
                    penalty,
                    "no-show recorded; reliability penalized"
                );
            }
            updated
        };

        info!(%signup_id, from = %previous, to = %updated.status, "signup status updated");

        match (previous, updated.status) {
            (SignupStatus::Confirmed, SignupStatus::Cancelled) => {
                self.notify_for(&updated, Notification::cancellation)
            }
            (_, SignupStatus::Confirmed) => self.notify_for(&updated, Notification::confirmation),
            _ => {}
        }

        Ok(updated)
    }

    pub fn signup_record(&self, signup_id: SignupId) -> Result<Signup, SchedulingError> {
        self.require_signup(signup_id)
    }

    pub fn signups(&self, filter: &SignupFilter) -> Result<Vec<Signup>, SchedulingError> {
        Ok(self.store.signups(filter)?)
    }

    pub fn register_volunteer(
        &self,
        volunteer: NewVolunteer,
    ) -> Result<Volunteer, SchedulingError> {
        if volunteer.name.trim().is_empty() || volunteer.phone.trim().is_empty() {
            return Err(SchedulingError::InvalidInput(
                "missing required fields: name, phone".to_string(),
            ));
        }
        let created = self.store.insert_volunteer(volunteer)?;
        info!(volunteer_id = %created.id, "volunteer registered");
        Ok(created)
    }

    pub fn update_volunteer(
        &self,
        volunteer_id: VolunteerId,
        update: VolunteerUpdate,
    ) -> Result<Volunteer, SchedulingError> {
        self.require_volunteer(volunteer_id)?;
        Ok(self.store.update_volunteer(volunteer_id, update)?)
    }

    pub fn delete_volunteer(&self, volunteer_id: VolunteerId) -> Result<(), SchedulingError> {
        self.require_volunteer(volunteer_id)?;
        self.store.delete_volunteer(volunteer_id)?;
        info!(%volunteer_id, "volunteer deleted with their signups");
        Ok(())
    }

    pub fn volunteer(&self, volunteer_id: VolunteerId) -> Result<Volunteer, SchedulingError> {
        self.require_volunteer(volunteer_id)
    }

    pub fn volunteers(&self) -> Result<Vec<Volunteer>, SchedulingError> {
        Ok(self.store.volunteers()?)
    }

    /// Volunteers at or above `min_score`, most reliable first.
    pub fn volunteers_by_reliability(
        &self,
        min_score: u32,
    ) -> Result<Vec<Volunteer>, SchedulingError> {
        let mut volunteers: Vec<Volunteer> = self
            .store
            .volunteers()?
            .into_iter()
            .filter(|volunteer| volunteer.reliability_score >= min_score)
            .collect();
        rank_by_reliability(&mut volunteers);
        Ok(volunteers)
    }

    pub fn create_shift(&self, shift: NewShift) -> Result<Shift, SchedulingError> {
        if shift.capacity == Some(0) {
            return Err(SchedulingError::InvalidInput(
                "capacity must be positive".to_string(),
            ));
        }
        let created = self.store.insert_shift(shift)?;
        info!(
            shift_id = %created.id,
            date = %created.date,
            shift_type = %created.shift_type,
            "shift created"
        );
        Ok(created)
    }

    pub fn update_shift_capacity(
        &self,
        shift_id: ShiftId,
        capacity: u32,
    ) -> Result<Shift, SchedulingError> {
        if capacity == 0 {
            return Err(SchedulingError::InvalidInput(
                "capacity must be positive".to_string(),
            ));
        }
        self.require_shift(shift_id)?;
        Ok(self.store.update_shift_capacity(shift_id, capacity)?)
    }

    pub fn delete_shift(&self, shift_id: ShiftId) -> Result<(), SchedulingError> {
        self.require_shift(shift_id)?;
        self.store.delete_shift(shift_id)?;
        info!(%shift_id, "shift deleted with its signups");
        Ok(())
    }

    pub fn shift(&self, shift_id: ShiftId) -> Result<Shift, SchedulingError> {
        self.require_shift(shift_id)
    }

    pub fn shifts(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, SchedulingError> {
        Ok(self.store.shifts(filter)?)
    }

    pub fn fill_status(&self) -> Result<Vec<ShiftFillStatus>, SchedulingError> {
        self.store
            .shifts(&ShiftFilter::default())?
            .into_iter()
            .map(|shift| {
                let confirmed = self.store.confirmed_count(shift.id)?;
                Ok(ShiftFillStatus::new(shift, confirmed))
            })
            .collect()
    }

    pub fn dashboard(&self) -> Result<CoordinatorDashboard, SchedulingError> {
        let volunteers = self.store.volunteers()?;
        let shifts = self.store.shifts(&ShiftFilter::default())?;
        let total_signups = self
            .store
            .signups(&SignupFilter {
                status: Some(SignupStatus::Confirmed),
                ..SignupFilter::default()
            })?
            .len();

        let mut understaffed_shifts = Vec::new();
        for shift in shifts.iter().take(DASHBOARD_UPCOMING_SHIFTS) {
            let confirmed = self.store.confirmed_count(shift.id)?;
            if let Some(entry) = ShiftFillStatus::new(shift.clone(), confirmed).understaffed() {
                understaffed_shifts.push(entry);
            }
        }

        Ok(CoordinatorDashboard {
            total_volunteers: volunteers.len(),
            total_signups,
            total_shifts: shifts.len(),
            average_reliability_score: average_reliability(&volunteers),
            understaffed_shifts,
        })
    }

    /// Send a free-form message to each listed volunteer. Unknown ids and failed
    /// deliveries are reported, not raised.
    pub fn broadcast(
        &self,
        volunteer_ids: &[VolunteerId],
        message: &str,
    ) -> Result<BroadcastReport, SchedulingError> {
        if volunteer_ids.is_empty() || message.trim().is_empty() {
            return Err(SchedulingError::InvalidInput(
                "missing volunteer_ids or message".to_string(),
            ));
        }

        let mut report = BroadcastReport::default();
        for &volunteer_id in volunteer_ids {
            let delivered = match self.store.volunteer(volunteer_id)? {
                Some(volunteer) => self.dispatch(Notification::custom(&volunteer, message)),
                None => false,
            };
            if delivered {
                report.sent += 1;
            } else {
                report.failed.push(volunteer_id);
            }
        }

        info!(sent = report.sent, failed = report.failed.len(), "broadcast finished");
        Ok(report)
    }

    /// Remind every confirmed volunteer on shifts dated `date`. Returns deliveries made.
    pub fn send_reminders(&self, date: NaiveDate) -> Result<usize, SchedulingError> {
        let shifts = self.store.shifts(&ShiftFilter {
            start_date: Some(date),
            end_date: Some(date),
            shift_type: None,
        })?;

        let mut delivered = 0;
        for shift in &shifts {
            let signups = self.store.signups(&SignupFilter {
                shift_id: Some(shift.id),
                status: Some(SignupStatus::Confirmed),
                volunteer_id: None,
            })?;
            for signup in signups {
                if let Some(volunteer) = self.store.volunteer(signup.volunteer_id)? {
                    if self.dispatch(Notification::reminder(&volunteer, shift)) {
                        delivered += 1;
                    }
                }
            }
        }

        info!(%date, delivered, "shift reminders sent");
        Ok(delivered)
    }

    fn reinstate(&self, current: Signup) -> Result<Signup, SchedulingError> {
        let _scope = self.locks.acquire(current.volunteer_id, current.shift_id)?;
        let current = self.require_signup(current.id)?;
        if current.status == SignupStatus::Confirmed {
            return Ok(current);
        }

        let snapshot = self.snapshot(current.volunteer_id, current.shift_id)?;
        let context = snapshot.context(current.volunteer_id);
        if let Verdict::Deny(reason) = self.evaluator.evaluate_reinstatement(&context) {
            info!(signup_id = %current.id, %reason, "reinstatement denied");
            return Err(SchedulingError::Denied(reason));
        }

        Ok(self.store.transition_signup(
            current.id,
            StatusTransition::between(current.status, SignupStatus::Confirmed),
        )?)
    }

    fn snapshot(
        &self,
        volunteer_id: VolunteerId,
        shift_id: ShiftId,
    ) -> Result<PairSnapshot, RepositoryError> {
        let shift = self.store.shift(shift_id)?;
        let (shift_confirmed, existing) = match &shift {
            Some(_) => (
                self.store.confirmed_count(shift_id)?,
                self.store.signup_for_pair(volunteer_id, shift_id)?,
            ),
            None => (0, None),
        };

        Ok(PairSnapshot {
            shift,
            confirmed: self.store.confirmed_signups_for(volunteer_id)?,
            shift_confirmed,
            existing,
        })
    }

    /// Runs after a committed change, so a failed lookup skips the message instead of
    /// failing the call.
    fn notify_for(&self, signup: &Signup, render: fn(&Volunteer, &Shift) -> Notification) {
        let lookup = self.store.volunteer(signup.volunteer_id).and_then(|volunteer| {
            Ok((volunteer, self.store.shift(signup.shift_id)?))
        });
        match lookup {
            Ok((Some(volunteer), Some(shift))) => {
                self.dispatch(render(&volunteer, &shift));
            }
            Ok(_) => {}
            Err(err) => warn!(
                signup_id = %signup.id,
                error = %err,
                "notification skipped; recipient lookup failed after commit"
            ),
        }
    }

    fn dispatch(&self, notification: Notification) -> bool {
        let volunteer_id = notification.volunteer_id;
        let event = notification.event;
        match self.notifier.notify(notification) {
            Ok(()) => true,
            Err(err) => {
                warn!(%volunteer_id, ?event, error = %err, "notification dispatch failed");
                false
            }
        }
    }

    fn require_volunteer(&self, id: VolunteerId) -> Result<Volunteer, SchedulingError> {
        self.store
            .volunteer(id)?
            .ok_or(SchedulingError::VolunteerNotFound(id))
    }

    fn require_shift(&self, id: ShiftId) -> Result<Shift, SchedulingError> {
        self.store
            .shift(id)?
            .ok_or(SchedulingError::ShiftNotFound(id))
    }

    fn require_signup(&self, id: SignupId) -> Result<Signup, SchedulingError> {
        self.store
            .signup(id)?
            .ok_or(SchedulingError::SignupNotFound(id))
    }
}

/// How a caller should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// A rule said no; try a different shift.
    Denial,
    /// The request referenced something missing or malformed.
    Input,
    /// The store or the serialization scope failed; retry.
    Infrastructure,
}

/// Error raised by the scheduling service.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("signup denied: {0}")]
    Denied(ReasonCode),
    #[error("volunteer {0} not found")]
    VolunteerNotFound(VolunteerId),
    #[error("shift {0} not found")]
    ShiftNotFound(ShiftId),
    #[error("signup {0} not found")]
    SignupNotFound(SignupId),
    #[error("referenced record no longer exists")]
    RecordNotFound,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    LockTimeout(#[from] LockTimeout),
    #[error("scheduling task did not complete: {0}")]
    TaskAborted(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl SchedulingError {
    pub fn class(&self) -> FailureClass {
        match self {
            SchedulingError::Denied(_) => FailureClass::Denial,
            SchedulingError::VolunteerNotFound(_)
            | SchedulingError::ShiftNotFound(_)
            | SchedulingError::SignupNotFound(_)
            | SchedulingError::RecordNotFound
            | SchedulingError::InvalidInput(_)
            | SchedulingError::Conflict(_) => FailureClass::Input,
            SchedulingError::LockTimeout(_)
            | SchedulingError::TaskAborted(_)
            | SchedulingError::Repository(_) => FailureClass::Infrastructure,
        }
    }
}

impl From<RepositoryError> for SchedulingError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict(detail) => SchedulingError::Conflict(detail),
            RepositoryError::NotFound => SchedulingError::RecordNotFound,
            RepositoryError::StaleStatus { current } => SchedulingError::Conflict(format!(
                "signup status changed concurrently (now {current})"
            )),
            other => SchedulingError::Repository(other),
        }
    }
}
