use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{
    ConfirmedSignup, NewShift, NewVolunteer, Shift, ShiftId, ShiftType, Signup, SignupId,
    SignupStatus, Volunteer, VolunteerId, VolunteerUpdate,
};

/// Storage abstraction over volunteers, shifts, and signups.
///
/// Implementations must make `insert_signup` conditional on the pair being absent and
/// `transition_signup` conditional on the expected prior status, applying the status
/// write and any reliability penalty together or not at all.
pub trait ScheduleStore: Send + Sync {
    fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, RepositoryError>;
    fn volunteers(&self) -> Result<Vec<Volunteer>, RepositoryError>;
    fn insert_volunteer(&self, volunteer: NewVolunteer) -> Result<Volunteer, RepositoryError>;
    fn update_volunteer(
        &self,
        id: VolunteerId,
        update: VolunteerUpdate,
    ) -> Result<Volunteer, RepositoryError>;
    /// Removes the volunteer and every signup they own.
    fn delete_volunteer(&self, id: VolunteerId) -> Result<(), RepositoryError>;

    fn shift(&self, id: ShiftId) -> Result<Option<Shift>, RepositoryError>;
    fn shifts(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, RepositoryError>;
    fn insert_shift(&self, shift: NewShift) -> Result<Shift, RepositoryError>;
    fn update_shift_capacity(&self, id: ShiftId, capacity: u32) -> Result<Shift, RepositoryError>;
    /// Removes the shift and every signup referencing it.
    fn delete_shift(&self, id: ShiftId) -> Result<(), RepositoryError>;

    /// Confirmed signups of one volunteer joined with their shift's type and date.
    fn confirmed_signups_for(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<ConfirmedSignup>, RepositoryError>;
    fn confirmed_count(&self, shift: ShiftId) -> Result<u32, RepositoryError>;
    fn signup(&self, id: SignupId) -> Result<Option<Signup>, RepositoryError>;
    fn signup_for_pair(
        &self,
        volunteer: VolunteerId,
        shift: ShiftId,
    ) -> Result<Option<Signup>, RepositoryError>;
    /// Matching signups, newest first.
    fn signups(&self, filter: &SignupFilter) -> Result<Vec<Signup>, RepositoryError>;
    fn insert_signup(
        &self,
        volunteer: VolunteerId,
        shift: ShiftId,
    ) -> Result<Signup, RepositoryError>;
    fn transition_signup(
        &self,
        id: SignupId,
        transition: StatusTransition,
    ) -> Result<Signup, RepositoryError>;
}

/// Compare-and-set status change with an optional penalty on the owning volunteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub expected: SignupStatus,
    pub next: SignupStatus,
    pub reliability_penalty: Option<u32>,
}

impl StatusTransition {
    pub fn between(expected: SignupStatus, next: SignupStatus) -> Self {
        Self {
            expected,
            next,
            reliability_penalty: expected.penalty_for(next),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupFilter {
    #[serde(default)]
    pub volunteer_id: Option<VolunteerId>,
    #[serde(default)]
    pub shift_id: Option<ShiftId>,
    #[serde(default)]
    pub status: Option<SignupStatus>,
}

impl SignupFilter {
    pub fn matches(&self, signup: &Signup) -> bool {
        self.volunteer_id.map_or(true, |id| signup.volunteer_id == id)
            && self.shift_id.map_or(true, |id| signup.shift_id == id)
            && self.status.map_or(true, |status| signup.status == status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftFilter {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub shift_type: Option<ShiftType>,
}

impl ShiftFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        self.start_date.map_or(true, |start| shift.date >= start)
            && self.end_date.map_or(true, |end| shift.date <= end)
            && self.shift_type.map_or(true, |kind| shift.shift_type == kind)
    }
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("signup status changed concurrently (now {current})")]
    StaleStatus { current: SignupStatus },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
