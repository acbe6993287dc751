use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{
    day_name, week_of_month, ConfirmedSignup, NewShift, NewVolunteer, Shift, ShiftId, Signup,
    SignupId, SignupStatus, Volunteer, VolunteerId, VolunteerUpdate, INITIAL_RELIABILITY_SCORE,
};
use super::repository::{
    RepositoryError, ScheduleStore, ShiftFilter, SignupFilter, StatusTransition,
};

/// Process-local store backed by ordered maps behind one mutex.
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    volunteers: BTreeMap<VolunteerId, Volunteer>,
    shifts: BTreeMap<ShiftId, Shift>,
    signups: BTreeMap<SignupId, Signup>,
    next_volunteer: u64,
    next_shift: u64,
    next_signup: u64,
}

impl StoreState {
    fn confirmed_for_shift(&self, shift: ShiftId) -> u32 {
        self.signups
            .values()
            .filter(|signup| signup.shift_id == shift && signup.status == SignupStatus::Confirmed)
            .count() as u32
    }
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn volunteer(&self, id: VolunteerId) -> Result<Option<Volunteer>, RepositoryError> {
        Ok(self.state()?.volunteers.get(&id).cloned())
    }

    fn volunteers(&self) -> Result<Vec<Volunteer>, RepositoryError> {
        Ok(self.state()?.volunteers.values().cloned().collect())
    }

    fn insert_volunteer(&self, volunteer: NewVolunteer) -> Result<Volunteer, RepositoryError> {
        let mut state = self.state()?;
        if state
            .volunteers
            .values()
            .any(|existing| existing.phone == volunteer.phone)
        {
            return Err(RepositoryError::Conflict(format!(
                "phone {} already registered",
                volunteer.phone
            )));
        }

        state.next_volunteer += 1;
        let now = Utc::now();
        let record = Volunteer {
            id: VolunteerId(state.next_volunteer),
            name: volunteer.name,
            phone: volunteer.phone,
            email: volunteer.email,
            reliability_score: volunteer
                .reliability_score
                .unwrap_or(INITIAL_RELIABILITY_SCORE),
            created_at: now,
            updated_at: now,
        };
        state.volunteers.insert(record.id, record.clone());
        Ok(record)
    }

    fn update_volunteer(
        &self,
        id: VolunteerId,
        update: VolunteerUpdate,
    ) -> Result<Volunteer, RepositoryError> {
        let mut state = self.state()?;
        let volunteer = state
            .volunteers
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = update.name {
            volunteer.name = name;
        }
        if let Some(email) = update.email {
            volunteer.email = Some(email);
        }
        if let Some(score) = update.reliability_score {
            volunteer.reliability_score = u32::try_from(score.max(0)).unwrap_or(u32::MAX);
        }
        volunteer.updated_at = Utc::now();
        Ok(volunteer.clone())
    }

    fn shift(&self, id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        Ok(self.state()?.shifts.get(&id).cloned())
    }

    fn shifts(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, RepositoryError> {
        let state = self.state()?;
        let mut shifts: Vec<Shift> = state
            .shifts
            .values()
            .filter(|shift| filter.matches(shift))
            .cloned()
            .collect();
        shifts.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(shifts)
    }

    fn insert_shift(&self, shift: NewShift) -> Result<Shift, RepositoryError> {
        let mut state = self.state()?;
        if state
            .shifts
            .values()
            .any(|existing| existing.date == shift.date && existing.shift_type == shift.shift_type)
        {
            return Err(RepositoryError::Conflict(format!(
                "{} shift already exists for {}",
                shift.shift_type, shift.date
            )));
        }

        state.next_shift += 1;
        let record = Shift {
            id: ShiftId(state.next_shift),
            date: shift.date,
            day_name: day_name(shift.date),
            week_of_month: week_of_month(shift.date),
            shift_type: shift.shift_type,
            capacity: shift.resolved_capacity(),
            created_at: Utc::now(),
        };
        state.shifts.insert(record.id, record.clone());
        Ok(record)
    }

    fn update_shift_capacity(&self, id: ShiftId, capacity: u32) -> Result<Shift, RepositoryError> {
        let mut state = self.state()?;
        let shift = state.shifts.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        shift.capacity = capacity;
        Ok(shift.clone())
    }

    fn delete_volunteer(&self, id: VolunteerId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.volunteers.remove(&id).ok_or(RepositoryError::NotFound)?;
        state.signups.retain(|_, signup| signup.volunteer_id != id);
        Ok(())
    }

    fn delete_shift(&self, id: ShiftId) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        state.shifts.remove(&id).ok_or(RepositoryError::NotFound)?;
        state.signups.retain(|_, signup| signup.shift_id != id);
        Ok(())
    }

    fn confirmed_signups_for(
        &self,
        volunteer: VolunteerId,
    ) -> Result<Vec<ConfirmedSignup>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .signups
            .values()
            .filter(|signup| {
                signup.volunteer_id == volunteer && signup.status == SignupStatus::Confirmed
            })
            .filter_map(|signup| {
                state
                    .shifts
                    .get(&signup.shift_id)
                    .map(|shift| ConfirmedSignup::from_parts(signup, shift))
            })
            .collect())
    }

    fn confirmed_count(&self, shift: ShiftId) -> Result<u32, RepositoryError> {
        Ok(self.state()?.confirmed_for_shift(shift))
    }

    fn signup(&self, id: SignupId) -> Result<Option<Signup>, RepositoryError> {
        Ok(self.state()?.signups.get(&id).cloned())
    }

    fn signup_for_pair(
        &self,
        volunteer: VolunteerId,
        shift: ShiftId,
    ) -> Result<Option<Signup>, RepositoryError> {
        Ok(self
            .state()?
            .signups
            .values()
            .find(|signup| signup.volunteer_id == volunteer && signup.shift_id == shift)
            .cloned())
    }

    fn signups(&self, filter: &SignupFilter) -> Result<Vec<Signup>, RepositoryError> {
        let state = self.state()?;
        Ok(state
            .signups
            .values()
            .rev()
            .filter(|signup| filter.matches(signup))
            .cloned()
            .collect())
    }

    fn insert_signup(
        &self,
        volunteer: VolunteerId,
        shift: ShiftId,
    ) -> Result<Signup, RepositoryError> {
        let mut state = self.state()?;
        if !state.volunteers.contains_key(&volunteer) || !state.shifts.contains_key(&shift) {
            return Err(RepositoryError::NotFound);
        }
        if state
            .signups
            .values()
            .any(|signup| signup.volunteer_id == volunteer && signup.shift_id == shift)
        {
            return Err(RepositoryError::Conflict(format!(
                "volunteer {volunteer} already holds a signup for shift {shift}"
            )));
        }

        state.next_signup += 1;
        let record = Signup {
            id: SignupId(state.next_signup),
            volunteer_id: volunteer,
            shift_id: shift,
            status: SignupStatus::Confirmed,
            created_at: Utc::now(),
        };
        state.signups.insert(record.id, record.clone());
        Ok(record)
    }

    fn transition_signup(
        &self,
        id: SignupId,
        transition: StatusTransition,
    ) -> Result<Signup, RepositoryError> {
        let mut state = self.state()?;
        let StoreState {
            volunteers,
            signups,
            ..
        } = &mut *state;

        let signup = signups.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if signup.status != transition.expected {
            return Err(RepositoryError::StaleStatus {
                current: signup.status,
            });
        }

        // Resolve the volunteer before writing anything so a failure leaves both untouched.
        let volunteer = match transition.reliability_penalty {
            Some(_) => Some(
                volunteers
                    .get_mut(&signup.volunteer_id)
                    .ok_or(RepositoryError::NotFound)?,
            ),
            None => None,
        };

        signup.status = transition.next;
        if let (Some(volunteer), Some(penalty)) = (volunteer, transition.reliability_penalty) {
            volunteer.penalize(penalty);
            volunteer.updated_at = Utc::now();
        }
        Ok(signup.clone())
    }
}
