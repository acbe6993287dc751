use serde::Serialize;

use super::domain::{Shift, Signup, Volunteer, VolunteerId};
use super::rules::Verdict;
use super::stats::VolunteerStats;

/// Number of earliest shifts the dashboard scans for understaffing.
pub const DASHBOARD_UPCOMING_SHIFTS: usize = 10;

/// Pre-validation answer: the verdict alongside the volunteer's current quota usage.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub verdict: Verdict,
    pub stats: VolunteerStats,
}

/// A committed signup and the volunteer's quota usage after it.
#[derive(Debug, Clone, Serialize)]
pub struct SignupReceipt {
    pub signup: Signup,
    pub stats: VolunteerStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubstituteCandidate {
    pub volunteer: Volunteer,
    pub stats: VolunteerStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubstituteReport {
    pub shift: Shift,
    pub available_substitutes: Vec<SubstituteCandidate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnderstaffedShift {
    pub shift: Shift,
    pub current_signups: u32,
    pub needed: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorDashboard {
    pub total_volunteers: usize,
    pub total_signups: usize,
    pub total_shifts: usize,
    pub average_reliability_score: f64,
    pub understaffed_shifts: Vec<UnderstaffedShift>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShiftFillStatus {
    pub shift: Shift,
    pub current_signups: u32,
    pub fill_percentage: f64,
    pub is_full: bool,
    pub is_understaffed: bool,
}

impl ShiftFillStatus {
    pub fn new(shift: Shift, current_signups: u32) -> Self {
        let fill_percentage = if shift.capacity > 0 {
            round_to(f64::from(current_signups) / f64::from(shift.capacity) * 100.0, 1)
        } else {
            0.0
        };

        Self {
            is_full: current_signups >= shift.capacity,
            is_understaffed: current_signups < shift.capacity,
            shift,
            current_signups,
            fill_percentage,
        }
    }

    pub fn understaffed(&self) -> Option<UnderstaffedShift> {
        self.is_understaffed.then(|| UnderstaffedShift {
            shift: self.shift.clone(),
            current_signups: self.current_signups,
            needed: self.shift.capacity - self.current_signups,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: Vec<VolunteerId>,
}

pub(crate) fn average_reliability(volunteers: &[Volunteer]) -> f64 {
    if volunteers.is_empty() {
        return 0.0;
    }
    let total: u64 = volunteers
        .iter()
        .map(|volunteer| u64::from(volunteer.reliability_score))
        .sum();
    round_to(total as f64 / volunteers.len() as f64, 2)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
