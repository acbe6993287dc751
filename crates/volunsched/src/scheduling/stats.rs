use serde::{Deserialize, Serialize};

use super::domain::ConfirmedSignup;
use super::rules::{QuotaPolicy, SignupTally};

/// Consumption of each quota and the headroom left under it.
///
/// Remaining values are signed: a cap lowered below current usage shows up as a
/// negative number rather than being clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerStats {
    pub kakad_used: u32,
    pub kakad_remaining: i64,
    pub total_used: u32,
    pub total_remaining: i64,
    pub thursday_used: u32,
    pub thursday_remaining: i64,
}

impl VolunteerStats {
    pub fn compute(confirmed: &[ConfirmedSignup], policy: &QuotaPolicy) -> Self {
        let tally = SignupTally::from_confirmed(confirmed);
        let remaining = |cap: u32, used: u32| i64::from(cap) - i64::from(used);

        Self {
            kakad_used: tally.kakad,
            kakad_remaining: remaining(policy.max_kakad_per_volunteer, tally.kakad),
            total_used: tally.total,
            total_remaining: remaining(policy.max_total_per_volunteer, tally.total),
            thursday_used: tally.thursday,
            thursday_remaining: remaining(policy.max_thursday_per_volunteer, tally.thursday),
        }
    }
}
