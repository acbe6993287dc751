use super::domain::{ConfirmedSignup, Shift, SignupStatus, Volunteer, VolunteerId};
use super::rules::{RuleEvaluator, SignupContext};

/// Per-volunteer state the search needs to evaluate one candidate.
#[derive(Debug, Clone, Default)]
pub struct CandidateSnapshot {
    pub confirmed: Vec<ConfirmedSignup>,
    pub existing: Option<SignupStatus>,
}

/// Filter `population` down to the volunteers the rule table allows onto `shift`.
///
/// Runs one full evaluation per candidate, each linear in that candidate's confirmed
/// signups. Fine for rosters in the low hundreds; larger populations want
/// precomputed per-volunteer counters instead.
pub fn find_eligible<I, F, E>(
    evaluator: &RuleEvaluator,
    shift: &Shift,
    shift_confirmed: u32,
    population: I,
    exclude: Option<VolunteerId>,
    mut snapshot: F,
) -> Result<Vec<Volunteer>, E>
where
    I: IntoIterator<Item = Volunteer>,
    F: FnMut(&Volunteer) -> Result<CandidateSnapshot, E>,
{
    let mut eligible = Vec::new();

    for volunteer in population {
        if Some(volunteer.id) == exclude {
            continue;
        }

        let candidate = snapshot(&volunteer)?;
        let context = SignupContext {
            volunteer_id: volunteer.id,
            shift: Some(shift),
            confirmed: &candidate.confirmed,
            shift_confirmed,
            existing: candidate.existing,
        };

        if evaluator.evaluate(&context).is_allowed() {
            eligible.push(volunteer);
        }
    }

    Ok(eligible)
}

/// Highest reliability first; ties fall back to ascending volunteer id.
pub fn rank_by_reliability(volunteers: &mut [Volunteer]) {
    volunteers.sort_by(|a, b| {
        b.reliability_score
            .cmp(&a.reliability_score)
            .then_with(|| a.id.cmp(&b.id))
    });
}
