mod checks;
mod config;
mod policy;

pub use checks::RuleCheck;
pub use config::{QuotaPolicy, SignupReuse};
pub use policy::{ReasonCode, Verdict, VerdictView};

pub(crate) use checks::SignupTally;

use super::domain::{ConfirmedSignup, Shift, SignupStatus, VolunteerId};

/// Snapshot of everything the rule table reads for one (volunteer, shift) pair.
///
/// `shift` is `None` when the id did not resolve. `existing` carries the status of
/// a signup record already stored for the pair, whatever that status is.
#[derive(Debug, Clone, Copy)]
pub struct SignupContext<'a> {
    pub volunteer_id: VolunteerId,
    pub shift: Option<&'a Shift>,
    pub confirmed: &'a [ConfirmedSignup],
    pub shift_confirmed: u32,
    pub existing: Option<SignupStatus>,
}

/// Stateless evaluator that applies the quota policy to a signup snapshot.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    policy: QuotaPolicy,
    reuse: SignupReuse,
}

impl RuleEvaluator {
    pub fn new(policy: QuotaPolicy, reuse: SignupReuse) -> Self {
        Self { policy, reuse }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    pub fn reuse(&self) -> SignupReuse {
        self.reuse
    }

    /// Verdict for a new signup, running every row of [`RuleCheck::ORDERED`].
    pub fn evaluate(&self, context: &SignupContext<'_>) -> Verdict {
        self.evaluate_checks(&RuleCheck::ORDERED, context)
    }

    /// Verdict for moving an existing record back to confirmed; skips the duplicate row.
    pub fn evaluate_reinstatement(&self, context: &SignupContext<'_>) -> Verdict {
        self.evaluate_checks(&RuleCheck::REINSTATEMENT, context)
    }

    pub fn evaluate_checks(&self, checks: &[RuleCheck], context: &SignupContext<'_>) -> Verdict {
        let tally = SignupTally::from_confirmed(context.confirmed);

        checks
            .iter()
            .find(|check| !check.passes(context, &tally, &self.policy, self.reuse))
            .map(|check| Verdict::Deny(check.reason()))
            .unwrap_or(Verdict::Allow)
    }
}
