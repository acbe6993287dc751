use super::super::domain::{ConfirmedSignup, ShiftType, SignupStatus};
use super::config::{QuotaPolicy, SignupReuse};
use super::policy::ReasonCode;
use super::SignupContext;

/// Confirmed-signup counts the quota rules and the stats view both read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SignupTally {
    pub kakad: u32,
    pub total: u32,
    pub thursday: u32,
}

impl SignupTally {
    pub(crate) fn from_confirmed(confirmed: &[ConfirmedSignup]) -> Self {
        confirmed.iter().fold(Self::default(), |mut tally, signup| {
            tally.total += 1;
            if signup.shift_type == ShiftType::Kakad {
                tally.kakad += 1;
            }
            if signup.is_thursday() {
                tally.thursday += 1;
            }
            tally
        })
    }
}

/// One row of the ordered rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCheck {
    Existence,
    KakadCap,
    TotalCap,
    ThursdayCap,
    ShiftCapacity,
    Duplicate,
}

impl RuleCheck {
    /// Evaluation order for a new signup. The first failing row decides the reason.
    pub const ORDERED: [RuleCheck; 6] = [
        RuleCheck::Existence,
        RuleCheck::KakadCap,
        RuleCheck::TotalCap,
        RuleCheck::ThursdayCap,
        RuleCheck::ShiftCapacity,
        RuleCheck::Duplicate,
    ];

    /// Rows re-run when an existing signup is moved back to confirmed.
    pub const REINSTATEMENT: [RuleCheck; 5] = [
        RuleCheck::Existence,
        RuleCheck::KakadCap,
        RuleCheck::TotalCap,
        RuleCheck::ThursdayCap,
        RuleCheck::ShiftCapacity,
    ];

    pub const fn reason(self) -> ReasonCode {
        match self {
            Self::Existence => ReasonCode::ShiftNotFound,
            Self::KakadCap => ReasonCode::KakadCapReached,
            Self::TotalCap => ReasonCode::TotalCapReached,
            Self::ThursdayCap => ReasonCode::ThursdayCapReached,
            Self::ShiftCapacity => ReasonCode::ShiftFull,
            Self::Duplicate => ReasonCode::DuplicateSignup,
        }
    }

    /// Returns `true` when the row passes.
    pub(crate) fn passes(
        self,
        context: &SignupContext<'_>,
        tally: &SignupTally,
        policy: &QuotaPolicy,
        reuse: SignupReuse,
    ) -> bool {
        let Some(shift) = context.shift else {
            return self != Self::Existence;
        };

        match self {
            Self::Existence => true,
            Self::KakadCap => {
                shift.shift_type != ShiftType::Kakad
                    || tally.kakad < policy.max_kakad_per_volunteer
            }
            Self::TotalCap => tally.total < policy.max_total_per_volunteer,
            Self::ThursdayCap => {
                !shift.is_thursday() || tally.thursday < policy.max_thursday_per_volunteer
            }
            Self::ShiftCapacity => context.shift_confirmed < shift.capacity,
            Self::Duplicate => !blocks_pair(context.existing, reuse),
        }
    }
}

fn blocks_pair(existing: Option<SignupStatus>, reuse: SignupReuse) -> bool {
    match (existing, reuse) {
        (None, _) => false,
        (Some(SignupStatus::Cancelled), SignupReuse::ReinstateCancelled) => false,
        (Some(_), _) => true,
    }
}
