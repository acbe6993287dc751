use serde::{Deserialize, Serialize};

/// Outcome of running the rule table for one (volunteer, shift) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "VerdictView", try_from = "VerdictView")]
pub enum Verdict {
    Allow,
    Deny(ReasonCode),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Verdict::Allow => None,
            Verdict::Deny(reason) => Some(*reason),
        }
    }
}

/// Wire shape of a verdict: `{ "allowed": bool, "reason": code | null }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictView {
    pub allowed: bool,
    pub reason: Option<ReasonCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Verdict> for VerdictView {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Allow => Self {
                allowed: true,
                reason: None,
                message: None,
            },
            Verdict::Deny(reason) => Self {
                allowed: false,
                reason: Some(reason),
                message: Some(reason.summary().to_string()),
            },
        }
    }
}

impl TryFrom<VerdictView> for Verdict {
    type Error = String;

    fn try_from(view: VerdictView) -> Result<Self, Self::Error> {
        match (view.allowed, view.reason) {
            (true, None) => Ok(Verdict::Allow),
            (false, Some(reason)) => Ok(Verdict::Deny(reason)),
            (true, Some(reason)) => Err(format!("allowed verdict cannot carry reason {reason}")),
            (false, None) => Err("denied verdict requires a reason".to_string()),
        }
    }
}

/// Stable denial codes, one per row of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    ShiftNotFound,
    KakadCapReached,
    TotalCapReached,
    ThursdayCapReached,
    ShiftFull,
    DuplicateSignup,
}

impl ReasonCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShiftNotFound => "shift_not_found",
            Self::KakadCapReached => "kakad_cap_reached",
            Self::TotalCapReached => "total_cap_reached",
            Self::ThursdayCapReached => "thursday_cap_reached",
            Self::ShiftFull => "shift_full",
            Self::DuplicateSignup => "duplicate_signup",
        }
    }

    pub const fn summary(self) -> &'static str {
        match self {
            Self::ShiftNotFound => "shift not found",
            Self::KakadCapReached => "maximum Kakad signups reached",
            Self::TotalCapReached => "maximum total signups reached",
            Self::ThursdayCapReached => "maximum Thursday signups reached",
            Self::ShiftFull => "shift is at full capacity",
            Self::DuplicateSignup => "already signed up for this shift",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
