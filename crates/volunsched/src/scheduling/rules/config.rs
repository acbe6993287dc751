use serde::{Deserialize, Serialize};

/// Per-volunteer ceilings on confirmed signups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaPolicy {
    pub max_kakad_per_volunteer: u32,
    pub max_total_per_volunteer: u32,
    pub max_thursday_per_volunteer: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            max_kakad_per_volunteer: 2,
            max_total_per_volunteer: 4,
            max_thursday_per_volunteer: 2,
        }
    }
}

/// Whether an existing signup record for a (volunteer, shift) pair blocks a new signup.
///
/// `BlockAnyStatus` keeps one record per pair forever, so a volunteer who cancelled
/// can never sign up for that occurrence again. `ReinstateCancelled` lets a cancelled
/// record be flipped back to confirmed; no-show records still block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupReuse {
    #[default]
    BlockAnyStatus,
    ReinstateCancelled,
}

impl SignupReuse {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "block_any_status" | "block" => Some(Self::BlockAnyStatus),
            "reinstate_cancelled" | "reinstate" => Some(Self::ReinstateCancelled),
            _ => None,
        }
    }
}
