//! Volunteer shift scheduling: the signup rule table, quota statistics, substitute
//! search, and the service and HTTP surface built on top of them.
//!
//! Rule evaluation is pure. Everything that reads the store and then writes to it goes
//! through [`SchedulingService`], which serializes conflicting changes per volunteer and
//! per shift.

pub mod domain;
pub mod eligibility;
pub mod locks;
pub mod memory;
pub mod notifications;
pub mod repository;
pub mod router;
pub(crate) mod rules;
pub mod service;
pub mod stats;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    ConfirmedSignup, NewShift, NewVolunteer, Shift, ShiftId, ShiftType, Signup, SignupId,
    SignupStatus, Volunteer, VolunteerId, VolunteerUpdate, INITIAL_RELIABILITY_SCORE,
    NO_SHOW_PENALTY,
};
pub use eligibility::{find_eligible, rank_by_reliability, CandidateSnapshot};
pub use locks::{LockTimeout, ScheduleLocks};
pub use memory::InMemoryScheduleStore;
pub use notifications::{DispatchError, Notification, NotificationDispatcher, NotificationEvent};
pub use repository::{
    RepositoryError, ScheduleStore, ShiftFilter, SignupFilter, StatusTransition,
};
pub use router::scheduling_router;
pub use rules::{
    QuotaPolicy, ReasonCode, RuleCheck, RuleEvaluator, SignupContext, SignupReuse, Verdict,
    VerdictView,
};
pub use service::{FailureClass, SchedulingError, SchedulingService};
pub use stats::VolunteerStats;
pub use views::{
    BroadcastReport, CoordinatorDashboard, ShiftFillStatus, SignupReceipt, SubstituteCandidate,
    SubstituteReport, UnderstaffedShift, ValidationReport,
};
