use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reliability score every volunteer starts with.
pub const INITIAL_RELIABILITY_SCORE: u32 = 100;

/// Penalty applied once when a confirmed signup becomes a no-show.
pub const NO_SHOW_PENALTY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolunteerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShiftId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignupId(pub u64);

impl fmt::Display for VolunteerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SignupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two recurring duties a shift can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    Kakad,
    Robes,
}

impl ShiftType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kakad => "Kakad",
            Self::Robes => "Robes",
        }
    }

    pub const fn default_capacity(self) -> u32 {
        match self {
            Self::Kakad => 1,
            Self::Robes => 4,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Kakad" => Some(Self::Kakad),
            "Robes" => Some(Self::Robes),
            _ => None,
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a signup. Only `Confirmed` counts against caps and capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignupStatus {
    #[default]
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "cancelled")]
    Cancelled,
    #[serde(rename = "no-show")]
    NoShow,
}

impl SignupStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no-show",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "no-show" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// Reliability penalty owed when moving from `self` to `next`.
    pub fn penalty_for(self, next: SignupStatus) -> Option<u32> {
        match (self, next) {
            (Self::Confirmed, Self::NoShow) => Some(NO_SHOW_PENALTY),
            _ => None,
        }
    }
}

impl fmt::Display for SignupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: VolunteerId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub reliability_score: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Volunteer {
    /// Apply a penalty without dropping below zero.
    pub fn penalize(&mut self, amount: u32) {
        self.reliability_score = self.reliability_score.saturating_sub(amount);
    }
}

/// Registration payload for a new volunteer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVolunteer {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reliability_score: Option<u32>,
}

/// Coordinator edits to an existing volunteer. Absent fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub reliability_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub date: NaiveDate,
    pub day_name: String,
    pub week_of_month: u32,
    pub shift_type: ShiftType,
    pub capacity: u32,
    pub created_at: DateTime<Utc>,
}

impl Shift {
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    pub fn is_thursday(&self) -> bool {
        self.weekday() == Weekday::Thu
    }
}

/// Request to create a shift; capacity falls back to the type's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewShift {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl NewShift {
    pub fn resolved_capacity(&self) -> u32 {
        self.capacity
            .unwrap_or_else(|| self.shift_type.default_capacity())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signup {
    pub id: SignupId,
    pub volunteer_id: VolunteerId,
    pub shift_id: ShiftId,
    pub status: SignupStatus,
    pub created_at: DateTime<Utc>,
}

/// A confirmed signup joined with the attributes of its shift that the quota rules read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedSignup {
    pub signup_id: SignupId,
    pub shift_id: ShiftId,
    pub shift_type: ShiftType,
    pub date: NaiveDate,
}

impl ConfirmedSignup {
    pub fn from_parts(signup: &Signup, shift: &Shift) -> Self {
        Self {
            signup_id: signup.id,
            shift_id: shift.id,
            shift_type: shift.shift_type,
            date: shift.date,
        }
    }

    pub fn is_thursday(&self) -> bool {
        self.date.weekday() == Weekday::Thu
    }
}

/// Full English weekday name, e.g. `Thursday`.
pub fn day_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// One-based week of the month the date falls in.
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}
