//! Volunteer shift scheduling: quota rules, signup statistics, and substitute search.

pub mod config;
pub mod error;
pub mod roster;
pub mod scheduling;
pub mod telemetry;
