mod common;

mod eligibility;
mod rules;
mod stats;
