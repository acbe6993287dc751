use super::common::*;

use crate::scheduling::domain::{ConfirmedSignup, Shift, ShiftType, SignupStatus, VolunteerId};
use crate::scheduling::rules::{
    QuotaPolicy, ReasonCode, RuleCheck, RuleEvaluator, SignupContext, SignupReuse, Verdict,
};

fn context<'a>(
    shift: Option<&'a Shift>,
    confirmed: &'a [ConfirmedSignup],
    shift_confirmed: u32,
    existing: Option<SignupStatus>,
) -> SignupContext<'a> {
    SignupContext {
        volunteer_id: VolunteerId(1),
        shift,
        confirmed,
        shift_confirmed,
        existing,
    }
}

fn two_kakad() -> Vec<ConfirmedSignup> {
    vec![
        confirmed(1, date(2025, 1, 13), ShiftType::Kakad),
        confirmed(2, date(2025, 1, 14), ShiftType::Kakad),
    ]
}

#[test]
fn kakad_cap_blocks_third_kakad_but_not_robes() {
    let evaluator = RuleEvaluator::default();
    let signups = two_kakad();
    let kakad = shift_record(10, date(2025, 1, 15), ShiftType::Kakad, 1);
    let robes = shift_record(11, date(2025, 1, 15), ShiftType::Robes, 4);

    assert_eq!(
        evaluator.evaluate(&context(Some(&kakad), &signups, 0, None)),
        Verdict::Deny(ReasonCode::KakadCapReached)
    );
    assert_eq!(
        evaluator.evaluate(&context(Some(&robes), &signups, 0, None)),
        Verdict::Allow
    );
    assert_eq!(
        evaluator.evaluate(&context(Some(&kakad), &signups[..1], 0, None)),
        Verdict::Allow
    );
}

#[test]
fn kakad_cap_takes_precedence_over_total_cap() {
    let evaluator = RuleEvaluator::default();
    let mut signups = two_kakad();
    signups.push(confirmed(3, date(2025, 1, 17), ShiftType::Robes));
    signups.push(confirmed(4, date(2025, 1, 18), ShiftType::Robes));

    let kakad = shift_record(10, date(2025, 1, 20), ShiftType::Kakad, 1);
    let robes = shift_record(11, date(2025, 1, 20), ShiftType::Robes, 4);

    assert_eq!(
        evaluator.evaluate(&context(Some(&kakad), &signups, 0, None)),
        Verdict::Deny(ReasonCode::KakadCapReached)
    );
    assert_eq!(
        evaluator.evaluate(&context(Some(&robes), &signups, 0, None)),
        Verdict::Deny(ReasonCode::TotalCapReached)
    );
}

#[test]
fn thursday_cap_only_applies_to_thursday_shifts() {
    let evaluator = RuleEvaluator::default();
    let signups = vec![
        confirmed(1, date(2025, 1, 2), ShiftType::Kakad),
        confirmed(2, date(2025, 1, 9), ShiftType::Robes),
    ];
    let next_thursday = shift_record(10, thursday(), ShiftType::Robes, 4);
    let friday = shift_record(11, date(2025, 1, 17), ShiftType::Robes, 4);

    assert_eq!(
        evaluator.evaluate(&context(Some(&next_thursday), &signups, 0, None)),
        Verdict::Deny(ReasonCode::ThursdayCapReached)
    );
    assert_eq!(
        evaluator.evaluate(&context(Some(&friday), &signups, 0, None)),
        Verdict::Allow
    );
}

#[test]
fn full_shift_denies_and_one_open_seat_allows() {
    let evaluator = RuleEvaluator::default();
    let robes = shift_record(10, date(2025, 1, 18), ShiftType::Robes, 3);

    assert_eq!(
        evaluator.evaluate(&context(Some(&robes), &[], 3, None)),
        Verdict::Deny(ReasonCode::ShiftFull)
    );
    assert_eq!(
        evaluator.evaluate(&context(Some(&robes), &[], 2, None)),
        Verdict::Allow
    );
}

#[test]
fn existing_pair_is_a_duplicate_under_default_policy() {
    let evaluator = RuleEvaluator::default();
    let robes = shift_record(10, date(2025, 1, 18), ShiftType::Robes, 4);

    for status in [
        SignupStatus::Confirmed,
        SignupStatus::Cancelled,
        SignupStatus::NoShow,
    ] {
        assert_eq!(
            evaluator.evaluate(&context(Some(&robes), &[], 1, Some(status))),
            Verdict::Deny(ReasonCode::DuplicateSignup),
            "status {status}"
        );
    }
}

#[test]
fn reinstate_policy_only_reopens_cancelled_pairs() {
    let evaluator = RuleEvaluator::new(QuotaPolicy::default(), SignupReuse::ReinstateCancelled);
    let robes = shift_record(10, date(2025, 1, 18), ShiftType::Robes, 4);

    assert_eq!(
        evaluator.evaluate(&context(Some(&robes), &[], 0, Some(SignupStatus::Cancelled))),
        Verdict::Allow
    );
    assert_eq!(
        evaluator.evaluate(&context(Some(&robes), &[], 0, Some(SignupStatus::NoShow))),
        Verdict::Deny(ReasonCode::DuplicateSignup)
    );
}

#[test]
fn missing_shift_short_circuits_everything_else() {
    let evaluator = RuleEvaluator::default();
    let mut signups = two_kakad();
    signups.push(confirmed(3, thursday(), ShiftType::Robes));
    signups.push(confirmed(4, date(2025, 1, 23), ShiftType::Robes));

    assert_eq!(
        evaluator.evaluate(&context(None, &signups, 99, Some(SignupStatus::Confirmed))),
        Verdict::Deny(ReasonCode::ShiftNotFound)
    );
}

#[test]
fn reinstatement_table_skips_duplicate_row() {
    let evaluator = RuleEvaluator::default();
    let robes = shift_record(10, date(2025, 1, 18), ShiftType::Robes, 4);
    let ctx = context(Some(&robes), &[], 0, Some(SignupStatus::Cancelled));

    assert_eq!(evaluator.evaluate_reinstatement(&ctx), Verdict::Allow);
    assert!(!RuleCheck::REINSTATEMENT.contains(&RuleCheck::Duplicate));
    assert_eq!(RuleCheck::ORDERED[0], RuleCheck::Existence);
}

#[test]
fn configured_caps_replace_the_defaults() {
    let evaluator = RuleEvaluator::new(
        QuotaPolicy {
            max_kakad_per_volunteer: 1,
            max_total_per_volunteer: 6,
            max_thursday_per_volunteer: 0,
        },
        SignupReuse::BlockAnyStatus,
    );
    let signups = vec![confirmed(1, date(2025, 1, 13), ShiftType::Kakad)];
    let kakad = shift_record(10, date(2025, 1, 14), ShiftType::Kakad, 1);
    let thursday_robes = shift_record(11, thursday(), ShiftType::Robes, 4);

    assert_eq!(
        evaluator.evaluate(&context(Some(&kakad), &signups, 0, None)),
        Verdict::Deny(ReasonCode::KakadCapReached)
    );
    assert_eq!(
        evaluator.evaluate(&context(Some(&thursday_robes), &[], 0, None)),
        Verdict::Deny(ReasonCode::ThursdayCapReached)
    );
}

#[test]
fn verdict_serializes_with_stable_reason_codes() {
    let denied = serde_json::to_value(Verdict::Deny(ReasonCode::ThursdayCapReached))
        .expect("serialize verdict");
    assert_eq!(denied["allowed"], false);
    assert_eq!(denied["reason"], "thursday_cap_reached");

    let allowed = serde_json::to_value(Verdict::Allow).expect("serialize verdict");
    assert_eq!(allowed["allowed"], true);
    assert!(allowed["reason"].is_null());

    let parsed: Verdict = serde_json::from_value(denied).expect("round trip");
    assert_eq!(parsed.reason(), Some(ReasonCode::ThursdayCapReached));
}
