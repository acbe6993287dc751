use std::collections::HashMap;

use super::common::*;

use crate::scheduling::domain::{ShiftId, ShiftType, SignupStatus, VolunteerId, VolunteerUpdate};
use crate::scheduling::eligibility::{find_eligible, rank_by_reliability, CandidateSnapshot};
use crate::scheduling::rules::RuleEvaluator;
use crate::scheduling::SchedulingError;

#[test]
fn search_applies_the_same_rules_per_candidate() {
    let evaluator = RuleEvaluator::default();
    let target = shift_record(20, thursday(), ShiftType::Kakad, 1);

    let mut snapshots: HashMap<VolunteerId, CandidateSnapshot> = HashMap::new();
    snapshots.insert(
        VolunteerId(1),
        CandidateSnapshot {
            confirmed: vec![
                confirmed(1, date(2025, 1, 13), ShiftType::Kakad),
                confirmed(2, date(2025, 1, 14), ShiftType::Kakad),
            ],
            existing: None,
        },
    );
    snapshots.insert(
        VolunteerId(2),
        CandidateSnapshot {
            confirmed: Vec::new(),
            existing: Some(SignupStatus::Cancelled),
        },
    );

    let population = (1..=4).map(|id| volunteer_record(id, 100));
    let eligible = find_eligible(
        &evaluator,
        &target,
        0,
        population,
        Some(VolunteerId(4)),
        |volunteer| -> Result<CandidateSnapshot, std::convert::Infallible> {
            Ok(snapshots.get(&volunteer.id).cloned().unwrap_or_default())
        },
    )
    .expect("infallible snapshot");

    let ids: Vec<u64> = eligible.iter().map(|volunteer| volunteer.id.0).collect();
    assert_eq!(ids, vec![3]);
}

#[test]
fn full_shift_has_no_eligible_candidates() {
    let evaluator = RuleEvaluator::default();
    let target = shift_record(20, date(2025, 1, 18), ShiftType::Robes, 2);

    let eligible = find_eligible(
        &evaluator,
        &target,
        2,
        (1..=3).map(|id| volunteer_record(id, 100)),
        None,
        |_| -> Result<CandidateSnapshot, std::convert::Infallible> {
            Ok(CandidateSnapshot::default())
        },
    )
    .expect("infallible snapshot");

    assert!(eligible.is_empty());
}

#[test]
fn ranking_orders_by_score_then_id() {
    let mut volunteers = vec![
        volunteer_record(3, 80),
        volunteer_record(1, 90),
        volunteer_record(2, 90),
        volunteer_record(4, 100),
    ];

    rank_by_reliability(&mut volunteers);

    let ids: Vec<u64> = volunteers.iter().map(|volunteer| volunteer.id.0).collect();
    assert_eq!(ids, vec![4, 1, 2, 3]);
}

#[test]
fn substitutes_exclude_the_dropping_volunteer_and_rank_by_reliability() {
    let (service, _, _) = build_service();
    let leaving = register(&service, "Leaving", "+15550100");
    let steady = register(&service, "Steady", "+15550101");
    let shaky = register(&service, "Shaky", "+15550102");
    let maxed = register(&service, "Maxed", "+15550103");

    service
        .update_volunteer(
            shaky.id,
            VolunteerUpdate {
                reliability_score: Some(70),
                ..VolunteerUpdate::default()
            },
        )
        .expect("lower score");

    for day in 13..=14 {
        let kakad = open_shift(&service, date(2025, 1, day), ShiftType::Kakad, None);
        service.signup(maxed.id, kakad.id).expect("maxed kakad");
    }

    let target = open_shift(&service, date(2025, 1, 20), ShiftType::Kakad, Some(2));
    service.signup(leaving.id, target.id).expect("leaving signup");

    let report = service
        .substitutes(target.id, Some(leaving.id))
        .expect("substitutes");

    let ids: Vec<VolunteerId> = report
        .available_substitutes
        .iter()
        .map(|candidate| candidate.volunteer.id)
        .collect();
    assert_eq!(ids, vec![steady.id, shaky.id]);
    assert_eq!(report.shift.id, target.id);
    assert_eq!(report.available_substitutes[0].stats.kakad_remaining, 2);
}

#[test]
fn eligible_for_unknown_shift_is_not_found() {
    let (service, _, _) = build_service();
    register(&service, "Meera", "+15550100");

    let err = service
        .eligible(ShiftId(404), None)
        .expect_err("unknown shift");

    assert!(matches!(err, SchedulingError::ShiftNotFound(ShiftId(404))));
}

#[test]
fn current_holder_is_not_eligible_again() {
    let (service, _, _) = build_service();
    let holder = register(&service, "Holder", "+15550100");
    let other = register(&service, "Other", "+15550101");
    let robes = open_shift(&service, date(2025, 1, 18), ShiftType::Robes, None);
    service.signup(holder.id, robes.id).expect("signup");

    let eligible = service.eligible(robes.id, None).expect("eligible");

    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, other.id);
}
