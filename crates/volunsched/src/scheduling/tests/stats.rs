use super::common::*;

use crate::scheduling::domain::{ShiftType, SignupStatus};
use crate::scheduling::rules::QuotaPolicy;
use crate::scheduling::stats::VolunteerStats;

#[test]
fn fresh_volunteer_has_full_headroom() {
    let stats = VolunteerStats::compute(&[], &QuotaPolicy::default());

    assert_eq!(stats.kakad_used, 0);
    assert_eq!(stats.kakad_remaining, 2);
    assert_eq!(stats.total_remaining, 4);
    assert_eq!(stats.thursday_remaining, 2);
}

#[test]
fn thursday_kakad_counts_against_every_quota() {
    let signups = vec![
        confirmed(1, thursday(), ShiftType::Kakad),
        confirmed(2, date(2025, 1, 18), ShiftType::Robes),
    ];

    let stats = VolunteerStats::compute(&signups, &QuotaPolicy::default());

    assert_eq!(stats.kakad_used, 1);
    assert_eq!(stats.kakad_remaining, 1);
    assert_eq!(stats.total_used, 2);
    assert_eq!(stats.total_remaining, 2);
    assert_eq!(stats.thursday_used, 1);
    assert_eq!(stats.thursday_remaining, 1);
}

#[test]
fn lowered_caps_report_negative_headroom() {
    let signups = vec![
        confirmed(1, date(2025, 1, 13), ShiftType::Kakad),
        confirmed(2, date(2025, 1, 14), ShiftType::Kakad),
    ];
    let policy = QuotaPolicy {
        max_kakad_per_volunteer: 1,
        ..QuotaPolicy::default()
    };

    let stats = VolunteerStats::compute(&signups, &policy);

    assert_eq!(stats.kakad_remaining, -1);
}

#[test]
fn service_stats_ignore_cancelled_signups() {
    let (service, _, _) = build_service();
    let volunteer = register(&service, "Meera", "+15550100");
    let kakad = open_shift(&service, date(2025, 1, 13), ShiftType::Kakad, None);
    let robes = open_shift(&service, thursday(), ShiftType::Robes, None);

    service.signup(volunteer.id, kakad.id).expect("kakad signup");
    let receipt = service.signup(volunteer.id, robes.id).expect("robes signup");
    assert_eq!(receipt.stats.total_used, 2);
    assert_eq!(receipt.stats.thursday_used, 1);

    service
        .update_status(receipt.signup.id, SignupStatus::Cancelled)
        .expect("cancel");

    let stats = service.stats(volunteer.id).expect("stats");
    assert_eq!(stats.total_used, 1);
    assert_eq!(stats.thursday_remaining, 2);
    assert_eq!(stats.kakad_remaining, 1);
}
