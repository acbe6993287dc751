use crate::infra::{build_service, ApiService};
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use volunsched::config::SchedulingConfig;
use volunsched::error::AppError;
use volunsched::scheduling::{
    NewShift, NewVolunteer, Shift, ShiftType, Verdict, Volunteer, VolunteerStats,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Any date in the week to schedule (YYYY-MM-DD). Defaults to the current week.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) week_of: Option<NaiveDate>,
    /// Volunteer roster CSV replacing the built-in sample volunteers
    #[arg(long)]
    pub(crate) volunteers: Option<PathBuf>,
    /// Shift calendar CSV replacing the built-in sample week
    #[arg(long)]
    pub(crate) shifts: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        week_of,
        volunteers,
        shifts,
    } = args;

    let service = build_service(
        SchedulingConfig::default(),
        volunteers.as_deref(),
        shifts.as_deref(),
    )?;

    println!("Volunteer scheduling demo");

    if volunteers.is_none() && shifts.is_none() {
        let monday = week_start(week_of.unwrap_or_else(|| Local::now().date_naive()));
        run_quota_walkthrough(&service, monday)?;
    }

    render_coordinator_view(&service)
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

struct SampleWeek {
    kakad: Vec<Shift>,
    thursday_robes: Shift,
    friday_robes: Shift,
    saturday_robes: Shift,
}

fn seed_sample_week(service: &ApiService, monday: NaiveDate) -> Result<SampleWeek, AppError> {
    let open = |offset: i64, shift_type: ShiftType| {
        service.create_shift(NewShift {
            date: monday + Duration::days(offset),
            shift_type,
            capacity: None,
        })
    };

    let kakad = (0..3)
        .map(|offset| open(offset, ShiftType::Kakad))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SampleWeek {
        kakad,
        thursday_robes: open(3, ShiftType::Robes)?,
        friday_robes: open(4, ShiftType::Robes)?,
        saturday_robes: open(5, ShiftType::Robes)?,
    })
}

fn seed_sample_volunteers(service: &ApiService) -> Result<Vec<Volunteer>, AppError> {
    [
        ("Meera", "+15550100", 100),
        ("Arjun", "+15550101", 95),
        ("Kavya", "+15550102", 80),
    ]
    .into_iter()
    .map(|(name, phone, score)| {
        service
            .register_volunteer(NewVolunteer {
                name: name.to_string(),
                phone: phone.to_string(),
                email: None,
                reliability_score: Some(score),
            })
            .map_err(AppError::from)
    })
    .collect()
}

fn run_quota_walkthrough(service: &ApiService, monday: NaiveDate) -> Result<(), AppError> {
    let week = seed_sample_week(service, monday)?;
    let volunteers = seed_sample_volunteers(service)?;
    let meera = &volunteers[0];

    println!("\nWeek of {} with {} volunteers", monday, volunteers.len());

    for shift in [&week.kakad[0], &week.kakad[1], &week.saturday_robes] {
        let receipt = service.signup(meera.id, shift.id)?;
        println!(
            "- {} signed up for {} on {} (signup #{})",
            meera.name,
            shift.shift_type,
            shift.day_name,
            receipt.signup.id
        );
    }
    render_stats(&meera.name, &service.stats(meera.id)?);

    println!("\nQuota checks for {}", meera.name);
    for (label, shift) in [
        ("Thursday Robes", &week.thursday_robes),
        ("Wednesday Kakad", &week.kakad[2]),
    ] {
        render_verdict(label, service.validate(meera.id, shift.id)?);
    }

    service.signup(meera.id, week.thursday_robes.id)?;
    println!("- committed Thursday Robes");
    render_verdict(
        "Friday Robes",
        service.validate(meera.id, week.friday_robes.id)?,
    );
    render_stats(&meera.name, &service.stats(meera.id)?);

    println!("\nSubstitutes for Wednesday Kakad");
    let report = service.substitutes(week.kakad[2].id, Some(meera.id))?;
    if report.available_substitutes.is_empty() {
        println!("- nobody eligible");
    }
    for candidate in &report.available_substitutes {
        println!(
            "- {} (reliability {}, {} Kakad left)",
            candidate.volunteer.name,
            candidate.volunteer.reliability_score,
            candidate.stats.kakad_remaining
        );
    }

    Ok(())
}

fn render_coordinator_view(service: &ApiService) -> Result<(), AppError> {
    let dashboard = service.dashboard()?;
    println!("\nCoordinator dashboard");
    println!(
        "- {} volunteers, {} confirmed signups, {} shifts",
        dashboard.total_volunteers, dashboard.total_signups, dashboard.total_shifts
    );
    println!(
        "- average reliability: {:.2}",
        dashboard.average_reliability_score
    );

    println!("\nShift fill status");
    for status in service.fill_status()? {
        println!(
            "- {} {} {}: {}/{} ({:.1}%){}",
            status.shift.date,
            status.shift.day_name,
            status.shift.shift_type,
            status.current_signups,
            status.shift.capacity,
            status.fill_percentage,
            if status.is_full { " full" } else { "" }
        );
    }

    Ok(())
}

fn render_verdict(label: &str, verdict: Verdict) {
    match verdict {
        Verdict::Allow => println!("- {label}: allowed"),
        Verdict::Deny(reason) => println!("- {label}: denied ({reason}: {})", reason.summary()),
    }
}

fn render_stats(name: &str, stats: &VolunteerStats) {
    println!(
        "  {name}: Kakad {}/{} left, total {} left, Thursday {} left",
        stats.kakad_remaining,
        i64::from(stats.kakad_used) + stats.kakad_remaining,
        stats.total_remaining,
        stats.thursday_remaining
    );
}
