use std::sync::Arc;

use chrono::NaiveDate;
use shared::{
    domain::{ActionStatus, Gravity, NcStatus, NcType, UserRole},
    protocol::{ActionDraft, ActionPatch, NcDraft, ReportFilter, UserDraft},
};

use crate::{reports, FixedClock, Tracker, TrackerSettings};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Four records declared on 2026-01-10, 2026-02-10, 2026-03-01 and
/// 2026-03-20; the first two are closed after 10 and 5 days.
fn fixture() -> (Tracker, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::on(date(2026, 1, 10)));
    let mut tracker = Tracker::new(clock.clone(), TrackerSettings::default());
    let reporter = tracker.users_mut().add(UserDraft {
        last_name: "Ben Ali".into(),
        first_name: "Sarah".into(),
        email: "sarah@example.com".into(),
        role: UserRole::Quality,
        department: String::new(),
        is_active: true,
    });
    let create = |tracker: &mut Tracker, title: &str, gravity, kind| {
        tracker
            .create(
                NcDraft {
                    title: title.into(),
                    gravity: Some(gravity),
                    kind: Some(kind),
                    ..Default::default()
                },
                &reporter,
            )
            .id
    };

    let first = create(&mut tracker, "January", Gravity::Critical, NcType::Product);
    clock.advance_days(10);
    tracker.advance_status(first, NcStatus::Closed).expect("close");

    clock.set(date(2026, 2, 10).and_hms_opt(9, 0, 0).expect("time").and_utc());
    let second = create(&mut tracker, "February", Gravity::Major, NcType::Process);
    let action = tracker
        .add_action(
            second,
            ActionDraft {
                description: "Retrain".into(),
                assignee_id: reporter.id,
                due_date: date(2026, 2, 12),
                comment: None,
            },
        )
        .expect("action");
    clock.advance_days(5);
    tracker
        .update_action(
            action.id,
            ActionPatch {
                status: Some(ActionStatus::Done),
                ..Default::default()
            },
        )
        .expect("done");
    tracker.advance_status(second, NcStatus::Closed).expect("close");

    clock.set(date(2026, 3, 1).and_hms_opt(9, 0, 0).expect("time").and_utc());
    let third = create(&mut tracker, "March A", Gravity::Minor, NcType::Product);
    tracker
        .add_action(
            third,
            ActionDraft {
                description: "Inspect batch".into(),
                assignee_id: reporter.id,
                due_date: date(2026, 3, 5),
                comment: None,
            },
        )
        .expect("action");

    clock.set(date(2026, 3, 20).and_hms_opt(9, 0, 0).expect("time").and_utc());
    create(&mut tracker, "March B", Gravity::Major, NcType::Supplier);
    (tracker, clock)
}

#[test]
fn kpis_are_computed_from_live_records() {
    let (tracker, _clock) = fixture();
    let kpis = tracker.kpis(3);

    assert_eq!(kpis.total, 4);
    assert_eq!(kpis.open, 2);
    assert_eq!(kpis.critical, 1);
    assert_eq!(kpis.major, 2);
    assert_eq!(kpis.minor, 1);
    assert_eq!(kpis.overdue_actions, 1);
    assert_eq!(kpis.resolution_rate, 50.0);
    assert_eq!(kpis.mean_resolution_days, 7.5);

    let months: Vec<(&str, usize)> = kpis
        .by_month
        .iter()
        .map(|m| (m.month.as_str(), m.count))
        .collect();
    assert_eq!(months, vec![("2026-01", 1), ("2026-02", 1), ("2026-03", 2)]);

    let product = kpis
        .by_type
        .iter()
        .find(|c| c.key == NcType::Product)
        .expect("product");
    assert_eq!(product.count, 2);
    assert_eq!(product.label, "Product");
    assert_eq!(kpis.by_type.len(), NcType::ALL.len());

    let closed = kpis
        .by_status
        .iter()
        .find(|c| c.key == NcStatus::Closed)
        .expect("closed");
    assert_eq!(closed.count, 2);
}

#[test]
fn kpis_on_empty_collection_are_zero() {
    let kpis = reports::kpi_report(&[], date(2026, 5, 31), 12);
    assert_eq!(kpis.total, 0);
    assert_eq!(kpis.resolution_rate, 0.0);
    assert_eq!(kpis.mean_resolution_days, 0.0);
    assert_eq!(kpis.by_month.len(), 12);
    assert_eq!(kpis.by_month[0].month, "2025-06");
    assert_eq!(kpis.by_month[11].month, "2026-05");
    assert!(kpis.by_month.iter().all(|m| m.count == 0));
}

#[test]
fn oversized_kpi_window_is_capped() {
    let kpis = reports::kpi_report(&[], date(2026, 3, 10), u32::MAX);
    assert_eq!(kpis.by_month.len(), reports::MAX_KPI_MONTHS as usize);
    assert_eq!(kpis.by_month[0].month, "2016-04");
    assert_eq!(kpis.by_month.last().expect("current month").month, "2026-03");
}

#[test]
fn kpi_window_stops_at_start_of_calendar() {
    let kpis = reports::kpi_report(&[], NaiveDate::MIN, 24);
    assert_eq!(kpis.by_month.len(), 1);
}

#[test]
fn report_filter_bounds_are_inclusive() {
    let (tracker, _clock) = fixture();
    let filter = ReportFilter {
        from: date(2026, 2, 10),
        to: date(2026, 3, 1),
        gravity: None,
        kind: None,
    };
    let stats = reports::report_stats(tracker.records(), &filter);
    assert_eq!(stats.total, 2);
    assert_eq!(stats.open, 1);
    assert_eq!(stats.closed, 1);
    assert_eq!(stats.major, 1);
    assert_eq!(stats.minor, 1);
    assert_eq!(stats.actions_total, 2);
    assert_eq!(stats.actions_done, 1);
}

#[test]
fn report_filter_applies_gravity_and_type() {
    let (tracker, _clock) = fixture();
    let today = tracker.today();
    let majors = ReportFilter {
        gravity: Some(Gravity::Major),
        ..reports::year_to_date(today)
    };
    assert_eq!(reports::report_stats(tracker.records(), &majors).total, 2);

    let supplier_majors = ReportFilter {
        kind: Some(NcType::Supplier),
        ..majors
    };
    let selected = reports::filter_records(tracker.records(), &supplier_majors);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].title, "March B");
}

#[test]
fn year_to_date_starts_on_january_first() {
    let filter = reports::year_to_date(date(2026, 8, 14));
    assert_eq!(filter.from, date(2026, 1, 1));
    assert_eq!(filter.to, date(2026, 8, 14));
    assert!(filter.gravity.is_none() && filter.kind.is_none());
}
