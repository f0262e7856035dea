use std::sync::Arc;

use chrono::NaiveDate;
use shared::{
    domain::{Gravity, NcStatus, NcType, User},
    protocol::{NcDraft, NcQuery, SortKey, SortOrder, UserDraft},
};

use crate::{views, FixedClock, Tracker, TrackerSettings};

fn populated() -> Tracker {
    let clock = Arc::new(FixedClock::on(
        NaiveDate::from_ymd_opt(2026, 1, 5).expect("date"),
    ));
    let mut tracker = Tracker::new(clock.clone(), TrackerSettings::default());
    let reporter: User = tracker.users_mut().add(UserDraft {
        last_name: "Trabelsi".into(),
        first_name: "Karim".into(),
        email: "karim@example.com".into(),
        role: Default::default(),
        department: String::new(),
        is_active: true,
    });

    let specs = [
        ("Scratched housing", Gravity::Major, NcType::Product),
        ("Torque drift", Gravity::Critical, NcType::Process),
        ("Wrong resin grade", Gravity::Minor, NcType::Supplier),
        ("Label mix-up", Gravity::Major, NcType::Client),
    ];
    for (title, gravity, kind) in specs {
        tracker.create(
            NcDraft {
                title: title.into(),
                description: "found at inspection".into(),
                gravity: Some(gravity),
                kind: Some(kind),
                department: "Production".into(),
                post: "Line A".into(),
                ..Default::default()
            },
            &reporter,
        );
        clock.advance_days(1);
    }

    let torque = tracker.find_by_reference("NC-2026-002").expect("torque").id;
    tracker
        .advance_status(torque, NcStatus::UnderAnalysis)
        .expect("advance");
    let resin = tracker.find_by_reference("nc-2026-003").expect("resin").id;
    tracker.advance_status(resin, NcStatus::Closed).expect("close");
    tracker
}

fn titles(records: &[&shared::domain::NonConformity]) -> Vec<String> {
    records.iter().map(|nc| nc.title.clone()).collect()
}

#[test]
fn default_query_sorts_newest_first() {
    let tracker = populated();
    let result = views::query(tracker.records(), &NcQuery::default());
    assert_eq!(
        titles(&result),
        vec![
            "Label mix-up",
            "Wrong resin grade",
            "Torque drift",
            "Scratched housing"
        ]
    );
}

#[test]
fn search_matches_reference_title_description_and_reporter() {
    let tracker = populated();
    let by_reference = views::query(
        tracker.records(),
        &NcQuery {
            search: Some("nc-2026-001".into()),
            ..Default::default()
        },
    );
    assert_eq!(titles(&by_reference), vec!["Scratched housing"]);

    let by_reporter = views::query(
        tracker.records(),
        &NcQuery {
            search: Some("  trabelsi ".into()),
            ..Default::default()
        },
    );
    assert_eq!(by_reporter.len(), 4);

    let nothing = views::query(
        tracker.records(),
        &NcQuery {
            search: Some("corrosion".into()),
            ..Default::default()
        },
    );
    assert!(nothing.is_empty());
}

#[test]
fn filters_combine() {
    let tracker = populated();
    let majors = views::query(
        tracker.records(),
        &NcQuery {
            gravity: Some(Gravity::Major),
            ..Default::default()
        },
    );
    assert_eq!(majors.len(), 2);

    let major_clients = views::query(
        tracker.records(),
        &NcQuery {
            gravity: Some(Gravity::Major),
            kind: Some(NcType::Client),
            ..Default::default()
        },
    );
    assert_eq!(titles(&major_clients), vec!["Label mix-up"]);

    let closed = views::query(
        tracker.records(),
        &NcQuery {
            status: Some(NcStatus::Closed),
            ..Default::default()
        },
    );
    assert_eq!(titles(&closed), vec!["Wrong resin grade"]);
}

#[test]
fn sorts_by_gravity_and_status() {
    let tracker = populated();
    let by_gravity = views::query(
        tracker.records(),
        &NcQuery {
            sort_by: SortKey::Gravity,
            order: SortOrder::Desc,
            ..Default::default()
        },
    );
    assert_eq!(by_gravity[0].gravity, Gravity::Critical);
    assert_eq!(by_gravity[3].gravity, Gravity::Minor);

    let by_status = views::query(
        tracker.records(),
        &NcQuery {
            sort_by: SortKey::Status,
            order: SortOrder::Asc,
            ..Default::default()
        },
    );
    let statuses: Vec<NcStatus> = by_status.iter().map(|nc| nc.status).collect();
    assert_eq!(
        statuses,
        vec![
            NcStatus::Open,
            NcStatus::Open,
            NcStatus::UnderAnalysis,
            NcStatus::Closed
        ]
    );
}

#[test]
fn board_has_a_column_per_status() {
    let tracker = populated();
    let board = views::board(tracker.records());
    assert_eq!(board.len(), 4);
    assert_eq!(board[0].status, NcStatus::Open);
    assert_eq!(board[0].records.len(), 2);
    assert_eq!(board[2].records.len(), 0);
    assert_eq!(board[3].label, "Closed");
}

#[test]
fn status_counts_match_collection() {
    let tracker = populated();
    let counts = views::status_counts(tracker.records());
    assert_eq!(counts.total, 4);
    assert_eq!(counts.open, 2);
    assert_eq!(counts.under_analysis, 1);
    assert_eq!(counts.action_launched, 0);
    assert_eq!(counts.closed, 1);
}
