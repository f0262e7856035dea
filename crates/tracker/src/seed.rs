//! Demo data set loaded by the command-line app.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use shared::domain::{
    ActionId, ActionStatus, CorrectiveAction, Effectiveness, Gravity, NcId, NcStatus, NcType,
    NonConformity, User, UserId, UserRole,
};
use uuid::Uuid;

use crate::{clock::Clock, Tracker, TrackerSettings};

pub const DEPARTMENTS: &[&str] = &[
    "Quality",
    "Production",
    "Maintenance",
    "Logistics",
    "Purchasing",
];

pub const POSTS: &[&str] = &[
    "Assembly line A",
    "Assembly line B",
    "Packaging",
    "Incoming inspection",
    "Shipping dock",
];

struct SeedUser {
    id: u128,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    role: UserRole,
    department: &'static str,
    active: bool,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        id: 1,
        first_name: "Mohamed Aziz",
        last_name: "Riahi",
        email: "admin@riahisolutions.com",
        role: UserRole::Admin,
        department: "Quality management",
        active: true,
    },
    SeedUser {
        id: 2,
        first_name: "Sarah",
        last_name: "Ben Ali",
        email: "sarah.benali@riahisolutions.com",
        role: UserRole::Quality,
        department: "Quality",
        active: true,
    },
    SeedUser {
        id: 3,
        first_name: "Karim",
        last_name: "Trabelsi",
        email: "karim.trabelsi@riahisolutions.com",
        role: UserRole::Production,
        department: "Production",
        active: true,
    },
    SeedUser {
        id: 4,
        first_name: "Leila",
        last_name: "Mansour",
        email: "leila.mansour@riahisolutions.com",
        role: UserRole::Maintenance,
        department: "Maintenance",
        active: true,
    },
    SeedUser {
        id: 5,
        first_name: "Youssef",
        last_name: "Gharbi",
        email: "youssef.gharbi@riahisolutions.com",
        role: UserRole::Standard,
        department: "Logistics",
        active: false,
    },
];

pub fn seed_user_id(n: u128) -> UserId {
    UserId(Uuid::from_u128(n))
}

/// Tracker pre-loaded with the demo users and a spread of records across
/// every status. Dates are relative to the clock's today.
pub fn demo_tracker(clock: Arc<dyn Clock>, settings: TrackerSettings) -> Tracker {
    let today = clock.today();
    let mut tracker = Tracker::new(clock, settings);

    for seed in SEED_USERS {
        tracker.users_mut().insert(User {
            id: seed_user_id(seed.id),
            last_name: seed.last_name.into(),
            first_name: seed.first_name.into(),
            email: seed.email.into(),
            role: seed.role,
            department: seed.department.into(),
            is_active: seed.active,
            created_at: days_before(today, 400 - seed.id as i64 * 30),
            last_login: None,
        });
    }

    let prefix = tracker.settings().reference_prefix.clone();
    for record in demo_records(&prefix, today, tracker.users()) {
        tracker.import(record);
    }
    tracker
}

fn demo_records(
    prefix: &str,
    today: NaiveDate,
    users: &crate::UserDirectory,
) -> Vec<NonConformity> {
    let quality = seed_user_id(2);
    let production = seed_user_id(3);
    let maintenance = seed_user_id(4);

    let mut records = vec![
        record(
            (prefix, 5),
            "Scratched housing on finished goods",
            "Visible scratches on 40 housings found during final inspection.",
            NcType::Product,
            Gravity::Major,
            NcStatus::Open,
            ("Production", "Assembly line A"),
            (production, Some(quality)),
            (days_before(today, 2), days_before(today, 1), None),
            users,
        ),
        record(
            (prefix, 4),
            "Torque wrench out of calibration",
            "Calibration check showed a 12% deviation on station 3.",
            NcType::Process,
            Gravity::Critical,
            NcStatus::UnderAnalysis,
            ("Maintenance", "Assembly line B"),
            (maintenance, Some(maintenance)),
            (days_before(today, 12), days_before(today, 11), None),
            users,
        ),
        record(
            (prefix, 3),
            "Supplier delivered wrong resin grade",
            "Batch 2291 received with grade R40 instead of R45.",
            NcType::Supplier,
            Gravity::Major,
            NcStatus::ActionLaunched,
            ("Purchasing", "Incoming inspection"),
            (quality, Some(quality)),
            (days_before(today, 35), days_before(today, 34), None),
            users,
        ),
        record(
            (prefix, 2),
            "Wrong label on pallet",
            "Shipping label referenced another customer order.",
            NcType::Client,
            Gravity::Minor,
            NcStatus::Closed,
            ("Logistics", "Shipping dock"),
            (production, Some(quality)),
            (
                days_before(today, 64),
                days_before(today, 63),
                Some(days_before(today, 50)),
            ),
            users,
        ),
        record(
            (prefix, 1),
            "Missing work instruction revision",
            "Operators used revision B of the packaging instruction.",
            NcType::Service,
            Gravity::Minor,
            NcStatus::Closed,
            ("Production", "Packaging"),
            (quality, None),
            (
                days_before(today, 95),
                days_before(today, 94),
                Some(days_before(today, 72)),
            ),
            users,
        ),
    ];

    let supplier = &mut records[2];
    supplier.root_cause = Some("Purchase order template listed the wrong grade".into());
    supplier.actions = vec![
        action(
            supplier.id,
            "Correct purchase order template",
            (quality, users),
            days_before(today, 20),
            ActionStatus::Done,
            Some(days_before(today, 22)),
        ),
        action(
            supplier.id,
            "Audit supplier incoming controls",
            (quality, users),
            days_before(today, 3),
            ActionStatus::InProgress,
            None,
        ),
    ];

    let label = &mut records[3];
    label.root_cause = Some("Label printer queue not cleared between orders".into());
    label.actions = vec![{
        let mut done = action(
            label.id,
            "Clear printer queue at each order change",
            (production, users),
            days_before(today, 55),
            ActionStatus::Done,
            Some(days_before(today, 52)),
        );
        done.effectiveness = Some(Effectiveness::Effective);
        done
    }];

    let torque = &mut records[1];
    torque.actions = vec![action(
        torque.id,
        "Recalibrate all torque wrenches on line B",
        (maintenance, users),
        days_before(today, -5),
        ActionStatus::NotStarted,
        None,
    )];

    records
}

#[allow(clippy::too_many_arguments)]
fn record(
    (prefix, sequence): (&str, u32),
    title: &str,
    description: &str,
    kind: NcType,
    gravity: Gravity,
    status: NcStatus,
    (department, post): (&str, &str),
    (reporter, assignee): (UserId, Option<UserId>),
    (detected, declared, closed): (NaiveDate, NaiveDate, Option<NaiveDate>),
    users: &crate::UserDirectory,
) -> NonConformity {
    NonConformity {
        id: NcId::generate(),
        reference: format!("{prefix}-{}-{sequence:03}", declared.year()),
        title: title.into(),
        description: description.into(),
        kind,
        gravity,
        status,
        department: department.into(),
        post: post.into(),
        reporter_id: reporter,
        reporter_name: users.display_name(reporter),
        assignee_id: assignee,
        assignee_name: assignee.map(|id| users.display_name(id)),
        detection_date: detected,
        declaration_date: declared,
        closure_date: closed,
        root_cause: None,
        impact_description: None,
        attachments: Vec::new(),
        actions: Vec::new(),
    }
}

fn action(
    nc_id: NcId,
    description: &str,
    (assignee, users): (UserId, &crate::UserDirectory),
    due_date: NaiveDate,
    status: ActionStatus,
    completion_date: Option<NaiveDate>,
) -> CorrectiveAction {
    CorrectiveAction {
        id: ActionId::generate(),
        nc_id,
        description: description.into(),
        assignee_id: assignee,
        assignee_name: users.display_name(assignee),
        due_date,
        completion_date,
        status,
        comment: None,
        effectiveness: None,
    }
}

fn days_before(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}
