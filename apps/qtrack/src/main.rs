use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use auth::DemoAuth;
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::{
    domain::{
        ActionStatus, Effectiveness, Gravity, NcStatus, NcType, NonConformity, User, UserRole,
    },
    error::{ApiError, ApiException},
    protocol::{
        ActionDraft, ActionPatch, ActiveFilter, NcDraft, NcQuery, ReportFilter, SortKey,
        SortOrder, UserDraft, UserQuery,
    },
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracker::{reports, seed, views, SystemClock, Tracker, TrackerSettings};

mod config;

use config::{load_settings, prepare_database_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "qtrack", about = "Non-conformity tracker")]
struct Cli {
    /// Config file; defaults to ./qtrack.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dashboard indicators.
    Dashboard,
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<NcStatus>,
        #[arg(long)]
        gravity: Option<Gravity>,
        #[arg(long = "type")]
        kind: Option<NcType>,
        /// date, gravity or status
        #[arg(long, default_value = "date")]
        sort: String,
        #[arg(long)]
        asc: bool,
    },
    Board,
    /// Statistics over a declaration-date range, year to date by default.
    Report {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        gravity: Option<Gravity>,
        #[arg(long = "type")]
        kind: Option<NcType>,
    },
    Users {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        #[arg(long)]
        inactive: bool,
    },
    /// Walks one record through its whole lifecycle.
    Demo,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        remember_me: bool,
    },
    Whoami,
    Logout,
}

#[derive(Serialize)]
struct NcRow<'a> {
    reference: &'a str,
    title: &'a str,
    #[serde(rename = "type")]
    kind: NcType,
    gravity: Gravity,
    status: NcStatus,
    declared: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<&'a str>,
    actions: usize,
}

impl<'a> From<&'a NonConformity> for NcRow<'a> {
    fn from(nc: &'a NonConformity) -> Self {
        Self {
            reference: &nc.reference,
            title: &nc.title,
            kind: nc.kind,
            gravity: nc.gravity,
            status: nc.status,
            declared: nc.declaration_date,
            assignee: nc.assignee_name.as_deref(),
            actions: nc.actions.len(),
        }
    }
}

#[derive(Serialize)]
struct BoardRow<'a> {
    status: NcStatus,
    label: &'static str,
    records: Vec<NcRow<'a>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut tracker = build_tracker(&settings);

    match cli.command {
        Command::Dashboard => {
            tracker.refresh_overdue();
            print_json(&tracker.kpis(settings.kpi_months))?;
        }
        Command::List {
            search,
            status,
            gravity,
            kind,
            sort,
            asc,
        } => {
            let query = NcQuery {
                search,
                gravity,
                status,
                kind,
                sort_by: parse_sort_key(&sort)?,
                order: if asc { SortOrder::Asc } else { SortOrder::Desc },
            };
            let rows: Vec<NcRow> = views::query(tracker.records(), &query)
                .into_iter()
                .map(NcRow::from)
                .collect();
            print_json(&rows)?;
        }
        Command::Board => {
            let columns: Vec<BoardRow> = views::board(tracker.records())
                .into_iter()
                .map(|column| BoardRow {
                    status: column.status,
                    label: column.label,
                    records: column.records.into_iter().map(NcRow::from).collect(),
                })
                .collect();
            print_json(&columns)?;
        }
        Command::Report {
            from,
            to,
            gravity,
            kind,
        } => {
            let default_range = reports::year_to_date(tracker.today());
            let filter = ReportFilter {
                from: from.unwrap_or(default_range.from),
                to: to.unwrap_or(default_range.to),
                gravity,
                kind,
            };
            print_json(&serde_json::json!({
                "filter": filter,
                "stats": reports::report_stats(tracker.records(), &filter),
            }))?;
        }
        Command::Users {
            search,
            role,
            active,
            inactive,
        } => {
            let query = UserQuery {
                search,
                role,
                active: match (active, inactive) {
                    (true, _) => ActiveFilter::Active,
                    (_, true) => ActiveFilter::Inactive,
                    _ => ActiveFilter::All,
                },
            };
            print_json(&serde_json::json!({
                "stats": tracker.users().stats(),
                "users": tracker.users().filter(&query),
            }))?;
        }
        Command::Demo => {
            let mut auth = open_auth(&settings).await?;
            let signed_in = auth.restore().await?.map(|user| user.to_user());
            run_demo(&mut tracker, signed_in, &settings)?;
        }
        Command::Login {
            email,
            password,
            remember_me,
        } => {
            let mut auth = open_auth(&settings).await?;
            let user = auth.login(&email, &password, remember_me).await?;
            print_json(&serde_json::json!({
                "user": user,
                "expires_at": auth.session_expires_at(),
                "remembered": remember_me,
            }))?;
        }
        Command::Whoami => {
            let mut auth = open_auth(&settings).await?;
            match auth.restore().await? {
                Some(user) => print_json(&user)?,
                None => println!("not signed in"),
            }
        }
        Command::Logout => {
            let mut auth = open_auth(&settings).await?;
            auth.logout().await?;
            println!("signed out");
        }
    }

    Ok(())
}

fn build_tracker(settings: &Settings) -> Tracker {
    let tracker_settings = TrackerSettings {
        reference_prefix: settings.reference_prefix.clone(),
    };
    if settings.seed_demo_data {
        seed::demo_tracker(Arc::new(SystemClock), tracker_settings)
    } else {
        Tracker::with_system_clock(tracker_settings)
    }
}

async fn open_auth(settings: &Settings) -> Result<DemoAuth<Storage, Storage>> {
    let local_url = prepare_database_url(&settings.local_storage_url)?;
    let local = Storage::new(&local_url)
        .await
        .context("failed to open local session storage")?;
    let session = Storage::in_memory()
        .await
        .context("failed to open in-memory session storage")?;
    Ok(DemoAuth::new(local, session))
}

fn run_demo(tracker: &mut Tracker, signed_in: Option<User>, settings: &Settings) -> Result<()> {
    let record = demo_walkthrough(tracker, signed_in)?;
    let unread = tracker.unread_notifications().count();
    print_json(&serde_json::json!({
        "record": record,
        "unread_notifications": unread,
        "kpis": tracker.kpis(settings.kpi_months),
    }))
}

/// Declares a record, attaches an action and drives both to completion.
fn demo_walkthrough(tracker: &mut Tracker, signed_in: Option<User>) -> Result<NonConformity> {
    let reporter = match signed_in {
        Some(user) => user,
        None => tracker
            .users()
            .get(seed::seed_user_id(1))
            .cloned()
            .unwrap_or_else(|| tracker.users_mut().add(demo_reporter_draft())),
    };
    let maintenance = seed::seed_user_id(4);
    let today = tracker.today();

    let draft = NcDraft {
        title: "Hydraulic press seal leak".into(),
        description: "Oil found under press 2 at the start of the morning shift.".into(),
        kind: Some(NcType::Process),
        gravity: Some(Gravity::Major),
        department: seed::DEPARTMENTS[2].into(),
        post: seed::POSTS[1].into(),
        assignee_id: Some(maintenance),
        ..NcDraft::default()
    };
    draft.validate().map_err(ApiError::from).map_err(ApiException::from)?;
    let created = tracker.create(draft, &reporter);
    info!(reference = %created.reference, "demo record declared");

    let action_draft = ActionDraft {
        description: "Replace press 2 seal kit".into(),
        assignee_id: maintenance,
        due_date: today + Duration::days(7),
        comment: None,
    };
    action_draft
        .validate()
        .map_err(ApiError::from)
        .map_err(ApiException::from)?;
    let action = api(tracker.add_action(created.id, action_draft))?;

    let mut status = created.status;
    while let Some(next) = status.next() {
        if next == NcStatus::Closed {
            api(tracker.update_action(
                action.id,
                ActionPatch {
                    status: Some(ActionStatus::Done),
                    effectiveness: Some(Effectiveness::Effective),
                    ..ActionPatch::default()
                },
            ))?;
        }
        status = api(tracker.advance_status(created.id, next))?.status;
    }

    tracker
        .get(created.id)
        .cloned()
        .context("demo record disappeared")
}

fn demo_reporter_draft() -> UserDraft {
    UserDraft {
        last_name: "Reporter".into(),
        first_name: "Demo".into(),
        email: "demo@riahisolutions.com".into(),
        role: UserRole::Quality,
        department: seed::DEPARTMENTS[0].into(),
        is_active: true,
    }
}

fn parse_sort_key(raw: &str) -> Result<SortKey> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "date" => Ok(SortKey::Date),
        "gravity" => Ok(SortKey::Gravity),
        "status" => Ok(SortKey::Status),
        other => anyhow::bail!("unknown sort key '{other}', expected date, gravity or status"),
    }
}

fn api<T>(result: Result<T, ApiError>) -> Result<T> {
    result.map_err(|err| ApiException::from(err).into())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
