//! In-memory entity store for non-conformities, corrective actions and the
//! user directory, with the read-side views and KPI aggregation built on it.

use std::sync::Arc;

use chrono::NaiveDate;
use shared::{
    domain::{NcId, NonConformity, Notification},
    protocol::KpiReport,
};

pub mod clock;
pub mod directory;
pub mod lifecycle;
pub mod reports;
pub mod seed;
pub mod views;

pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::UserDirectory;

pub const DEFAULT_REFERENCE_PREFIX: &str = "NC";

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Leading segment of generated reference codes, e.g. `NC` in `NC-2026-001`.
    pub reference_prefix: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            reference_prefix: DEFAULT_REFERENCE_PREFIX.into(),
        }
    }
}

/// Owner of all tracker state. Mutation goes through `&mut self` methods in
/// [`lifecycle`] and [`directory`]; views take a `&[NonConformity]` snapshot.
pub struct Tracker {
    clock: Arc<dyn Clock>,
    settings: TrackerSettings,
    records: Vec<NonConformity>,
    users: UserDirectory,
    notifications: Vec<Notification>,
}

impl Tracker {
    pub fn new(clock: Arc<dyn Clock>, settings: TrackerSettings) -> Self {
        Self {
            users: UserDirectory::new(clock.clone()),
            clock,
            settings,
            records: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn with_system_clock(settings: TrackerSettings) -> Self {
        Self::new(Arc::new(SystemClock), settings)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Records, most recently declared first.
    pub fn records(&self) -> &[NonConformity] {
        &self.records
    }

    pub fn get(&self, id: NcId) -> Option<&NonConformity> {
        self.records.iter().find(|nc| nc.id == id)
    }

    pub fn find_by_reference(&self, reference: &str) -> Option<&NonConformity> {
        self.records
            .iter()
            .find(|nc| nc.reference.eq_ignore_ascii_case(reference.trim()))
    }

    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut UserDirectory {
        &mut self.users
    }

    /// Newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn kpis(&self, months: u32) -> KpiReport {
        reports::kpi_report(&self.records, self.today(), months)
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod lifecycle_tests;

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod directory_tests;

#[cfg(test)]
#[path = "tests/views_tests.rs"]
mod views_tests;

#[cfg(test)]
#[path = "tests/reports_tests.rs"]
mod reports_tests;
