use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{
        ActionStatus, Effectiveness, Gravity, NcStatus, NcType, NonConformity, UserId, UserRole,
    },
    error::ValidationErrors,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NcDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: Option<NcType>,
    #[serde(default)]
    pub gravity: Option<Gravity>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub post: String,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub detection_date: Option<NaiveDate>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub impact_description: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl NcDraft {
    /// Required-field check run by forms before submission.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "title is required");
        errors.require("description", &self.description, "description is required");
        errors.require("department", &self.department, "department is required");
        errors.require("post", &self.post, "post is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NcPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<NcType>,
    pub gravity: Option<Gravity>,
    pub department: Option<String>,
    pub post: Option<String>,
    pub assignee_id: Option<UserId>,
    pub detection_date: Option<NaiveDate>,
    pub root_cause: Option<String>,
    pub impact_description: Option<String>,
    pub attachments: Option<Vec<String>>,
}

impl NcPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(title) = &self.title {
            errors.require("title", title, "title is required");
        }
        if let Some(description) = &self.description {
            errors.require("description", description, "description is required");
        }
        if let Some(department) = &self.department {
            errors.require("department", department, "department is required");
        }
        if let Some(post) = &self.post {
            errors.require("post", post, "post is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDraft {
    pub description: String,
    pub assignee_id: UserId,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ActionDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("description", &self.description, "description is required");
        errors.into_result()
    }
}

/// Partial update of a corrective action. There is no
/// completion date field: it is stamped when the status moves to done.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionPatch {
    pub description: Option<String>,
    pub assignee_id: Option<UserId>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<ActionStatus>,
    pub comment: Option<String>,
    pub effectiveness: Option<Effectiveness>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDraft {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub department: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl UserDraft {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("last_name", &self.last_name, "last name is required");
        errors.require("first_name", &self.first_name, "first name is required");
        errors.require("email", &self.email, "email is required");
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub department: Option<String>,
    pub is_active: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Gravity,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NcQuery {
    pub search: Option<String>,
    pub gravity: Option<Gravity>,
    pub status: Option<NcStatus>,
    #[serde(rename = "type")]
    pub kind: Option<NcType>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveFilter {
    #[default]
    All,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    #[serde(default)]
    pub active: ActiveFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub admins: usize,
    pub quality: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub open: usize,
    pub under_analysis: usize,
    pub action_launched: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn<'a> {
    pub status: NcStatus,
    pub label: &'static str,
    pub records: Vec<&'a NonConformity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub gravity: Option<Gravity>,
    #[serde(default, rename = "type")]
    pub kind: Option<NcType>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
    pub actions_total: usize,
    pub actions_done: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Calendar month as `YYYY-MM`.
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount<K> {
    pub key: K,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    pub total: usize,
    pub open: usize,
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
    pub overdue_actions: usize,
    /// Mean days from declaration to closure over closed records.
    pub mean_resolution_days: f64,
    /// Closed records as a percentage of all records.
    pub resolution_rate: f64,
    pub by_month: Vec<MonthlyCount>,
    pub by_type: Vec<CategoryCount<NcType>>,
    pub by_gravity: Vec<CategoryCount<Gravity>>,
    pub by_status: Vec<CategoryCount<NcStatus>>,
}
