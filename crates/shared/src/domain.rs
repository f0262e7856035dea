use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UnknownVariant;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(NcId);
id_newtype!(ActionId);
id_newtype!(NotificationId);

/// Declares a closed enumeration together with its wire key and display
/// label tables. Keys follow the serde `snake_case` spelling of each variant.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($key:literal, $label:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $($key => Ok($name::$variant),)+
                    _ => Err(UnknownVariant::new(stringify!($name), s)),
                }
            }
        }
    };
}

closed_enum!(
    /// Classification of a non-conformity.
    #[derive(Default)]
    NcType {
        #[default]
        Product => ("product", "Product"),
        Process => ("process", "Process"),
        Service => ("service", "Service"),
        Supplier => ("supplier", "Supplier"),
        Client => ("client", "Client"),
    }
);

closed_enum!(
    /// Severity of a non-conformity.
    #[derive(Default)]
    Gravity {
        #[default]
        Minor => ("minor", "Minor"),
        Major => ("major", "Major"),
        Critical => ("critical", "Critical"),
    }
);

closed_enum!(
    /// Workflow position of a non-conformity. Variants are declared in
    /// sequence order.
    #[derive(Default)]
    NcStatus {
        #[default]
        Open => ("open", "Open"),
        UnderAnalysis => ("under_analysis", "Under analysis"),
        ActionLaunched => ("action_launched", "Action launched"),
        Closed => ("closed", "Closed"),
    }
);

closed_enum!(
    #[derive(Default)]
    ActionStatus {
        #[default]
        NotStarted => ("not_started", "Not started"),
        InProgress => ("in_progress", "In progress"),
        Done => ("done", "Done"),
        Overdue => ("overdue", "Overdue"),
    }
);

closed_enum!(
    Effectiveness {
        Effective => ("effective", "Effective"),
        Partial => ("partial", "Partially effective"),
        Ineffective => ("ineffective", "Ineffective"),
    }
);

closed_enum!(
    #[derive(Default)]
    UserRole {
        Admin => ("admin", "Administrator"),
        Quality => ("quality", "Quality"),
        Production => ("production", "Production"),
        Maintenance => ("maintenance", "Maintenance"),
        #[default]
        Standard => ("standard", "Standard user"),
    }
);

closed_enum!(
    NotificationKind {
        NewNc => ("new_nc", "New non-conformity"),
        NcAssigned => ("nc_assigned", "Non-conformity assigned"),
        ActionDue => ("action_due", "Action due"),
        NcClosed => ("nc_closed", "Non-conformity closed"),
        System => ("system", "System"),
    }
);

impl Gravity {
    /// Ordering weight used when sorting by severity.
    pub fn rank(self) -> u8 {
        match self {
            Gravity::Minor => 1,
            Gravity::Major => 2,
            Gravity::Critical => 3,
        }
    }
}

impl NcStatus {
    pub fn rank(self) -> u8 {
        match self {
            NcStatus::Open => 1,
            NcStatus::UnderAnalysis => 2,
            NcStatus::ActionLaunched => 3,
            NcStatus::Closed => 4,
        }
    }

    /// The single step offered by the workflow, `None` once closed.
    pub fn next(self) -> Option<NcStatus> {
        match self {
            NcStatus::Open => Some(NcStatus::UnderAnalysis),
            NcStatus::UnderAnalysis => Some(NcStatus::ActionLaunched),
            NcStatus::ActionLaunched => Some(NcStatus::Closed),
            NcStatus::Closed => None,
        }
    }

    pub fn is_closed(self) -> bool {
        self == NcStatus::Closed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub role: UserRole,
    pub department: String,
    pub is_active: bool,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectiveAction {
    pub id: ActionId,
    pub nc_id: NcId,
    pub description: String,
    pub assignee_id: UserId,
    pub assignee_name: String,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness: Option<Effectiveness>,
}

impl CorrectiveAction {
    /// Past its due date without being done, whether or not it has been
    /// flagged yet.
    pub fn is_late(&self, today: NaiveDate) -> bool {
        match self.status {
            ActionStatus::Overdue => true,
            ActionStatus::Done => false,
            ActionStatus::NotStarted | ActionStatus::InProgress => self.due_date < today,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonConformity {
    pub id: NcId,
    pub reference: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: NcType,
    pub gravity: Gravity,
    pub status: NcStatus,
    pub department: String,
    pub post: String,
    pub reporter_id: UserId,
    pub reporter_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
    pub detection_date: NaiveDate,
    pub declaration_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub actions: Vec<CorrectiveAction>,
}

impl NonConformity {
    /// Days between declaration and closure, `None` while the record is open.
    pub fn resolution_days(&self) -> Option<i64> {
        self.closure_date
            .map(|closed| (closed - self.declaration_date).num_days())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<NcId>,
}
