//! Demo sign-in for the tracker. Accounts, password and tokens are fixed
//! sample values; nothing here is verified cryptographically.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{User, UserId, UserRole},
    error::{ApiError, ErrorCode},
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const TOKEN_KEY: &str = "qtrack_auth_token";
pub const USER_KEY: &str = "qtrack_auth_user";
pub const DEMO_PASSWORD: &str = "Admin123!";

const SESSION_TTL_MINUTES: i64 = 30;
const REMEMBER_ME_TTL_DAYS: i64 = 7;

/// String key-value store holding the token and the serialized user.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("session storage failure: {0}")]
    Storage(#[from] anyhow::Error),
    #[error("failed to encode signed-in user: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AuthError> for ApiError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => ApiError::new(ErrorCode::Unauthorized, value.to_string()),
            other => ApiError::new(ErrorCode::Internal, other.to_string()),
        }
    }
}

/// Signed-in user as persisted under [`USER_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub last_name: String,
    pub first_name: String,
    pub role: String,
    pub department: String,
    pub is_active: bool,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Tracker view of this account. Unrecognised role strings map to
    /// [`UserRole::Standard`].
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            email: self.email.clone(),
            role: self.role.parse().unwrap_or_default(),
            department: self.department.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

pub fn demo_accounts() -> Vec<AuthUser> {
    vec![
        demo_account(
            1,
            "admin@riahisolutions.com",
            ("Mohamed Aziz", "Riahi"),
            UserRole::Admin,
            "Quality management",
            (2024, 1, 15),
        ),
        demo_account(
            2,
            "sarah.benali@riahisolutions.com",
            ("Sarah", "Ben Ali"),
            UserRole::Quality,
            "Quality",
            (2024, 2, 10),
        ),
    ]
}

fn demo_account(
    id: u128,
    email: &str,
    (first_name, last_name): (&str, &str),
    role: UserRole,
    department: &str,
    (year, month, day): (i32, u32, u32),
) -> AuthUser {
    AuthUser {
        id: UserId(Uuid::from_u128(id)),
        email: email.into(),
        last_name: last_name.into(),
        first_name: first_name.into(),
        role: role.as_str().into(),
        department: department.into(),
        is_active: true,
        created_at: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        last_login: None,
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    user: AuthUser,
    expires_at: DateTime<Utc>,
}

/// Sign-in state over two storages: `local` outlives the process, `session`
/// does not. "Remember me" decides which one receives the credentials.
pub struct DemoAuth<L: SessionStorage, S: SessionStorage> {
    local: L,
    session: S,
    accounts: Vec<AuthUser>,
    active: Option<ActiveSession>,
}

impl<L: SessionStorage, S: SessionStorage> DemoAuth<L, S> {
    pub fn new(local: L, session: S) -> Self {
        Self::with_accounts(local, session, demo_accounts())
    }

    pub fn with_accounts(local: L, session: S, accounts: Vec<AuthUser>) -> Self {
        Self {
            local,
            session,
            accounts,
            active: None,
        }
    }

    pub fn current_user(&self) -> Option<&AuthUser> {
        self.active.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.active.is_some()
    }

    pub fn session_expires_at(&self) -> Option<DateTime<Utc>> {
        self.active.as_ref().map(|s| s.expires_at)
    }

    pub fn refresh_session(&self) -> bool {
        self.is_authenticated()
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<AuthUser, AuthError> {
        let email = email.trim();
        let account = self
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .filter(|_| password == DEMO_PASSWORD)
            .cloned();
        let Some(mut user) = account else {
            warn!(email, "rejected demo sign-in");
            return Err(AuthError::InvalidCredentials);
        };

        let now = Utc::now();
        user.last_login = Some(now);
        let token = format!("demo-token-{}", now.timestamp_millis());
        let payload = serde_json::to_string(&user)?;

        let (storage, ttl): (&dyn SessionStorage, Duration) = if remember_me {
            (&self.local, Duration::days(REMEMBER_ME_TTL_DAYS))
        } else {
            (&self.session, Duration::minutes(SESSION_TTL_MINUTES))
        };
        storage.set_item(TOKEN_KEY, &token).await?;
        storage.set_item(USER_KEY, &payload).await?;

        info!(user_id = %user.id, remember_me, "signed in");
        self.active = Some(ActiveSession {
            user: user.clone(),
            expires_at: now + ttl,
        });
        Ok(user)
    }

    /// Rehydrates the signed-in user from storage, local first. A stored user
    /// that fails to parse is discarded from local storage.
    pub async fn restore(&mut self) -> Result<Option<AuthUser>, AuthError> {
        let stored_user = match self.local.get_item(USER_KEY).await? {
            Some(raw) => Some(raw),
            None => self.session.get_item(USER_KEY).await?,
        };
        let stored_token = match self.local.get_item(TOKEN_KEY).await? {
            Some(token) => Some(token),
            None => self.session.get_item(TOKEN_KEY).await?,
        };

        let (Some(raw_user), Some(_token)) = (stored_user, stored_token) else {
            self.active = None;
            return Ok(None);
        };

        match serde_json::from_str::<AuthUser>(&raw_user) {
            Ok(user) => {
                info!(user_id = %user.id, "session restored");
                self.active = Some(ActiveSession {
                    user: user.clone(),
                    expires_at: Utc::now() + Duration::minutes(SESSION_TTL_MINUTES),
                });
                Ok(Some(user))
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable stored user");
                self.local.remove_item(USER_KEY).await?;
                self.local.remove_item(TOKEN_KEY).await?;
                self.active = None;
                Ok(None)
            }
        }
    }

    pub async fn logout(&mut self) -> Result<(), AuthError> {
        for key in [TOKEN_KEY, USER_KEY] {
            self.local.remove_item(key).await?;
            self.session.remove_item(key).await?;
        }
        if let Some(active) = self.active.take() {
            info!(user_id = %active.user.id, "signed out");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
