use std::sync::Arc;

use shared::{
    domain::{User, UserId, UserRole},
    error::{ApiError, ErrorCode},
    protocol::{ActiveFilter, UserDraft, UserPatch, UserQuery, UserStats},
};
use tracing::info;

use crate::clock::Clock;

/// Account list behind the user-management screen. Email addresses are
/// neither validated nor required to be unique.
pub struct UserDirectory {
    clock: Arc<dyn Clock>,
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            users: Vec::new(),
        }
    }

    pub fn all(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        let email = email.trim();
        self.users.iter().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    /// "First Last" for a known user, empty for an unknown id.
    pub fn display_name(&self, id: UserId) -> String {
        self.get(id).map(User::display_name).unwrap_or_default()
    }

    pub fn add(&mut self, draft: UserDraft) -> User {
        let user = User {
            id: UserId::generate(),
            last_name: draft.last_name,
            first_name: draft.first_name,
            email: draft.email,
            role: draft.role,
            department: draft.department,
            is_active: draft.is_active,
            created_at: self.clock.today(),
            last_login: None,
        };
        info!(user_id = %user.id, role = %user.role, "user added");
        self.users.push(user.clone());
        user
    }

    /// Inserts an existing account as-is.
    pub fn insert(&mut self, user: User) {
        self.users.push(user);
    }

    pub fn edit(&mut self, id: UserId, patch: UserPatch) -> Result<User, ApiError> {
        let user = self.user_mut(id)?;
        if let Some(last_name) = patch.last_name {
            user.last_name = last_name;
        }
        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(department) = patch.department {
            user.department = department;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        if let Some(last_login) = patch.last_login {
            user.last_login = Some(last_login);
        }
        info!(user_id = %id, "user edited");
        Ok(user.clone())
    }

    /// Removes the account. Records that captured this user's name keep
    /// their snapshot.
    pub fn delete(&mut self, id: UserId) -> Result<User, ApiError> {
        let position = self
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(user_not_found)?;
        let removed = self.users.remove(position);
        info!(user_id = %id, "user deleted");
        Ok(removed)
    }

    pub fn toggle_active(&mut self, id: UserId) -> Result<User, ApiError> {
        let user = self.user_mut(id)?;
        user.is_active = !user.is_active;
        info!(user_id = %id, active = user.is_active, "user activation toggled");
        Ok(user.clone())
    }

    pub fn filter(&self, query: &UserQuery) -> Vec<&User> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.users
            .iter()
            .filter(|user| {
                needle.as_deref().map_or(true, |needle| {
                    user.last_name.to_lowercase().contains(needle)
                        || user.first_name.to_lowercase().contains(needle)
                        || user.email.to_lowercase().contains(needle)
                })
            })
            .filter(|user| query.role.map_or(true, |role| user.role == role))
            .filter(|user| match query.active {
                ActiveFilter::All => true,
                ActiveFilter::Active => user.is_active,
                ActiveFilter::Inactive => !user.is_active,
            })
            .collect()
    }

    pub fn stats(&self) -> UserStats {
        UserStats {
            total: self.users.len(),
            active: self.users.iter().filter(|u| u.is_active).count(),
            admins: self.count_role(UserRole::Admin),
            quality: self.count_role(UserRole::Quality),
        }
    }

    fn count_role(&self, role: UserRole) -> usize {
        self.users.iter().filter(|u| u.role == role).count()
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut User, ApiError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(user_not_found)
    }
}

fn user_not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "user not found")
}
