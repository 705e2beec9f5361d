use std::sync::Arc;

use crate::clock::Clock;
use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::user::{Caller, NewUser, Role, User, UserRepository};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Profile fields a caller may change.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    /// Supervisor only.
    pub role: Option<Role>,
    /// Supervisor only.
    pub department: Option<String>,
}

/// User manager.
#[derive(Clone)]
pub struct UserService {
    pub repo: Arc<dyn UserRepository>,
    pub pwd: Arc<PasswordManager>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(
        repo: Arc<dyn UserRepository>,
        pwd: Arc<PasswordManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, pwd, clock }
    }

    /// Check credentials and stamp `last_login`.
    ///
    /// Unknown, deactivated and wrong-password cases return the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim().to_lowercase();
        let Some(mut user) = self.repo.find_by_username(&username).await? else {
            return Err(ServerError::InvalidCredentials);
        };

        if !user.active || !self.pwd.verify_password(password, &user.password_hash) {
            return Err(ServerError::InvalidCredentials);
        }

        user.last_login = Some(self.clock.now());
        self.repo.update(&user).await?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok(user)
    }

    /// Active user by `id`.
    pub async fn find(&self, id: i64) -> Result<User> {
        match self.repo.find_by_id(id).await? {
            Some(user) if user.active => Ok(user),
            _ => Err(ServerError::NotFound("user")),
        }
    }

    /// Insert a user built by [`crate::user::UserBuilder`].
    pub async fn create(&self, caller: &Caller, new: NewUser) -> Result<User> {
        if !caller.is_supervisor() {
            return Err(ServerError::Forbidden);
        }
        self.insert(new).await
    }

    /// Insert without permission check. Used for seed data.
    pub(crate) async fn insert(&self, new: NewUser) -> Result<User> {
        check_password_strength(&new.password)?;

        if self.repo.username_exists(&new.username, None).await? {
            return Err(ServerError::Conflict {
                field: "username",
                message: "Username is already in use.".into(),
            });
        }
        self.check_name_available(&new.name, None).await?;

        let user = User {
            username: new.username,
            name: new.name,
            role: new.role,
            department: new.department,
            password_hash: self.pwd.hash_password(&new.password)?,
            email: new.email,
            active: true,
            created_at: self.clock.now(),
            ..Default::default()
        };

        let user = self.repo.insert(user).await?;
        tracing::info!(user_id = user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Active users. Supervisor only.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<User>> {
        if !caller.is_supervisor() {
            return Err(ServerError::Forbidden);
        }
        self.repo.list_active().await
    }

    /// Uniqueness pre-check ignoring the record being edited.
    pub async fn username_exists(&self, username: &str, excluding: Option<i64>) -> Result<bool> {
        self.repo
            .username_exists(&username.trim().to_lowercase(), excluding)
            .await
    }

    /// Tickets are owned by their creator's display name, so two users
    /// may never share one.
    async fn check_name_available(&self, name: &str, excluding: Option<i64>) -> Result<()> {
        if self.repo.name_exists(name.trim(), excluding).await? {
            return Err(ServerError::Conflict {
                field: "name",
                message: "Name is already in use.".into(),
            });
        }
        Ok(())
    }

    /// Update the profile of `target`.
    ///
    /// Anyone may edit their own name, email and avatar. Supervisors may
    /// edit anyone, including role and department.
    pub async fn update_profile(
        &self,
        caller: &Caller,
        target: i64,
        update: ProfileUpdate,
    ) -> Result<User> {
        if caller.id != target && !caller.is_supervisor() {
            return Err(ServerError::Forbidden);
        }
        if !caller.is_supervisor() && (update.role.is_some() || update.department.is_some()) {
            return Err(ServerError::Forbidden);
        }

        let mut user = self.find(target).await?;

        if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            let name = name.trim();
            if name != user.name {
                self.check_name_available(name, Some(user.id)).await?;
            }
            user.name = name.to_owned();
        }
        if let Some(email) = update.email {
            user.email = Some(email).filter(|e| !e.trim().is_empty());
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar).filter(|a| !a.trim().is_empty());
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(department) = update.department {
            user.department = department;
        }

        user.updated_at = Some(self.clock.now());
        self.repo.update(&user).await?;
        Ok(user)
    }

    /// Replace the caller's password after re-verifying the current one.
    pub async fn change_password(
        &self,
        caller: &Caller,
        current: &str,
        new: &str,
    ) -> Result<()> {
        let mut user = self.find(caller.id).await?;

        if !self.pwd.verify_password(current, &user.password_hash) {
            return Err(ServerError::field(
                "currentPassword",
                "invalid_password",
                "Current password is incorrect.",
            ));
        }
        check_password_strength(new)?;

        user.password_hash = self.pwd.hash_password(new)?;
        user.updated_at = Some(self.clock.now());
        self.repo.update(&user).await?;

        tracing::info!(user_id = user.id, "password changed");
        Ok(())
    }

    /// Soft delete. Supervisor only, never on oneself.
    pub async fn delete(&self, caller: &Caller, target: i64) -> Result<User> {
        if !caller.is_supervisor() {
            return Err(ServerError::Forbidden);
        }
        if caller.id == target {
            return Err(ServerError::field(
                "id",
                "self_delete",
                "You cannot delete your own account.",
            ));
        }

        let mut user = self.find(target).await?;
        let now = self.clock.now();
        user.active = false;
        user.deleted_at = Some(now);
        user.deleted_by = Some(caller.name.clone());
        user.updated_at = Some(now);
        self.repo.update(&user).await?;

        tracing::info!(user_id = user.id, deleted_by = caller.id, "user deactivated");
        Ok(user)
    }
}

fn check_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServerError::field(
            "password",
            "weak_password",
            "Password must contain at least 6 characters.",
        ));
    }
    Ok(())
}
