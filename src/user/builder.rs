//! Typed builder for new users.

use crate::user::Role;

/// [`NewUser`] builder.
///
/// `build` only exists once both `username` and `password` are set.
#[derive(Debug, Clone)]
pub struct UserBuilder<Username, Password> {
    username: Username,
    password: Password,
    name: String,
    role: Role,
    department: String,
    email: Option<String>,
}

/// Value is missing on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Missing;

/// Value is present on [`UserBuilder`].
#[derive(Debug, Clone)]
pub struct Present<T>(pub T);

/// User ready to be hashed and inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub department: String,
    pub email: Option<String>,
}

impl Default for UserBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl UserBuilder<Missing, Missing> {
    /// Create a new [`UserBuilder`].
    pub fn new() -> Self {
        Self {
            username: Missing,
            password: Missing,
            name: String::default(),
            role: Role::Technician,
            department: String::default(),
            email: None,
        }
    }
}

impl<Password> UserBuilder<Missing, Password> {
    /// Update `username` field on [`UserBuilder`].
    pub fn username(
        self,
        username: impl Into<String>,
    ) -> UserBuilder<Present<String>, Password> {
        UserBuilder {
            username: Present(username.into().trim().to_lowercase()),
            password: self.password,
            name: self.name,
            role: self.role,
            department: self.department,
            email: self.email,
        }
    }
}

impl<Username> UserBuilder<Username, Missing> {
    /// Update `password` field on [`UserBuilder`].
    pub fn password(
        self,
        password: impl Into<String>,
    ) -> UserBuilder<Username, Present<String>> {
        UserBuilder {
            username: self.username,
            password: Present(password.into()),
            name: self.name,
            role: self.role,
            department: self.department,
            email: self.email,
        }
    }
}

impl<Username, Password> UserBuilder<Username, Password> {
    /// Update `name` field on [`UserBuilder`].
    pub fn name(mut self, name: impl ToString) -> Self {
        self.name = name.to_string();
        self
    }

    /// Update `role` field on [`UserBuilder`].
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Update `department` field on [`UserBuilder`].
    pub fn department(mut self, department: impl ToString) -> Self {
        self.department = department.to_string();
        self
    }

    /// Update `email` field on [`UserBuilder`].
    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }
}

impl UserBuilder<Present<String>, Present<String>> {
    /// Build a [`NewUser`].
    pub fn build(self) -> NewUser {
        let name = if self.name.trim().is_empty() {
            self.username.0.clone()
        } else {
            self.name
        };

        NewUser {
            username: self.username.0,
            password: self.password.0,
            name,
            role: self.role,
            department: self.department,
            email: self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let user = UserBuilder::new()
            .name("Maria Santos")
            .username(" Suporte2 ")
            .password("suporte123")
            .department("Suporte")
            .email(Some(String::new()))
            .build();

        assert_eq!(user.username, "suporte2");
        assert_eq!(user.name, "Maria Santos");
        assert_eq!(user.role, Role::Technician);
        assert_eq!(user.email, None);
    }

    #[test]
    fn test_name_defaults_to_username() {
        let user = UserBuilder::new()
            .password("admin123")
            .username("admin")
            .role(Role::Supervisor)
            .build();

        assert_eq!(user.name, "admin");
        assert_eq!(user.role, Role::Supervisor);
    }
}
