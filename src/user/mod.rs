mod builder;
mod repository;
mod service;

pub use builder::*;
pub use repository::*;
pub use service::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Access level of a [`User`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Supervisor,
    #[default]
    #[serde(rename = "Tecnico")]
    Technician,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supervisor => "Supervisor",
            Role::Technician => "Tecnico",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Supervisor" => Ok(Role::Supervisor),
            "Tecnico" => Ok(Role::Technician),
            _ => Err(format!("unknown role `{s}`")),
        }
    }
}

/// User as saved on database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub department: String,
    #[serde(skip)]
    pub password_hash: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

/// Authenticated user behind a request.
#[derive(Clone, Debug, PartialEq)]
pub struct Caller {
    pub id: i64,
    pub name: String,
    pub role: Role,
}

impl Caller {
    pub fn is_supervisor(&self) -> bool {
        self.role == Role::Supervisor
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(
            serde_json::to_string(&Role::Technician).unwrap(),
            r#""Tecnico""#
        );
        assert_eq!("Supervisor".parse::<Role>().unwrap(), Role::Supervisor);
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let user = User {
            username: "admin".into(),
            password_hash: "$argon2id$secret".into(),
            ..Default::default()
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("deletedAt"));
    }
}
