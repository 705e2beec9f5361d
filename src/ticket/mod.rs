//! Support tickets.

mod filter;
mod repository;
mod service;
mod stats;

pub use filter::*;
pub use repository::*;
pub use service::*;
pub use stats::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between two blocks of a description thread.
pub const MESSAGE_SEPARATOR: &str = "\n---\n";

/// Origin channel of a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "INTERCOM")]
    Intercom,
    #[serde(rename = "GRONERZAP")]
    Gronerzap,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Intercom, Platform::Gronerzap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Intercom => "INTERCOM",
            Platform::Gronerzap => "GRONERZAP",
        }
    }
}

/// Routing department of a ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Criação")]
    Creation,
    #[serde(rename = "Precificação")]
    Pricing,
    #[serde(rename = "Fluxos")]
    Flows,
    #[serde(rename = "Automações")]
    Automations,
    #[serde(rename = "Reunião")]
    Meeting,
    #[serde(rename = "TechLead")]
    TechLead,
    #[serde(rename = "Suporte")]
    Support,
    #[serde(rename = "Engenharia")]
    Engineering,
}

impl Department {
    pub const ALL: [Department; 8] = [
        Department::Creation,
        Department::Pricing,
        Department::Flows,
        Department::Automations,
        Department::Meeting,
        Department::TechLead,
        Department::Support,
        Department::Engineering,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Creation => "Criação",
            Department::Pricing => "Precificação",
            Department::Flows => "Fluxos",
            Department::Automations => "Automações",
            Department::Meeting => "Reunião",
            Department::TechLead => "TechLead",
            Department::Support => "Suporte",
            Department::Engineering => "Engenharia",
        }
    }
}

/// Resolution status of a ticket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "Em Andamento")]
    InProgress,
    #[serde(rename = "Resolvido")]
    Resolved,
    #[serde(rename = "Pendente")]
    Pending,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::InProgress => "Em Andamento",
            Status::Resolved => "Resolvido",
            Status::Pending => "Pendente",
        }
    }
}

/// Operator engagement with a ticket. Only moves forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attendance {
    #[default]
    #[serde(rename = "Criado")]
    Created,
    #[serde(rename = "Em Atendimento")]
    InAttendance,
    #[serde(rename = "Finalizado")]
    Finished,
}

impl Attendance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attendance::Created => "Criado",
            Attendance::InAttendance => "Em Atendimento",
            Attendance::Finished => "Finalizado",
        }
    }

    /// The only state reachable from `self`, if any.
    pub fn next(&self) -> Option<Attendance> {
        match self {
            Attendance::Created => Some(Attendance::InAttendance),
            Attendance::InAttendance => Some(Attendance::Finished),
            Attendance::Finished => None,
        }
    }
}

macro_rules! wire_enum {
    ($($ty:ty => [$($variant:expr),+]),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    [$($variant),+]
                        .into_iter()
                        .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                        .ok_or_else(|| format!("unknown {} `{s}`", stringify!($ty).to_lowercase()))
                }
            }
        )+
    };
}

wire_enum! {
    Platform => [Platform::Intercom, Platform::Gronerzap],
    Department => [
        Department::Creation, Department::Pricing, Department::Flows, Department::Automations,
        Department::Meeting, Department::TechLead, Department::Support, Department::Engineering
    ],
    Status => [Status::InProgress, Status::Resolved, Status::Pending],
    Attendance => [Attendance::Created, Attendance::InAttendance, Attendance::Finished],
}

/// Ticket as saved on database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: i64,
    /// Human-facing identifier, e.g. `TK-20261018-7QX2MA`.
    pub ticket_id: String,
    pub company: String,
    pub platform: Platform,
    pub department: Department,
    /// Message thread, see [`Ticket::append_message`].
    pub description: String,
    pub status: Status,
    pub attendance: Attendance,
    pub attendance_started_at: Option<DateTime<Utc>>,
    pub attendance_finished_at: Option<DateTime<Utc>>,
    pub in_implementation: bool,
    /// Display name of the creator.
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl Ticket {
    /// Append a message block to the description thread.
    pub fn append_message(&mut self, author: &str, at: DateTime<Utc>, text: &str) {
        let block = message_block(author, at, text);
        if self.description.is_empty() {
            self.description = block;
        } else {
            self.description.push_str(MESSAGE_SEPARATOR);
            self.description.push_str(&block);
        }
    }

    /// Blocks of the description thread, oldest first.
    pub fn messages(&self) -> Vec<&str> {
        if self.description.is_empty() {
            return Vec::new();
        }
        self.description.split(MESSAGE_SEPARATOR).collect()
    }
}

/// Format one block of a description thread.
pub fn message_block(author: &str, at: DateTime<Utc>, text: &str) -> String {
    format!("[{}] {author}:\n{}", at.format("%d/%m/%Y %H:%M"), text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&Department::Automations).unwrap(),
            r#""Automações""#
        );
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            r#""Em Andamento""#
        );
        assert_eq!("gronerzap".parse::<Platform>().unwrap(), Platform::Gronerzap);
        assert_eq!("Reunião".parse::<Department>().unwrap(), Department::Meeting);
        assert!("Marketing".parse::<Department>().is_err());
        assert!(serde_json::from_str::<Platform>(r#""WHATSAPP""#).is_err());
    }

    #[test]
    fn test_attendance_only_moves_forward() {
        assert_eq!(Attendance::Created.next(), Some(Attendance::InAttendance));
        assert_eq!(Attendance::InAttendance.next(), Some(Attendance::Finished));
        assert_eq!(Attendance::Finished.next(), None);
        assert!(Attendance::Created < Attendance::Finished);
    }

    #[test]
    fn test_message_thread() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap();
        let mut ticket = Ticket {
            id: 1,
            ticket_id: "TK-20261018-AAAAAA".into(),
            company: "Acme".into(),
            platform: Platform::Intercom,
            department: Department::Support,
            description: String::new(),
            status: Status::InProgress,
            attendance: Attendance::Created,
            attendance_started_at: None,
            attendance_finished_at: None,
            in_implementation: false,
            created_by: "Maria Santos".into(),
            created_at: at,
            updated_at: None,
            updated_by: None,
        };

        ticket.append_message("Maria Santos", at, " Cliente sem acesso ");
        ticket.append_message("João Silva", at, "Acesso liberado");

        assert_eq!(
            ticket.messages(),
            vec![
                "[18/10/2026 09:05] Maria Santos:\nCliente sem acesso",
                "[18/10/2026 09:05] João Silva:\nAcesso liberado",
            ]
        );
    }
}
