//! Ticket filtering.
//!
//! Every field of [`TicketFilter`] is an independent predicate. An absent,
//! empty or blank field puts no constraint on the result.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::ticket::{Department, Platform, Status, Ticket};
use crate::user::Caller;

/// Result ordering on creation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Newest,
    /// Oldest first, used by the "today" queue.
    Oldest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "desc" | "newest" => Ok(SortOrder::Newest),
            "asc" | "oldest" => Ok(SortOrder::Oldest),
            _ => Err(format!("unknown order `{s}`")),
        }
    }
}

/// Optional predicates over a ticket list.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketFilter {
    /// Case-insensitive substring of the company.
    #[serde(deserialize_with = "blank_as_none")]
    pub company: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub platform: Option<Platform>,
    #[serde(deserialize_with = "blank_as_none")]
    pub status: Option<Status>,
    #[serde(deserialize_with = "blank_as_none")]
    pub department: Option<Department>,
    /// Inclusive lower bound on the creation day.
    #[serde(deserialize_with = "blank_as_none")]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the creation day.
    #[serde(deserialize_with = "blank_as_none")]
    pub to: Option<NaiveDate>,
    /// Case-insensitive substring of the creator. Supervisor only.
    #[serde(deserialize_with = "blank_as_none")]
    pub created_by: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub in_implementation: Option<bool>,
    #[serde(deserialize_with = "blank_as_none")]
    pub order: Option<SortOrder>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TicketFilter {
    /// Queue of tickets created on `day`, oldest first.
    pub fn today(day: NaiveDate) -> Self {
        Self {
            from: Some(day),
            to: Some(day),
            order: Some(SortOrder::Oldest),
            ..Default::default()
        }
    }

    /// Whether `ticket` satisfies every present predicate.
    ///
    /// `created_by` is only honoured for supervisors.
    pub fn matches(&self, ticket: &Ticket, caller: &Caller) -> bool {
        let day = ticket.created_at.date_naive();

        present(&self.company).is_none_or(|c| contains_ignore_case(&ticket.company, c))
            && self.platform.is_none_or(|p| ticket.platform == p)
            && self.status.is_none_or(|s| ticket.status == s)
            && self.department.is_none_or(|d| ticket.department == d)
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
            && (!caller.is_supervisor()
                || present(&self.created_by)
                    .is_none_or(|c| contains_ignore_case(&ticket.created_by, c)))
            && self
                .in_implementation
                .is_none_or(|flag| ticket.in_implementation == flag)
    }
}

/// Role-scoped, filtered and sorted view over `tickets`.
///
/// Technicians only ever see tickets they created.
pub fn filter_tickets(
    tickets: Vec<Ticket>,
    filter: &TicketFilter,
    caller: &Caller,
) -> Vec<Ticket> {
    let mut tickets: Vec<Ticket> = tickets
        .into_iter()
        .filter(|t| caller.is_supervisor() || t.created_by == caller.name)
        .filter(|t| filter.matches(t, caller))
        .collect();

    match filter.order.unwrap_or_default() {
        SortOrder::Newest => tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::Oldest => tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }

    tickets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::Attendance;
    use crate::user::Role;
    use chrono::{TimeZone, Utc};

    fn ticket(id: i64, company: &str, status: Status, by: &str, day: u32) -> Ticket {
        Ticket {
            id,
            ticket_id: format!("TK-{id}"),
            company: company.into(),
            platform: if id % 2 == 0 { Platform::Gronerzap } else { Platform::Intercom },
            department: Department::Support,
            description: String::new(),
            status,
            attendance: Attendance::Created,
            attendance_started_at: None,
            attendance_finished_at: None,
            in_implementation: id == 3,
            created_by: by.into(),
            created_at: Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap(),
            updated_at: None,
            updated_by: None,
        }
    }

    fn tickets() -> Vec<Ticket> {
        vec![
            ticket(1, "Acme", Status::Resolved, "Maria Santos", 10),
            ticket(2, "Acme", Status::Pending, "Pedro Costa", 12),
            ticket(3, "Zen", Status::Resolved, "Maria Santos", 15),
        ]
    }

    fn supervisor() -> Caller {
        Caller { id: 1, name: "Administrador".into(), role: Role::Supervisor }
    }

    fn technician(name: &str) -> Caller {
        Caller { id: 2, name: name.into(), role: Role::Technician }
    }

    fn ids(tickets: &[Ticket]) -> Vec<i64> {
        tickets.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_empty_filter_returns_everything() {
        let result = filter_tickets(tickets(), &TicketFilter::default(), &supervisor());
        assert_eq!(ids(&result), vec![3, 2, 1]);
    }

    #[test]
    fn test_company_is_case_insensitive() {
        let filter = TicketFilter {
            company: Some("acme".into()),
            ..Default::default()
        };
        let result = filter_tickets(tickets(), &filter, &supervisor());
        assert_eq!(ids(&result), vec![2, 1]);
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let filter = TicketFilter {
            company: Some("   ".into()),
            created_by: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter_tickets(tickets(), &filter, &supervisor()).len(), 3);
    }

    #[test]
    fn test_technician_only_sees_own_tickets() {
        let filter = TicketFilter {
            company: Some("acme".into()),
            created_by: Some("pedro".into()),
            ..Default::default()
        };
        let result = filter_tickets(tickets(), &filter, &technician("Maria Santos"));

        assert_eq!(ids(&result), vec![1]);
        assert!(result.iter().all(|t| t.created_by == "Maria Santos"));
    }

    #[test]
    fn test_conjunction() {
        let filter = TicketFilter {
            status: Some(Status::Resolved),
            platform: Some(Platform::Intercom),
            in_implementation: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tickets(tickets(), &filter, &supervisor())), vec![3]);
    }

    #[test]
    fn test_inclusive_date_range() {
        let filter = TicketFilter {
            from: NaiveDate::from_ymd_opt(2026, 10, 10),
            to: NaiveDate::from_ymd_opt(2026, 10, 12),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tickets(tickets(), &filter, &supervisor())), vec![2, 1]);
    }

    #[test]
    fn test_today_queue_is_oldest_first() {
        let mut list = tickets();
        list.push(ticket(4, "Nosso Sol", Status::Pending, "Pedro Costa", 15));
        list[3].created_at = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();

        let filter = TicketFilter::today(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        assert_eq!(ids(&filter_tickets(list, &filter, &supervisor())), vec![4, 3]);
    }

    #[test]
    fn test_query_string() {
        let filter: TicketFilter = serde_json::from_value(serde_json::json!({
            "company": "",
            "platform": "INTERCOM",
            "status": "",
            "department": "Criação",
            "from": "2026-10-01",
            "to": "",
            "inImplementation": "true",
            "order": "asc",
        }))
        .unwrap();

        assert_eq!(filter.company, None);
        assert_eq!(filter.platform, Some(Platform::Intercom));
        assert_eq!(filter.status, None);
        assert_eq!(filter.department, Some(Department::Creation));
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2026, 10, 1));
        assert_eq!(filter.in_implementation, Some(true));
        assert_eq!(filter.order, Some(SortOrder::Oldest));
    }
}
