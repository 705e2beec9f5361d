use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Deserialize;
use validator::Validate;

use crate::clock::Clock;
use crate::error::{Result, ServerError};
use crate::ticket::{
    Attendance, Department, Metrics, Platform, Stats, Status, Ticket, TicketFilter,
    TicketRepository, compute_stats, filter_tickets,
};
use crate::user::Caller;

const TICKET_ID_SUFFIX: usize = 6;

/// Fields supplied by the creator of a ticket.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    #[validate(length(min = 1, max = 120, message = "Company must be 1 to 120 characters long."))]
    pub company: String,
    pub platform: Platform,
    pub department: Department,
    /// First message of the thread.
    #[validate(length(min = 1, message = "Description cannot be empty."))]
    pub description: String,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub in_implementation: bool,
}

/// Generate a human-facing id, e.g. `TK-20261018-7QX2MA`.
pub fn generate_ticket_id(at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TICKET_ID_SUFFIX)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();

    format!("TK-{}-{suffix}", at.format("%Y%m%d"))
}

/// Ticket manager.
///
/// Technicians may only see and mutate tickets they created. Any other
/// ticket is reported as missing.
#[derive(Clone)]
pub struct TicketService {
    pub repo: Arc<dyn TicketRepository>,
    clock: Arc<dyn Clock>,
}

impl TicketService {
    /// Create a new [`TicketService`].
    pub fn new(repo: Arc<dyn TicketRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create(&self, caller: &Caller, new: NewTicket) -> Result<Ticket> {
        if new.company.trim().is_empty() {
            return Err(ServerError::field(
                "company",
                "length",
                "Company must be 1 to 120 characters long.",
            ));
        }
        if new.description.trim().is_empty() {
            return Err(ServerError::field(
                "description",
                "length",
                "Description cannot be empty.",
            ));
        }

        let now = self.clock.now();
        let mut ticket = Ticket {
            id: 0,
            ticket_id: generate_ticket_id(now),
            company: new.company.trim().to_owned(),
            platform: new.platform,
            department: new.department,
            description: String::new(),
            status: new.status.unwrap_or_default(),
            attendance: Attendance::Created,
            attendance_started_at: None,
            attendance_finished_at: None,
            in_implementation: new.in_implementation,
            created_by: caller.name.clone(),
            created_at: now,
            updated_at: None,
            updated_by: None,
        };
        ticket.append_message(&caller.name, now, &new.description);

        let ticket = self.repo.insert(ticket).await?;
        tracing::info!(ticket_id = %ticket.ticket_id, created_by = caller.id, "ticket created");
        Ok(ticket)
    }

    async fn scoped(&self, caller: &Caller) -> Result<Vec<Ticket>> {
        if caller.is_supervisor() {
            self.repo.list().await
        } else {
            self.repo.list_by_creator(&caller.name).await
        }
    }

    /// Filtered view of the tickets visible to `caller`.
    pub async fn list(&self, caller: &Caller, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let tickets = self.scoped(caller).await?;
        Ok(filter_tickets(tickets, filter, caller))
    }

    /// Tickets created today, oldest first.
    pub async fn today(&self, caller: &Caller) -> Result<Vec<Ticket>> {
        let filter = TicketFilter::today(self.clock.now().date_naive());
        self.list(caller, &filter).await
    }

    pub async fn get(&self, caller: &Caller, id: i64) -> Result<Ticket> {
        match self.repo.find(id).await? {
            Some(ticket) if caller.is_supervisor() || ticket.created_by == caller.name => {
                Ok(ticket)
            },
            _ => Err(ServerError::NotFound("ticket")),
        }
    }

    async fn save(&self, caller: &Caller, mut ticket: Ticket, at: DateTime<Utc>) -> Result<Ticket> {
        ticket.updated_at = Some(at);
        ticket.updated_by = Some(caller.name.clone());
        self.repo.update(&ticket).await?;
        Ok(ticket)
    }

    /// Change the status and record the change on the thread.
    pub async fn update_status(&self, caller: &Caller, id: i64, status: Status) -> Result<Ticket> {
        let mut ticket = self.get(caller, id).await?;
        if ticket.status == status {
            return Ok(ticket);
        }

        let now = self.clock.now();
        let message = format!("Status alterado de {} para {}.", ticket.status, status);
        ticket.status = status;
        ticket.append_message(&caller.name, now, &message);

        tracing::debug!(ticket_id = %ticket.ticket_id, %status, "ticket status changed");
        self.save(caller, ticket, now).await
    }

    /// Append a message block to the description thread.
    pub async fn add_message(&self, caller: &Caller, id: i64, message: &str) -> Result<Ticket> {
        if message.trim().is_empty() {
            return Err(ServerError::field(
                "message",
                "length",
                "Message cannot be empty.",
            ));
        }

        let mut ticket = self.get(caller, id).await?;
        let now = self.clock.now();
        ticket.append_message(&caller.name, now, message);
        self.save(caller, ticket, now).await
    }

    /// Supervisor only.
    pub async fn delete(&self, caller: &Caller, id: i64) -> Result<()> {
        if !caller.is_supervisor() {
            return Err(ServerError::Forbidden);
        }
        if !self.repo.delete(id).await? {
            return Err(ServerError::NotFound("ticket"));
        }

        tracing::info!(id, deleted_by = caller.id, "ticket deleted");
        Ok(())
    }

    async fn advance(&self, caller: &Caller, id: i64, target: Attendance) -> Result<Ticket> {
        let mut ticket = self.get(caller, id).await?;
        if ticket.attendance.next() != Some(target) {
            return Err(ServerError::Transition(format!(
                "cannot move attendance from {} to {target}",
                ticket.attendance
            )));
        }

        let now = self.clock.now();
        ticket.attendance = target;
        match target {
            Attendance::InAttendance => ticket.attendance_started_at = Some(now),
            Attendance::Finished => ticket.attendance_finished_at = Some(now),
            Attendance::Created => {},
        }
        ticket.append_message(&caller.name, now, &format!("Atendimento: {target}."));

        self.save(caller, ticket, now).await
    }

    /// `Criado` to `Em Atendimento`.
    pub async fn start_attendance(&self, caller: &Caller, id: i64) -> Result<Ticket> {
        self.advance(caller, id, Attendance::InAttendance).await
    }

    /// `Em Atendimento` to `Finalizado`.
    pub async fn finish_attendance(&self, caller: &Caller, id: i64) -> Result<Ticket> {
        self.advance(caller, id, Attendance::Finished).await
    }

    /// Statistics over the tickets visible to `caller`.
    ///
    /// Supervisors may narrow the scope to one creator with `user`.
    pub async fn stats(&self, caller: &Caller, user: Option<&str>) -> Result<Stats> {
        let user = user.map(str::trim).filter(|u| !u.is_empty());
        let tickets = match user {
            Some(creator) if caller.is_supervisor() => self.repo.list_by_creator(creator).await?,
            _ => self.scoped(caller).await?,
        };

        Ok(compute_stats(&tickets, self.clock.now().date_naive()))
    }

    /// Global counters, regardless of any caller.
    pub async fn metrics(&self) -> Result<Metrics> {
        let tickets = self.repo.list().await?;
        let stats = compute_stats(&tickets, self.clock.now().date_naive());
        Ok(Metrics::from(&stats))
    }
}
