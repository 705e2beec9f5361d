//! Handle database requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::{Result, ServerError};
use crate::ticket::Ticket;

/// Storage port for [`Ticket`].
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert [`Ticket`] and return it with its assigned `id`.
    async fn insert(&self, ticket: Ticket) -> Result<Ticket>;

    /// Every ticket, in no particular order.
    async fn list(&self) -> Result<Vec<Ticket>>;

    /// Tickets whose `created_by` is exactly `creator`.
    async fn list_by_creator(&self, creator: &str) -> Result<Vec<Ticket>>;

    async fn find(&self, id: i64) -> Result<Option<Ticket>>;

    /// Persist status, description, attendance and update stamps.
    async fn update(&self, ticket: &Ticket) -> Result<()>;

    /// Return `false` when nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(Debug, Clone, FromRow)]
struct TicketRecord {
    id: i64,
    ticket_id: String,
    company: String,
    platform: String,
    department: String,
    description: String,
    status: String,
    attendance: String,
    attendance_started_at: Option<DateTime<Utc>>,
    attendance_finished_at: Option<DateTime<Utc>>,
    in_implementation: bool,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<String>,
}

fn corrupted(details: String) -> ServerError {
    ServerError::Internal {
        details,
        source: None,
    }
}

impl TryFrom<TicketRecord> for Ticket {
    type Error = ServerError;

    fn try_from(record: TicketRecord) -> Result<Self> {
        Ok(Ticket {
            id: record.id,
            ticket_id: record.ticket_id,
            company: record.company,
            platform: record.platform.parse().map_err(corrupted)?,
            department: record.department.parse().map_err(corrupted)?,
            description: record.description,
            status: record.status.parse().map_err(corrupted)?,
            attendance: record.attendance.parse().map_err(corrupted)?,
            attendance_started_at: record.attendance_started_at,
            attendance_finished_at: record.attendance_finished_at,
            in_implementation: record.in_implementation,
            created_by: record.created_by,
            created_at: record.created_at,
            updated_at: record.updated_at,
            updated_by: record.updated_by,
        })
    }
}

const TICKET_COLUMNS: &str = r#"id, ticket_id, company, platform, department, description,
    status, attendance, attendance_started_at, attendance_finished_at, in_implementation,
    created_by, created_at, updated_at, updated_by"#;

/// PostgreSQL ticket repository.
#[derive(Clone)]
pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    /// Create a new [`PgTicketRepository`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket> {
        let record = sqlx::query_as::<_, TicketRecord>(&format!(
            r#"INSERT INTO tickets (ticket_id, company, platform, department, description, status,
                    attendance, in_implementation, created_by, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING {TICKET_COLUMNS}"#
        ))
        .bind(&ticket.ticket_id)
        .bind(&ticket.company)
        .bind(ticket.platform.as_str())
        .bind(ticket.department.as_str())
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.attendance.as_str())
        .bind(ticket.in_implementation)
        .bind(&ticket.created_by)
        .bind(ticket.created_at)
        .fetch_one(&self.pool)
        .await?;

        record.try_into()
    }

    async fn list(&self) -> Result<Vec<Ticket>> {
        sqlx::query_as::<_, TicketRecord>(&format!("SELECT {TICKET_COLUMNS} FROM tickets"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Ticket::try_from)
            .collect()
    }

    async fn list_by_creator(&self, creator: &str) -> Result<Vec<Ticket>> {
        sqlx::query_as::<_, TicketRecord>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE created_by = $1"
        ))
        .bind(creator)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Ticket::try_from)
        .collect()
    }

    async fn find(&self, id: i64) -> Result<Option<Ticket>> {
        sqlx::query_as::<_, TicketRecord>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Ticket::try_from)
        .transpose()
    }

    async fn update(&self, ticket: &Ticket) -> Result<()> {
        sqlx::query(
            r#"UPDATE tickets
                SET description = $2, status = $3, attendance = $4, attendance_started_at = $5,
                    attendance_finished_at = $6, in_implementation = $7, updated_at = $8,
                    updated_by = $9
                WHERE id = $1"#,
        )
        .bind(ticket.id)
        .bind(&ticket.description)
        .bind(ticket.status.as_str())
        .bind(ticket.attendance.as_str())
        .bind(ticket.attendance_started_at)
        .bind(ticket.attendance_finished_at)
        .bind(ticket.in_implementation)
        .bind(ticket.updated_at)
        .bind(&ticket.updated_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
