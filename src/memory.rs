//! In-memory store, used when no PostgreSQL is configured.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::AppState;
use crate::error::Result;
use crate::session::{SessionRepository, StoredSession};
use crate::ticket::{
    Attendance, Department, Platform, Status, Ticket, TicketRepository, generate_ticket_id,
};
use crate::user::{Role, User, UserBuilder, UserRepository};

/// Users, tickets and sessions kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    tickets: RwLock<Vec<Ticket>>,
    sessions: RwLock<HashMap<String, StoredSession>>,
    user_sequence: AtomicI64,
    ticket_sequence: AtomicI64,
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, mut user: User) -> Result<User> {
        user.id = self.user_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.users.write().await.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.active)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<()> {
        if let Some(stored) = self.users.write().await.iter_mut().find(|u| u.id == user.id) {
            *stored = user.clone();
        }
        Ok(())
    }

    async fn username_exists(&self, username: &str, excluding: Option<i64>) -> Result<bool> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .any(|u| u.username == username && Some(u.id) != excluding))
    }

    async fn name_exists(&self, name: &str, excluding: Option<i64>) -> Result<bool> {
        let name = name.to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .iter()
            .any(|u| u.name.to_lowercase() == name && Some(u.id) != excluding))
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert(&self, mut ticket: Ticket) -> Result<Ticket> {
        ticket.id = self.ticket_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.tickets.write().await.push(ticket.clone());
        Ok(ticket)
    }

    async fn list(&self) -> Result<Vec<Ticket>> {
        Ok(self.tickets.read().await.clone())
    }

    async fn list_by_creator(&self, creator: &str) -> Result<Vec<Ticket>> {
        Ok(self
            .tickets
            .read()
            .await
            .iter()
            .filter(|t| t.created_by == creator)
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Ticket>> {
        Ok(self.tickets.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn update(&self, ticket: &Ticket) -> Result<()> {
        if let Some(stored) = self.tickets.write().await.iter_mut().find(|t| t.id == ticket.id) {
            *stored = ticket.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tickets = self.tickets.write().await;
        let before = tickets.len();
        tickets.retain(|t| t.id != id);
        Ok(tickets.len() != before)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn insert(&self, session: StoredSession) -> Result<()> {
        self.sessions.write().await.insert(session.id.clone(), session);
        Ok(())
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.read().await.contains_key(id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: i64) -> Result<()> {
        self.sessions.write().await.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

const SUPERVISOR_NAME: &str = "Administrador do Sistema";

/// Demo accounts: one supervisor and three technicians.
const ACCOUNTS: [(&str, &str, &str, Role, &str); 4] = [
    ("admin", "admin123", SUPERVISOR_NAME, Role::Supervisor, "TechLead"),
    ("suporte1", "suporte123", "João Silva", Role::Technician, "Suporte"),
    ("suporte2", "suporte123", "Maria Santos", Role::Technician, "Suporte"),
    ("suporte3", "suporte123", "Pedro Costa", Role::Technician, "Suporte"),
];

/// Demo tickets, with their age in days.
const TICKETS: [(&str, &str, Platform, i64); 3] = [
    ("Futuro Solar", "Mensagem automática fim de expediente", Platform::Intercom, 1),
    ("MV2 Engenharia", "UpSell e DownSell", Platform::Intercom, 1),
    ("Nosso Sol", "Mensagem de bom dia", Platform::Gronerzap, 0),
];

/// Fill an empty store with demo accounts and tickets.
pub async fn seed(state: &AppState) -> Result<()> {
    for (username, password, name, role, department) in ACCOUNTS {
        let user = UserBuilder::new()
            .username(username)
            .password(password)
            .name(name)
            .role(role)
            .department(department)
            .build();
        state.users.insert(user).await?;
    }

    let now = state.clock.now();
    for (company, subject, platform, age) in TICKETS {
        let created_at = now - Duration::days(age);
        let mut ticket = Ticket {
            id: 0,
            ticket_id: generate_ticket_id(created_at),
            company: company.to_owned(),
            platform,
            department: Department::Support,
            description: String::new(),
            status: Status::Resolved,
            attendance: Attendance::Finished,
            attendance_started_at: Some(created_at),
            attendance_finished_at: Some(created_at),
            in_implementation: false,
            created_by: SUPERVISOR_NAME.to_owned(),
            created_at,
            updated_at: None,
            updated_by: None,
        };
        ticket.append_message(SUPERVISOR_NAME, created_at, subject);
        state.tickets.repo.insert(ticket).await?;
    }

    tracing::info!(
        users = ACCOUNTS.len(),
        tickets = TICKETS.len(),
        "in-memory store seeded with demo data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed() {
        let state = crate::router::test_state().await;

        let admin = state.users.repo.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Supervisor);
        assert_eq!(state.users.repo.list_active().await.unwrap().len(), 4);

        let tickets = state.tickets.repo.list().await.unwrap();
        assert_eq!(tickets.len(), 3);
        assert!(tickets.iter().all(|t| t.status == Status::Resolved));
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::default();
        let first = UserRepository::insert(&store, User::default()).await.unwrap();
        let second = UserRepository::insert(&store, User::default()).await.unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        // Both share the empty username.
        assert!(store.username_exists("", Some(1)).await.unwrap());
        assert!(!store.username_exists("other", None).await.unwrap());
    }
}
