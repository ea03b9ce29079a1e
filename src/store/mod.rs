//! Persistence for guests and admin credentials.
//!
//! Handlers only see the [`GuestRepository`] and [`AdminRepository`] traits.
//! [`postgres::PgStore`] is the production implementation, [`memory::MemoryStore`]
//! keeps everything in a map and backs the tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocket::async_trait;
use thiserror::Error;

use crate::{
    models::{Admin, Guest, GuestDetails, GuestStats, NewGuest, RsvpStatus},
    session::SessionStore,
};

pub mod memory;
pub mod postgres;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection pool: {0}")]
    Pool(String),

    #[error("query: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("duplicate value for {0}")]
    Conflict(&'static str),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait GuestRepository: Send + Sync {
    async fn insert(&self, guest: NewGuest) -> StoreResult<Guest>;

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<Guest>>;

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Guest>>;

    /// Newest first.
    async fn list(&self) -> StoreResult<Vec<Guest>>;

    async fn stats(&self) -> StoreResult<GuestStats>;

    /// Returns `None` when no guest has this id.
    async fn update_details(&self, id: i32, details: GuestDetails) -> StoreResult<Option<Guest>>;

    /// Sets status and response time in one row write. `None` when the token is unknown.
    async fn set_status_by_token(
        &self,
        token: &str,
        status: RsvpStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Guest>>;

    async fn set_status_by_id(
        &self,
        id: i32,
        status: RsvpStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Guest>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> StoreResult<bool>;
}

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Admin>>;

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Admin>;

    async fn update_password(&self, email: &str, password_hash: &str) -> StoreResult<()>;
}

/// Everything the handlers persist through, held in Rocket managed state.
#[derive(Clone)]
pub struct Stores {
    pub guests: Arc<dyn GuestRepository>,
    pub admins: Arc<dyn AdminRepository>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    /// In-memory guests, admins and sessions.
    pub fn in_memory(session_ttl: std::time::Duration) -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            guests: store.clone(),
            admins: store,
            sessions: Arc::new(crate::session::MemorySessions::new(session_ttl)),
        }
    }
}
