//! Server-side admin sessions.
//!
//! The browser only holds a random session id in the private `admin_session`
//! cookie. The id maps to an [`AdminIdentity`] in a [`SessionStore`] which
//! forgets it after the configured TTL.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use rand::{distributions::Alphanumeric, Rng};
use rocket::{
    async_trait,
    http::{Cookie, CookieJar, SameSite, Status},
    request::{FromRequest, Outcome, Request},
};
use rocket_db_pools::deadpool_redis::{
    self,
    redis::{self, AsyncCommands},
};
use rocket_db_pools::Database;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::store::Stores;

pub const SESSION_COOKIE: &str = "admin_session";

const SESSION_ID_LEN: usize = 32;

#[derive(Database)]
#[database("sessions")]
pub struct Redis(deadpool_redis::Pool);

impl Redis {
    pub fn pool(&self) -> deadpool_redis::Pool {
        self.0.clone()
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("not logged in")]
    Unauthenticated,

    #[error("session pool: {0}")]
    Pool(String),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("session payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub id: i32,
    pub email: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `admin` under a fresh id and returns the id.
    async fn open(&self, admin: &AdminIdentity) -> Result<String, SessionError>;

    /// `None` for unknown and expired ids.
    async fn lookup(&self, session_id: &str) -> Result<Option<AdminIdentity>, SessionError>;

    async fn close(&self, session_id: &str) -> Result<(), SessionError>;
}

fn new_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

pub struct RedisSessions {
    pool: deadpool_redis::Pool,
    ttl: Duration,
}

impl RedisSessions {
    pub fn new(pool: deadpool_redis::Pool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, SessionError> {
        self.pool
            .get()
            .await
            .map_err(|e| SessionError::Pool(e.to_string()))
    }

    fn key(session_id: &str) -> String {
        format!("session:{session_id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessions {
    async fn open(&self, admin: &AdminIdentity) -> Result<String, SessionError> {
        let session_id = new_session_id();
        let payload = serde_json::to_string(admin)?;
        let mut conn = self.conn().await?;
        redis::cmd("SET")
            .arg(Self::key(&session_id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(session_id)
    }

    async fn lookup(&self, session_id: &str) -> Result<Option<AdminIdentity>, SessionError> {
        let mut conn = self.conn().await?;
        let payload: Option<String> = conn.get(Self::key(session_id)).await?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn close(&self, session_id: &str) -> Result<(), SessionError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(Self::key(session_id)).await?;
        Ok(())
    }
}

/// Process-local sessions with the same expiry rules as [`RedisSessions`].
pub struct MemorySessions {
    ttl: Duration,
    sessions: Mutex<HashMap<String, (AdminIdentity, Instant)>>,
}

impl MemorySessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessions {
    async fn open(&self, admin: &AdminIdentity) -> Result<String, SessionError> {
        let session_id = new_session_id();
        let expires = Instant::now() + self.ttl;
        self.sessions
            .lock()
            .insert(session_id.clone(), (admin.clone(), expires));
        Ok(session_id)
    }

    async fn lookup(&self, session_id: &str) -> Result<Option<AdminIdentity>, SessionError> {
        let mut sessions = self.sessions.lock();
        let Some((admin, expires)) = sessions.get(session_id).cloned() else {
            return Ok(None);
        };
        if expires <= Instant::now() {
            sessions.remove(session_id);
            return Ok(None);
        }
        Ok(Some(admin))
    }

    async fn close(&self, session_id: &str) -> Result<(), SessionError> {
        self.sessions.lock().remove(session_id);
        Ok(())
    }
}

pub fn session_cookie(session_id: String, ttl: Duration) -> Cookie<'static> {
    let max_age = rocket::time::Duration::seconds(ttl.as_secs().min(i64::MAX as u64) as i64);
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Request guard for the admin console.
///
/// Fails with `401 Unauthorized` when there is no live session, which the
/// `401` catcher turns into a redirect to the login page.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session_id: String,
    pub admin: AdminIdentity,
}

#[async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = SessionError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let jar: &CookieJar<'_> = req.cookies();
        let Some(session_id) = jar.get_private(SESSION_COOKIE).map(|c| c.value().to_string())
        else {
            return Outcome::Error((Status::Unauthorized, SessionError::Unauthenticated));
        };

        let Some(stores) = req.rocket().state::<Stores>() else {
            error!("Stores are not managed");
            return Outcome::Error((
                Status::InternalServerError,
                SessionError::Pool("stores unavailable".into()),
            ));
        };

        match stores.sessions.lookup(&session_id).await {
            Ok(Some(admin)) => Outcome::Success(AdminSession { session_id, admin }),
            Ok(None) => {
                jar.remove_private(SESSION_COOKIE);
                Outcome::Error((Status::Unauthorized, SessionError::Unauthenticated))
            }
            Err(e) => {
                error!("Session lookup failed: {e}");
                Outcome::Error((Status::InternalServerError, e))
            }
        }
    }
}
