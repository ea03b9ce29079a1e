use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::async_trait;
use rocket_db_pools::diesel::{prelude::*, PgPool};
use rocket_db_pools::{Database, Pool};
use tracing::info;

use super::{AdminRepository, GuestRepository, StoreError, StoreResult};
use crate::models::{Admin, Guest, GuestDetails, GuestStats, NewGuest, RsvpStatus};
use crate::schema::{admin_users, guests};

#[derive(Database)]
#[database("guests")]
pub struct Db(PgPool);

impl Db {
    pub fn pool(&self) -> PgPool {
        self.0.clone()
    }
}

/// Statements run at ignition. Safe to repeat.
pub const SCHEMA: [&str; 2] = [
    r#"CREATE TABLE IF NOT EXISTS guests (
        id SERIAL PRIMARY KEY,
        child_name TEXT NOT NULL,
        parent_name TEXT NOT NULL,
        contact_email TEXT,
        whatsapp TEXT NOT NULL,
        token TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'oui', 'non')),
        created_at TIMESTAMPTZ NOT NULL,
        responded_at TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS admin_users (
        id SERIAL PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    )"#,
];

#[derive(Queryable, Selectable)]
#[diesel(table_name = guests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct GuestRow {
    id: i32,
    child_name: String,
    parent_name: String,
    contact_email: Option<String>,
    whatsapp: String,
    token: String,
    status: String,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<GuestRow> for Guest {
    type Error = StoreError;

    fn try_from(row: GuestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("guest {}: {e}", row.id)))?;
        Ok(Guest {
            id: row.id,
            child_name: row.child_name,
            parent_name: row.parent_name,
            contact_email: row.contact_email,
            whatsapp: row.whatsapp,
            token: row.token,
            status,
            created_at: row.created_at,
            responded_at: row.responded_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = guests)]
struct NewGuestRow<'a> {
    child_name: &'a str,
    parent_name: &'a str,
    contact_email: Option<&'a str>,
    whatsapp: &'a str,
    token: &'a str,
    status: &'a str,
    created_at: DateTime<Utc>,
}

#[derive(AsChangeset)]
#[diesel(table_name = guests)]
#[diesel(treat_none_as_null = true)]
struct DetailsChangeset<'a> {
    child_name: &'a str,
    parent_name: &'a str,
    contact_email: Option<&'a str>,
    whatsapp: &'a str,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = admin_users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct AdminRow {
    id: i32,
    email: String,
    password_hash: String,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Admin {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

fn query_error(err: DieselError, column: &'static str) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Conflict(column)
        }
        other => StoreError::Query(other),
    }
}

fn convert(row: Option<GuestRow>) -> StoreResult<Option<Guest>> {
    row.map(Guest::try_from).transpose()
}

/// Postgres through diesel-async, sharing the pool Rocket manages for [`Db`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> StoreResult<<PgPool as Pool>::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }

    pub async fn create_schema(&self) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        for statement in SCHEMA {
            diesel::sql_query(statement).execute(&mut conn).await?;
        }
        info!("Schema ready");
        Ok(())
    }
}

#[async_trait]
impl GuestRepository for PgStore {
    async fn insert(&self, guest: NewGuest) -> StoreResult<Guest> {
        let mut conn = self.conn().await?;
        let row = NewGuestRow {
            child_name: &guest.child_name,
            parent_name: &guest.parent_name,
            contact_email: guest.contact_email.as_deref(),
            whatsapp: &guest.whatsapp,
            token: &guest.token,
            status: RsvpStatus::Pending.as_str(),
            created_at: guest.created_at,
        };
        let inserted: GuestRow = diesel::insert_into(guests::table)
            .values(&row)
            .returning(GuestRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| query_error(e, "guests.token"))?;
        inserted.try_into()
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<Guest>> {
        let mut conn = self.conn().await?;
        let row = guests::table
            .filter(guests::token.eq(token))
            .select(GuestRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        convert(row)
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Guest>> {
        let mut conn = self.conn().await?;
        let row = guests::table
            .find(id)
            .select(GuestRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        convert(row)
    }

    async fn list(&self) -> StoreResult<Vec<Guest>> {
        let mut conn = self.conn().await?;
        let rows: Vec<GuestRow> = guests::table
            .order((guests::created_at.desc(), guests::id.desc()))
            .select(GuestRow::as_select())
            .load(&mut conn)
            .await?;
        rows.into_iter().map(Guest::try_from).collect()
    }

    async fn stats(&self) -> StoreResult<GuestStats> {
        let mut conn = self.conn().await?;
        let counts: Vec<(String, i64)> = guests::table
            .group_by(guests::status)
            .select((guests::status, diesel::dsl::count_star()))
            .load(&mut conn)
            .await?;

        let mut stats = GuestStats::default();
        for (status, count) in counts {
            let status: RsvpStatus = status
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("{e}")))?;
            stats.record(status, count);
        }
        Ok(stats)
    }

    async fn update_details(&self, id: i32, details: GuestDetails) -> StoreResult<Option<Guest>> {
        let mut conn = self.conn().await?;
        let changes = DetailsChangeset {
            child_name: &details.child_name,
            parent_name: &details.parent_name,
            contact_email: details.contact_email.as_deref(),
            whatsapp: &details.whatsapp,
        };
        let row = diesel::update(guests::table.find(id))
            .set(&changes)
            .returning(GuestRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        convert(row)
    }

    async fn set_status_by_token(
        &self,
        token: &str,
        status: RsvpStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Guest>> {
        let mut conn = self.conn().await?;
        let row = diesel::update(guests::table.filter(guests::token.eq(token)))
            .set((
                guests::status.eq(status.as_str()),
                guests::responded_at.eq(responded_at),
            ))
            .returning(GuestRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        convert(row)
    }

    async fn set_status_by_id(
        &self,
        id: i32,
        status: RsvpStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Guest>> {
        let mut conn = self.conn().await?;
        let row = diesel::update(guests::table.find(id))
            .set((
                guests::status.eq(status.as_str()),
                guests::responded_at.eq(responded_at),
            ))
            .returning(GuestRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        convert(row)
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let removed = diesel::delete(guests::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(removed > 0)
    }
}

#[async_trait]
impl AdminRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        let mut conn = self.conn().await?;
        let row = admin_users::table
            .filter(admin_users::email.eq(email))
            .select(AdminRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(Admin::from))
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Admin> {
        let mut conn = self.conn().await?;
        let row: AdminRow = diesel::insert_into(admin_users::table)
            .values((
                admin_users::email.eq(email),
                admin_users::password_hash.eq(password_hash),
            ))
            .returning(AdminRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| query_error(e, "admin_users.email"))?;
        Ok(row.into())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> StoreResult<()> {
        let mut conn = self.conn().await?;
        diesel::update(admin_users::table.filter(admin_users::email.eq(email)))
            .set(admin_users::password_hash.eq(password_hash))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
