use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocket::async_trait;

use super::{AdminRepository, GuestRepository, StoreError, StoreResult};
use crate::models::{Admin, Guest, GuestDetails, GuestStats, NewGuest, RsvpStatus};

#[derive(Default)]
struct Tables {
    guests: BTreeMap<i32, Guest>,
    admins: Vec<Admin>,
    next_guest_id: i32,
    next_admin_id: i32,
}

/// Map-backed store with the same uniqueness rules as the SQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn update_status<F>(
        &self,
        matches: F,
        status: RsvpStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> Option<Guest>
    where
        F: Fn(&Guest) -> bool,
    {
        let mut tables = self.tables.lock();
        let guest = tables.guests.values_mut().find(|g| matches(&**g))?;
        guest.status = status;
        guest.responded_at = responded_at;
        Some(guest.clone())
    }
}

#[async_trait]
impl GuestRepository for MemoryStore {
    async fn insert(&self, guest: NewGuest) -> StoreResult<Guest> {
        let mut tables = self.tables.lock();
        if tables.guests.values().any(|g| g.token == guest.token) {
            return Err(StoreError::Conflict("guests.token"));
        }
        tables.next_guest_id += 1;
        let id = tables.next_guest_id;
        let guest = Guest {
            id,
            child_name: guest.child_name,
            parent_name: guest.parent_name,
            contact_email: guest.contact_email,
            whatsapp: guest.whatsapp,
            token: guest.token,
            status: RsvpStatus::Pending,
            created_at: guest.created_at,
            responded_at: None,
        };
        tables.guests.insert(id, guest.clone());
        Ok(guest)
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<Guest>> {
        let tables = self.tables.lock();
        Ok(tables.guests.values().find(|g| g.token == token).cloned())
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Guest>> {
        Ok(self.tables.lock().guests.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Guest>> {
        let mut guests: Vec<Guest> = self.tables.lock().guests.values().cloned().collect();
        guests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(guests)
    }

    async fn stats(&self) -> StoreResult<GuestStats> {
        let tables = self.tables.lock();
        let mut stats = GuestStats::default();
        for guest in tables.guests.values() {
            stats.record(guest.status, 1);
        }
        Ok(stats)
    }

    async fn update_details(&self, id: i32, details: GuestDetails) -> StoreResult<Option<Guest>> {
        let mut tables = self.tables.lock();
        let Some(guest) = tables.guests.get_mut(&id) else {
            return Ok(None);
        };
        guest.child_name = details.child_name;
        guest.parent_name = details.parent_name;
        guest.contact_email = details.contact_email;
        guest.whatsapp = details.whatsapp;
        Ok(Some(guest.clone()))
    }

    async fn set_status_by_token(
        &self,
        token: &str,
        status: RsvpStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Guest>> {
        Ok(self.update_status(|g| g.token == token, status, responded_at))
    }

    async fn set_status_by_id(
        &self,
        id: i32,
        status: RsvpStatus,
        responded_at: Option<DateTime<Utc>>,
    ) -> StoreResult<Option<Guest>> {
        Ok(self.update_status(|g| g.id == id, status, responded_at))
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables.lock().guests.remove(&id).is_some())
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        let tables = self.tables.lock();
        Ok(tables.admins.iter().find(|a| a.email == email).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> StoreResult<Admin> {
        let mut tables = self.tables.lock();
        if tables.admins.iter().any(|a| a.email == email) {
            return Err(StoreError::Conflict("admin_users.email"));
        }
        tables.next_admin_id += 1;
        let admin = Admin {
            id: tables.next_admin_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.admins.push(admin.clone());
        Ok(admin)
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        if let Some(admin) = tables.admins.iter_mut().find(|a| a.email == email) {
            admin.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_guest(token: &str) -> NewGuest {
        NewGuest {
            child_name: "Léa".into(),
            parent_name: "Nadia".into(),
            contact_email: None,
            whatsapp: "+21612345678".into(),
            token: token.into(),
            created_at: Utc::now(),
        }
    }

    #[rocket::async_test]
    async fn duplicate_token_is_rejected() {
        let store = MemoryStore::default();
        store.insert(new_guest("t-1")).await.unwrap();
        let err = store.insert(new_guest("t-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict("guests.token")));
    }

    #[rocket::async_test]
    async fn unknown_token_changes_nothing() {
        let store = MemoryStore::default();
        let guest = store.insert(new_guest("t-1")).await.unwrap();

        let updated = store
            .set_status_by_token("nope", RsvpStatus::Confirmed, Some(Utc::now()))
            .await
            .unwrap();
        assert!(updated.is_none());

        let unchanged = store.find_by_id(guest.id).await.unwrap().unwrap();
        assert_eq!(unchanged, guest);
    }

    #[rocket::async_test]
    async fn list_is_newest_first() {
        let store = MemoryStore::default();
        let mut older = new_guest("old");
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        store.insert(older).await.unwrap();
        store.insert(new_guest("new")).await.unwrap();

        let tokens: Vec<_> = store.list().await.unwrap().into_iter().map(|g| g.token).collect();
        assert_eq!(tokens, ["new", "old"]);
    }

    #[rocket::async_test]
    async fn admin_password_refresh() {
        let store = MemoryStore::default();
        store.create("admin@sofia.local", "old").await.unwrap();
        store.update_password("admin@sofia.local", "new").await.unwrap();
        let admin = store.find_by_email("admin@sofia.local").await.unwrap().unwrap();
        assert_eq!(admin.password_hash, "new");
        assert!(store.create("admin@sofia.local", "x").await.is_err());
    }
}
