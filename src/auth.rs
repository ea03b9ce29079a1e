use rocket::tokio::task::spawn_blocking;
use tracing::{info, warn};

use crate::{error::AppError, models::Admin, store::AdminRepository};

pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Hashing(e.to_string()))?
        .map_err(|e| AppError::Hashing(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let verified = spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Hashing(e.to_string()))?;
    Ok(verified.unwrap_or_else(|e| {
        warn!("Stored password hash is unusable: {e}");
        false
    }))
}

/// Makes sure the configured admin exists with the configured password.
///
/// An existing account gets its hash replaced, so changing `ADMIN_PASSWORD`
/// and restarting is how the password is rotated.
pub async fn seed_admin(
    admins: &dyn AdminRepository,
    email: &str,
    password: &str,
    cost: u32,
) -> Result<(), AppError> {
    let hash = hash_password(password.to_string(), cost).await?;
    match admins.find_by_email(email).await? {
        Some(_) => {
            admins.update_password(email, &hash).await?;
            info!("Default admin password refreshed for {email}");
        }
        None => {
            admins.create(email, &hash).await?;
            info!("Default admin created ({email})");
        }
    }
    Ok(())
}

/// `None` for an unknown email or a wrong password, without saying which.
pub async fn authenticate(
    admins: &dyn AdminRepository,
    email: &str,
    password: &str,
) -> Result<Option<Admin>, AppError> {
    let Some(admin) = admins.find_by_email(email.trim()).await? else {
        return Ok(None);
    };
    let verified = verify_password(password.to_string(), admin.password_hash.clone()).await?;
    Ok(verified.then_some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    const COST: u32 = 4;

    #[rocket::async_test]
    async fn seeded_admin_can_log_in() {
        let store = MemoryStore::default();
        seed_admin(&store, "admin@sofia.local", "changeme", COST).await.unwrap();

        let admin = authenticate(&store, "admin@sofia.local", "changeme").await.unwrap();
        assert_eq!(admin.map(|a| a.email), Some("admin@sofia.local".to_string()));
    }

    #[rocket::async_test]
    async fn wrong_password_or_email_is_rejected() {
        let store = MemoryStore::default();
        seed_admin(&store, "admin@sofia.local", "changeme", COST).await.unwrap();

        assert!(authenticate(&store, "admin@sofia.local", "nope").await.unwrap().is_none());
        assert!(authenticate(&store, "who@sofia.local", "changeme").await.unwrap().is_none());
    }

    #[rocket::async_test]
    async fn reseeding_rotates_password() {
        let store = MemoryStore::default();
        seed_admin(&store, "admin@sofia.local", "first", COST).await.unwrap();
        seed_admin(&store, "admin@sofia.local", "second", COST).await.unwrap();

        assert!(authenticate(&store, "admin@sofia.local", "first").await.unwrap().is_none());
        assert!(authenticate(&store, "admin@sofia.local", "second").await.unwrap().is_some());
    }

    #[rocket::async_test]
    async fn corrupt_hash_fails_closed() {
        let store = MemoryStore::default();
        store.create("admin@sofia.local", "not-a-bcrypt-hash").await.unwrap();
        assert!(authenticate(&store, "admin@sofia.local", "x").await.unwrap().is_none());
    }
}
