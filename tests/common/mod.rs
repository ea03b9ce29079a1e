#![allow(dead_code)]

use std::sync::Arc;

use party_rsvp::{
    config::AppConfig,
    models::Guest,
    notify::{Dispatcher, MailError, Mailer, OutgoingEmail},
    store::Stores,
};
use parking_lot::Mutex;
use rocket::{
    async_trait,
    http::{ContentType, Status},
    local::asynchronous::{Client, LocalResponse},
};

pub const ADMIN_EMAIL: &str = "admin@sofia.local";
pub const ADMIN_PASSWORD: &str = "s3cret-party";

/// Collects every email instead of sending it.
#[derive(Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<OutgoingEmail>>>);

impl Outbox {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.0.lock().clone()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.0.lock().push(email.clone());
        Ok(())
    }
}

pub struct Harness {
    pub client: Client,
    pub stores: Stores,
    pub outbox: Outbox,
}

pub async fn harness() -> Harness {
    let config = AppConfig::from_lookup(|key| match key {
        "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "ORGANIZER_EMAIL" => Some("organizer@example.com".to_string()),
        "INVITE_BASE_URL" => Some("https://party.example".to_string()),
        _ => None,
    })
    .expect("test config");

    let stores = Stores::in_memory(config.session_ttl);
    let outbox = Outbox::default();
    let dispatcher = Dispatcher::new(config.notify.clone(), Box::new(outbox.clone()));
    let rocket = party_rsvp::build(config, stores.clone(), dispatcher);
    let client = Client::tracked(rocket).await.expect("valid rocket instance");

    Harness {
        client,
        stores,
        outbox,
    }
}

impl Harness {
    pub async fn login(&self, email: &str, password: &str) -> LocalResponse<'_> {
        self.client
            .post("/admin/login")
            .header(ContentType::Form)
            .body(format!("email={email}&password={password}"))
            .dispatch()
            .await
    }

    pub async fn login_as_admin(&self) {
        let response = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/admin/dashboard"));
    }

    /// Posts the create-guest form; values must already be form-encoded.
    pub async fn post_guest(&self, body: &str) -> LocalResponse<'_> {
        self.client
            .post("/admin/guests")
            .header(ContentType::Form)
            .body(body.to_string())
            .dispatch()
            .await
    }

    /// Creates Léa, child of Nadia, and returns the stored record.
    pub async fn create_lea(&self) -> Guest {
        let before: Vec<i32> = self.guests().await.iter().map(|g| g.id).collect();
        let response = self
            .post_guest("child_name=L%C3%A9a&parent_name=Nadia&whatsapp=%2B21612345678")
            .await;
        assert_eq!(response.status(), Status::SeeOther);

        self.guests()
            .await
            .into_iter()
            .find(|g| !before.contains(&g.id))
            .expect("guest was created")
    }

    pub async fn guests(&self) -> Vec<Guest> {
        self.stores.guests.list().await.expect("list guests")
    }

    pub async fn guest(&self, id: i32) -> Option<Guest> {
        self.stores.guests.find_by_id(id).await.expect("find guest")
    }

    pub async fn rsvp(&self, token: &str, response: &str) -> LocalResponse<'_> {
        self.client
            .post("/api/rsvp")
            .header(ContentType::JSON)
            .body(serde_json::json!({ "token": token, "response": response }).to_string())
            .dispatch()
            .await
    }
}
