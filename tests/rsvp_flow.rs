mod common;

use party_rsvp::models::RsvpStatus;
use rocket::http::{ContentType, Status};
use serde_json::Value;

use common::harness;

#[rocket::async_test]
async fn guest_confirms_through_invite_token() {
    let h = harness().await;
    h.login_as_admin().await;
    let guest = h.create_lea().await;
    assert_eq!(guest.status, RsvpStatus::Pending);

    let response = h.rsvp(&guest.token, "oui").await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "oui");

    let stored = h.guest(guest.id).await.unwrap();
    assert_eq!(stored.status, RsvpStatus::Confirmed);
    assert!(stored.responded_at.is_some());

    let sent = h.outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "organizer@example.com");
    assert!(sent[0].body.contains("Guest: Léa"));
    assert!(sent[0].body.contains("Status: CONFIRMED"));
    assert!(sent[0].body.contains(&guest.token));
}

#[rocket::async_test]
async fn unknown_token_is_not_found_and_changes_nothing() {
    let h = harness().await;
    h.login_as_admin().await;
    let guest = h.create_lea().await;

    let response = h.rsvp("bad", "oui").await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["success"], false);

    assert_eq!(h.guest(guest.id).await.unwrap(), guest);
    assert!(h.outbox.sent().is_empty());
}

#[rocket::async_test]
async fn last_answer_wins_and_pending_clears_response_time() {
    let h = harness().await;
    h.login_as_admin().await;
    let guest = h.create_lea().await;

    assert_eq!(h.rsvp(&guest.token, "confirmed").await.status(), Status::Ok);
    assert_eq!(h.rsvp(&guest.token, "declined").await.status(), Status::Ok);
    let stored = h.guest(guest.id).await.unwrap();
    assert_eq!(stored.status, RsvpStatus::Declined);
    assert!(stored.responded_at.is_some());

    assert_eq!(h.rsvp(&guest.token, "pending").await.status(), Status::Ok);
    let stored = h.guest(guest.id).await.unwrap();
    assert_eq!(stored.status, RsvpStatus::Pending);
    assert_eq!(stored.responded_at, None);

    // confirm and decline each notify once, pending does not
    let subjects: Vec<String> = h.outbox.sent().into_iter().map(|e| e.subject).collect();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].starts_with("New CONFIRMATION"));
    assert!(subjects[1].starts_with("New DECLINE"));
}

#[rocket::async_test]
async fn malformed_requests_are_rejected() {
    let h = harness().await;
    h.login_as_admin().await;
    let guest = h.create_lea().await;

    let response = h.rsvp(&guest.token, "maybe").await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid data.");

    assert_eq!(h.rsvp("", "oui").await.status(), Status::BadRequest);

    let response = h
        .client
        .post("/api/rsvp")
        .header(ContentType::JSON)
        .body("{not json")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    assert_eq!(h.guest(guest.id).await.unwrap().status, RsvpStatus::Pending);
}

#[rocket::async_test]
async fn invite_page_renders_for_known_tokens_only() {
    let h = harness().await;
    h.login_as_admin().await;
    let guest = h.create_lea().await;

    let response = h.client.get(format!("/invite/{}", guest.token)).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let html = response.into_string().await.unwrap();
    assert!(html.contains("Léa"));
    assert!(html.contains(&format!("window.INVITE_TOKEN = \"{}\"", guest.token)));
    assert!(html.contains("window.INITIAL_STATUS = \"pending\""));

    let response = h.client.get("/invite/unknown-token").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn widget_script_is_served() {
    let h = harness().await;
    let response = h.client.get("/static/js/invite.js").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert!(response.into_string().await.unwrap().contains("/api/rsvp"));
}

#[rocket::async_test]
async fn every_guest_gets_a_distinct_token() {
    let h = harness().await;
    h.login_as_admin().await;
    let first = h.create_lea().await;
    let second = h.create_lea().await;

    assert_ne!(first.id, second.id);
    assert_ne!(first.token, second.token);
}
