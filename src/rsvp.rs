use chrono::Utc;
use tracing::info;

use crate::{
    error::AppError,
    models::{Guest, RsvpStatus},
    notify::{Dispatcher, RsvpNotice},
    store::GuestRepository,
};

/// A guest answering through their invite link.
///
/// The status and response time change in one row update; an unknown token
/// changes nothing. Confirming or declining then notifies the organizer, and
/// nothing the notifier does can fail the reply.
pub async fn respond(
    guests: &dyn GuestRepository,
    dispatcher: &Dispatcher,
    token: &str,
    status: RsvpStatus,
) -> Result<Guest, AppError> {
    let now = Utc::now();
    let guest = guests
        .set_status_by_token(token, status, status.responded_at(now))
        .await?
        .ok_or(AppError::NotFound("Invitation not found."))?;

    info!(guest = guest.id, status = %guest.status, "RSVP recorded");

    if status.is_answer() {
        dispatcher
            .rsvp_answered(&RsvpNotice::for_guest(&guest, now))
            .await;
    }

    Ok(guest)
}

/// An admin forcing a status from the dashboard. Nobody is notified.
pub async fn override_status(
    guests: &dyn GuestRepository,
    id: i32,
    status: RsvpStatus,
) -> Result<Guest, AppError> {
    let guest = guests
        .set_status_by_id(id, status, status.responded_at(Utc::now()))
        .await?
        .ok_or(AppError::NotFound("Guest not found."))?;

    info!(guest = guest.id, status = %guest.status, "Status set by admin");
    Ok(guest)
}
