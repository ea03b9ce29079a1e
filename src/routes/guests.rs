//! The admin console: dashboard and guest management.
//!
//! Every route takes an [`AdminSession`], so visitors without one are sent to
//! the login page by the `401` catcher.

use chrono::Utc;
use rocket::{form::Form, response::Redirect, State};
use rocket_dyn_templates::{context, Template};
use serde::Serialize;
use tracing::info;

use crate::{
    config::AppConfig,
    error::AppError,
    models::{Guest, GuestDetails, NewGuest, RsvpStatus},
    notify::Dispatcher,
    rsvp,
    session::AdminSession,
    store::Stores,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A guest as the dashboard shows it.
#[derive(Debug, Serialize)]
struct GuestListing<'a> {
    #[serde(flatten)]
    guest: &'a Guest,
    status_label: &'static str,
    created: String,
    responded: Option<String>,
    invite_url: String,
    whatsapp_url: String,
}

impl<'a> GuestListing<'a> {
    fn new(guest: &'a Guest, config: &AppConfig, dispatcher: &Dispatcher) -> Self {
        let invite_url = config.invite_url(&guest.token);
        Self {
            guest,
            status_label: guest.status.label(),
            created: guest.created_at.format(DATE_FORMAT).to_string(),
            responded: guest.responded_at.map(|t| t.format(DATE_FORMAT).to_string()),
            whatsapp_url: dispatcher.guest_invitation_url(guest, &invite_url),
            invite_url,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusOption {
    value: RsvpStatus,
    label: &'static str,
}

impl From<RsvpStatus> for StatusOption {
    fn from(value: RsvpStatus) -> Self {
        Self {
            value,
            label: value.label(),
        }
    }
}

#[derive(FromForm)]
pub struct GuestForm {
    child_name: Option<String>,
    parent_name: Option<String>,
    contact_email: Option<String>,
    whatsapp: Option<String>,
}

fn filled(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl GuestForm {
    /// Trimmed details; child name, parent name and WhatsApp are required.
    fn details(self) -> Result<GuestDetails, AppError> {
        let missing = || AppError::Validation(String::from("Missing required fields."));
        Ok(GuestDetails {
            child_name: filled(self.child_name).ok_or_else(missing)?,
            parent_name: filled(self.parent_name).ok_or_else(missing)?,
            contact_email: filled(self.contact_email),
            whatsapp: filled(self.whatsapp).ok_or_else(missing)?,
        })
    }
}

#[derive(FromForm)]
pub struct StatusForm {
    status: Option<String>,
}

#[get("/admin/dashboard")]
pub async fn dashboard(
    session: AdminSession,
    stores: &State<Stores>,
    config: &State<AppConfig>,
    dispatcher: &State<Dispatcher>,
) -> Result<Template, AppError> {
    let guests = stores.guests.list().await?;
    let stats = stores.guests.stats().await?;
    let rows: Vec<GuestListing<'_>> = guests
        .iter()
        .map(|guest| GuestListing::new(guest, config, dispatcher))
        .collect();

    Ok(Template::render(
        "admin_dashboard",
        context! {
            guests: rows,
            stats: stats,
            statuses: RsvpStatus::ALL.map(StatusOption::from),
            admin_email: &session.admin.email,
            event_name: &dispatcher.config().event_name,
        },
    ))
}

#[post("/admin/guests", data = "<form>")]
pub async fn create(
    session: AdminSession,
    form: Form<GuestForm>,
    stores: &State<Stores>,
) -> Result<Redirect, AppError> {
    let details = form.into_inner().details()?;
    let guest = stores.guests.insert(NewGuest::issue(details, Utc::now())).await?;
    info!(guest = guest.id, admin = %session.admin.email, "Guest created");
    Ok(Redirect::to(uri!("/admin/dashboard")))
}

#[get("/admin/guests/<id>/edit")]
pub async fn edit_form(
    session: AdminSession,
    id: i32,
    stores: &State<Stores>,
) -> Result<Template, AppError> {
    let guest = stores
        .guests
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Guest not found."))?;

    Ok(Template::render(
        "admin_edit_guest",
        context! {
            guest: &guest,
            admin_email: &session.admin.email,
        },
    ))
}

#[post("/admin/guests/<id>/edit", data = "<form>")]
pub async fn edit(
    session: AdminSession,
    id: i32,
    form: Form<GuestForm>,
    stores: &State<Stores>,
) -> Result<Redirect, AppError> {
    let details = form.into_inner().details()?;
    stores
        .guests
        .update_details(id, details)
        .await?
        .ok_or(AppError::NotFound("Guest not found."))?;
    info!(guest = id, admin = %session.admin.email, "Guest updated");
    Ok(Redirect::to(uri!("/admin/dashboard")))
}

#[post("/admin/guests/<id>/status", data = "<form>")]
pub async fn set_status(
    _session: AdminSession,
    id: i32,
    form: Form<StatusForm>,
    stores: &State<Stores>,
) -> Result<Redirect, AppError> {
    let status: RsvpStatus = form
        .into_inner()
        .status
        .unwrap_or_default()
        .parse()
        .map_err(|_| AppError::Validation(String::from("Invalid status.")))?;
    rsvp::override_status(stores.guests.as_ref(), id, status).await?;
    Ok(Redirect::to(uri!("/admin/dashboard")))
}

#[post("/admin/guests/<id>/delete")]
pub async fn delete(
    session: AdminSession,
    id: i32,
    stores: &State<Stores>,
) -> Result<Redirect, AppError> {
    if stores.guests.delete(id).await? {
        info!(guest = id, admin = %session.admin.email, "Guest deleted");
    }
    Ok(Redirect::to(uri!("/admin/dashboard")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(child: &str, parent: &str, email: &str, whatsapp: &str) -> GuestForm {
        GuestForm {
            child_name: Some(child.into()),
            parent_name: Some(parent.into()),
            contact_email: Some(email.into()),
            whatsapp: Some(whatsapp.into()),
        }
    }

    #[test]
    fn details_are_trimmed() {
        let details = form(" Léa ", "Nadia", "  ", " +21612345678").details().unwrap();
        assert_eq!(details.child_name, "Léa");
        assert_eq!(details.contact_email, None);
        assert_eq!(details.whatsapp, "+21612345678");
    }

    #[test]
    fn required_fields() {
        assert!(form("", "Nadia", "", "+216").details().is_err());
        assert!(form("Léa", " ", "", "+216").details().is_err());
        assert!(form("Léa", "Nadia", "nadia@example.com", "").details().is_err());
    }
}
