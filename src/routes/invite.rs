//! The public side: the invitation page and the RSVP endpoint behind its buttons.

use rocket::{
    serde::json::{Error as JsonError, Json},
    State,
};
use rocket_dyn_templates::{context, Template};
use serde::Deserialize;

use crate::{
    config::AppConfig,
    error::{ApiError, ApiReply, AppError},
    models::RsvpStatus,
    notify::Dispatcher,
    rsvp,
    store::Stores,
};

#[get("/invite/<token>")]
pub async fn invite(
    token: &str,
    stores: &State<Stores>,
    config: &State<AppConfig>,
    dispatcher: &State<Dispatcher>,
) -> Result<Template, AppError> {
    let guest = stores
        .guests
        .find_by_token(token)
        .await?
        .ok_or(AppError::NotFound("Invitation not found."))?;

    Ok(Template::render(
        "invite",
        context! {
            child_name: &guest.child_name,
            token: &guest.token,
            status: guest.status,
            event_name: &dispatcher.config().event_name,
            event_date: config.event_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            invite_url: config.invite_url(&guest.token),
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    token: Option<String>,
    response: Option<String>,
}

impl RsvpRequest {
    fn validate(self) -> Result<(String, RsvpStatus), AppError> {
        let invalid = || AppError::Validation(String::from("Invalid data."));
        let token = self
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(invalid)?;
        let status = self
            .response
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| invalid())?;
        Ok((token, status))
    }
}

#[post("/api/rsvp", data = "<body>")]
pub async fn submit(
    body: Result<Json<RsvpRequest>, JsonError<'_>>,
    stores: &State<Stores>,
    dispatcher: &State<Dispatcher>,
) -> Result<Json<ApiReply>, ApiError> {
    let body = body.map_err(|_| AppError::Validation(String::from("Invalid data.")))?;
    let (token, status) = body.into_inner().validate()?;

    let guest = rsvp::respond(stores.guests.as_ref(), dispatcher, &token, status).await?;

    Ok(Json(ApiReply {
        success: true,
        status: Some(guest.status.to_string()),
        message: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(token: Option<&str>, response: Option<&str>) -> RsvpRequest {
        RsvpRequest {
            token: token.map(String::from),
            response: response.map(String::from),
        }
    }

    #[test]
    fn accepts_known_responses() {
        let (token, status) = request(Some(" abc "), Some("oui")).validate().unwrap();
        assert_eq!(token, "abc");
        assert_eq!(status, RsvpStatus::Confirmed);

        let (_, status) = request(Some("abc"), Some("declined")).validate().unwrap();
        assert_eq!(status, RsvpStatus::Declined);
    }

    #[test]
    fn rejects_missing_or_unknown_fields() {
        assert!(request(None, Some("oui")).validate().is_err());
        assert!(request(Some("  "), Some("oui")).validate().is_err());
        assert!(request(Some("abc"), None).validate().is_err());
        assert!(request(Some("abc"), Some("maybe")).validate().is_err());
    }
}
