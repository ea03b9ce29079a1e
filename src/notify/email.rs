use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use rocket::async_trait;
use thiserror::Error;
use tracing::info;

use super::{whatsapp::or_na, RsvpNotice, SmtpConfig};
use crate::models::RsvpStatus;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("bad address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn rsvp_notice(from: &str, to: &str, event_name: &str, notice: &RsvpNotice) -> Self {
        let subject = match notice.status {
            RsvpStatus::Declined => format!("New DECLINE – {event_name}"),
            _ => format!("New CONFIRMATION – {event_name}"),
        };
        let body = [
            format!("Guest: {}", or_na(&notice.guest_name)),
            format!("Phone: {}", or_na(&notice.guest_phone)),
            format!("Status: {}", notice.status.label()),
            format!("Responded at: {}", notice.responded_at.to_rfc3339()),
            format!("Token: {}", notice.token),
        ]
        .join("\n");

        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject,
            body,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Implicit TLS on port 465, STARTTLS on anything else.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(email.from.parse::<Mailbox>()?)
            .to(email.to.parse::<Mailbox>()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;
        self.transport.send(message).await?;
        info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Stand-in when SMTP is not configured: the email goes to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "SMTP not configured, email not sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn notice(status: RsvpStatus) -> RsvpNotice {
        RsvpNotice {
            guest_name: "Léa".into(),
            guest_phone: "+21612345678".into(),
            status,
            responded_at: Utc.with_ymd_and_hms(2025, 11, 20, 18, 30, 0).unwrap(),
            token: "3f1c".into(),
        }
    }

    #[test]
    fn confirmation_email() {
        let email = OutgoingEmail::rsvp_notice(
            "no-reply@example.com",
            "organizer@example.com",
            "Sofia's birthday",
            &notice(RsvpStatus::Confirmed),
        );
        assert_eq!(email.subject, "New CONFIRMATION – Sofia's birthday");
        assert_eq!(
            email.body,
            "Guest: Léa\nPhone: +21612345678\nStatus: CONFIRMED\n\
             Responded at: 2025-11-20T18:30:00+00:00\nToken: 3f1c"
        );
    }

    #[test]
    fn decline_subject() {
        let email = OutgoingEmail::rsvp_notice("a@x.io", "b@x.io", "Party", &notice(RsvpStatus::Declined));
        assert_eq!(email.subject, "New DECLINE – Party");
        assert!(email.body.contains("Status: DECLINED"));
    }

    #[rocket::async_test]
    async fn log_mailer_never_fails() {
        let email = OutgoingEmail::rsvp_notice("a@x.io", "b@x.io", "Party", &notice(RsvpStatus::Confirmed));
        assert!(LogMailer.send(&email).await.is_ok());
    }
}
