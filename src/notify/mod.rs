//! Telling the organizer about RSVPs.
//!
//! Two channels fire on every confirm or decline, never on a move back to
//! pending:
//!
//! - email to the organizer, through SMTP when configured and to the log
//!   otherwise;
//! - a `wa.me` link carrying the same news, logged for someone to open by hand.
//!
//! Delivery problems are logged and never reach the guest.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::models::{Guest, RsvpStatus};

pub mod email;
pub mod whatsapp;

pub use email::{LogMailer, MailError, Mailer, OutgoingEmail, SmtpMailer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub organizer_email: String,
    pub organizer_whatsapp: String,
    pub event_name: String,
    pub from_email: String,
    pub smtp: Option<SmtpConfig>,
}

/// What the organizer is told about a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpNotice {
    pub guest_name: String,
    pub guest_phone: String,
    pub status: RsvpStatus,
    pub responded_at: DateTime<Utc>,
    pub token: String,
}

impl RsvpNotice {
    pub fn for_guest(guest: &Guest, responded_at: DateTime<Utc>) -> Self {
        Self {
            guest_name: guest.child_name.clone(),
            guest_phone: guest.whatsapp.clone(),
            status: guest.status,
            responded_at: guest.responded_at.unwrap_or(responded_at),
            token: guest.token.clone(),
        }
    }
}

/// Outcome of one dispatch, mostly for the log and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub emailed: bool,
    pub whatsapp_url: String,
}

pub struct Dispatcher {
    config: NotifyConfig,
    mailer: Box<dyn Mailer>,
}

impl Dispatcher {
    pub fn new(config: NotifyConfig, mailer: Box<dyn Mailer>) -> Self {
        Self { config, mailer }
    }

    /// SMTP when configured, [`LogMailer`] otherwise.
    pub fn from_config(config: NotifyConfig) -> Result<Self, MailError> {
        let mailer: Box<dyn Mailer> = match &config.smtp {
            Some(smtp) => Box::new(SmtpMailer::new(smtp)?),
            None => Box::new(LogMailer),
        };
        Ok(Self::new(config, mailer))
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Sends both notifications. Returns `None` for pending, which notifies nobody.
    pub async fn rsvp_answered(&self, notice: &RsvpNotice) -> Option<Delivery> {
        if !notice.status.is_answer() {
            return None;
        }

        let email = OutgoingEmail::rsvp_notice(
            &self.config.from_email,
            &self.config.organizer_email,
            &self.config.event_name,
            notice,
        );
        let emailed = match self.mailer.send(&email).await {
            Ok(()) => true,
            Err(e) => {
                error!(token = %notice.token, "Error sending RSVP email: {e}");
                false
            }
        };

        let whatsapp_url = self.organizer_whatsapp_url(notice);
        info!(token = %notice.token, "Organizer WhatsApp link (open manually): {whatsapp_url}");

        Some(Delivery {
            emailed,
            whatsapp_url,
        })
    }

    pub fn organizer_whatsapp_url(&self, notice: &RsvpNotice) -> String {
        let message = whatsapp::organizer_message(notice, &self.config.event_name);
        whatsapp::wa_link(&self.config.organizer_whatsapp, &message)
    }

    /// Link that opens a chat with the guest, prefilled with their invite.
    pub fn guest_invitation_url(&self, guest: &Guest, invite_url: &str) -> String {
        let message =
            whatsapp::invitation_message(&guest.child_name, &self.config.event_name, invite_url);
        whatsapp::wa_link(&guest.whatsapp, &message)
    }
}
