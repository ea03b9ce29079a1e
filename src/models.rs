use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a guest stands on their invitation.
///
/// Stored and sent over the wire as `pending`, `oui` and `non`. The English
/// spellings `confirmed` and `declined` are accepted as input too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RsvpStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "oui", alias = "confirmed")]
    Confirmed,
    #[serde(rename = "non", alias = "declined")]
    Declined,
}

impl RsvpStatus {
    pub const ALL: [RsvpStatus; 3] = [RsvpStatus::Pending, RsvpStatus::Confirmed, RsvpStatus::Declined];

    pub fn as_str(self) -> &'static str {
        match self {
            RsvpStatus::Pending => "pending",
            RsvpStatus::Confirmed => "oui",
            RsvpStatus::Declined => "non",
        }
    }

    /// Label used in notifications and on the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            RsvpStatus::Pending => "PENDING",
            RsvpStatus::Confirmed => "CONFIRMED",
            RsvpStatus::Declined => "DECLINED",
        }
    }

    /// True for confirmed and declined, the states that carry a response time.
    pub fn is_answer(self) -> bool {
        !matches!(self, RsvpStatus::Pending)
    }

    /// The `responded_at` value that goes with moving into this status.
    pub fn responded_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.is_answer().then_some(now)
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown RSVP status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for RsvpStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(RsvpStatus::Pending),
            "oui" | "confirmed" => Ok(RsvpStatus::Confirmed),
            "non" | "declined" => Ok(RsvpStatus::Declined),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guest {
    pub id: i32,
    pub child_name: String,
    pub parent_name: String,
    pub contact_email: Option<String>,
    pub whatsapp: String,
    pub token: String,
    pub status: RsvpStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// A guest about to be inserted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewGuest {
    pub child_name: String,
    pub parent_name: String,
    pub contact_email: Option<String>,
    pub whatsapp: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl NewGuest {
    /// Fresh pending guest with a random v4 token.
    pub fn issue(details: GuestDetails, now: DateTime<Utc>) -> Self {
        Self {
            child_name: details.child_name,
            parent_name: details.parent_name,
            contact_email: details.contact_email,
            whatsapp: details.whatsapp,
            token: uuid::Uuid::new_v4().to_string(),
            created_at: now,
        }
    }
}

/// The admin-editable part of a guest. Token and status are not in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestDetails {
    pub child_name: String,
    pub parent_name: String,
    pub contact_email: Option<String>,
    pub whatsapp: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuestStats {
    pub total: i64,
    pub confirmed: i64,
    pub declined: i64,
    pub pending: i64,
}

impl GuestStats {
    pub fn record(&mut self, status: RsvpStatus, count: i64) {
        match status {
            RsvpStatus::Pending => self.pending += count,
            RsvpStatus::Confirmed => self.confirmed += count,
            RsvpStatus::Declined => self.declined += count,
        }
        self.total += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings() {
        assert_eq!("oui".parse::<RsvpStatus>(), Ok(RsvpStatus::Confirmed));
        assert_eq!("confirmed".parse::<RsvpStatus>(), Ok(RsvpStatus::Confirmed));
        assert_eq!("non".parse::<RsvpStatus>(), Ok(RsvpStatus::Declined));
        assert_eq!("declined".parse::<RsvpStatus>(), Ok(RsvpStatus::Declined));
        assert_eq!("pending".parse::<RsvpStatus>(), Ok(RsvpStatus::Pending));
        assert!("maybe".parse::<RsvpStatus>().is_err());
    }

    #[test]
    fn serializes_to_stored_values() {
        let json = serde_json::to_string(&RsvpStatus::ALL).unwrap();
        assert_eq!(json, r#"["pending","oui","non"]"#);
        let parsed: RsvpStatus = serde_json::from_str(r#""declined""#).unwrap();
        assert_eq!(parsed, RsvpStatus::Declined);
    }

    #[test]
    fn pending_clears_response_time() {
        let now = Utc::now();
        assert_eq!(RsvpStatus::Pending.responded_at(now), None);
        assert_eq!(RsvpStatus::Confirmed.responded_at(now), Some(now));
        assert_eq!(RsvpStatus::Declined.responded_at(now), Some(now));
    }

    #[test]
    fn stats_total_tracks_buckets() {
        let mut stats = GuestStats::default();
        stats.record(RsvpStatus::Confirmed, 3);
        stats.record(RsvpStatus::Declined, 1);
        stats.record(RsvpStatus::Pending, 2);
        assert_eq!(stats.total, stats.confirmed + stats.declined + stats.pending);
        assert_eq!(stats.total, 6);
    }

    #[test]
    fn issued_tokens_differ() {
        let details = GuestDetails {
            child_name: "Léa".into(),
            parent_name: "Nadia".into(),
            contact_email: None,
            whatsapp: "+21612345678".into(),
        };
        let a = NewGuest::issue(details.clone(), Utc::now());
        let b = NewGuest::issue(details, Utc::now());
        assert_ne!(a.token, b.token);
    }
}
