//! `wa.me` deep links. Nothing here talks to WhatsApp; a person opens the link.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::RsvpNotice;

/// Characters `encodeURIComponent` leaves alone are the only ones not escaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn wa_link(phone: &str, message: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://wa.me/{digits}?text={}",
        utf8_percent_encode(message, COMPONENT)
    )
}

pub fn organizer_message(notice: &RsvpNotice, event_name: &str) -> String {
    format!(
        "New reply for {event_name} 🎂\n\nGuest: {}\nPhone: {}\nStatus: {}\nTime: {}\n",
        or_na(&notice.guest_name),
        or_na(&notice.guest_phone),
        notice.status.label(),
        notice.responded_at.to_rfc3339(),
    )
}

/// Message a guest receives along with their invite link.
pub fn invitation_message(child_name: &str, event_name: &str, invite_url: &str) -> String {
    format!("Hello! {child_name} is invited to {event_name} 🎉\nPlease reply here: {invite_url}")
}

pub(crate) fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}
