//! Typed notification payloads.
//!
//! Engines describe *what* to send; formatting into message text and the
//! share deep link happens here.

use serde::{Deserialize, Serialize};

use crate::location::Coordinates;
use crate::storage::ShareConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// SOS fired: ask for help.
    Alert,
    /// Plain "here I am" location share.
    Share,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub kind: PayloadKind,
    pub coordinates: Option<Coordinates>,
    /// Extra line appended after the location, e.g. the journey route.
    pub free_text: Option<String>,
}

impl NotificationPayload {
    pub fn alert(coordinates: Coordinates) -> Self {
        Self {
            kind: PayloadKind::Alert,
            coordinates: Some(coordinates),
            free_text: None,
        }
    }

    pub fn share(coordinates: Coordinates) -> Self {
        Self {
            kind: PayloadKind::Share,
            coordinates: Some(coordinates),
            free_text: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.free_text = Some(note.into());
        self
    }

    /// Human-readable message body.
    pub fn message(&self, share: &ShareConfig) -> String {
        let mut text = match (self.kind, self.coordinates) {
            (PayloadKind::Alert, Some(at)) => format!(
                "Emergency! I need help. My location: {}",
                at.maps_link(&share.maps_url)
            ),
            (PayloadKind::Alert, None) => "Emergency! I need help.".to_string(),
            (PayloadKind::Share, Some(at)) => {
                format!("I'm currently at: {}", at.maps_link(&share.maps_url))
            }
            (PayloadKind::Share, None) => "My location is not available yet.".to_string(),
        };
        if let Some(note) = self.free_text.as_deref().filter(|n| !n.trim().is_empty()) {
            text.push('\n');
            text.push_str(note);
        }
        text
    }

    /// Pre-filled message-share deep link.
    pub fn share_link(&self, share: &ShareConfig) -> String {
        format!(
            "{}{}",
            share.message_url,
            urlencoding::encode(&self.message(share))
        )
    }
}
