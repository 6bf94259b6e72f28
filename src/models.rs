use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::utils::{capitalize, format_long_date};

/// Authenticated account as returned by `accounts/me/`.
///
/// Unknown fields are kept so a cached copy round-trips unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: Value,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Name shown in page chrome: the profile name, falling back to the email.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Clone, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub password2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Clone, Debug)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
    pub new_password2: String,
}

/// Generic `{ "detail": "..." }` acknowledgement.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Acknowledgement {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recipient {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub received_status: Option<String>,
}

/// Capsule as listed for its owner. Status is not stored; see [`Capsule::status`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Capsule {
    pub id: Value,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_delivered: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub privacy_status: Option<String>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The raw flags status derivation looks at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusFlags {
    pub is_delivered: bool,
    pub is_archived: bool,
    pub has_delivery_date: bool,
    pub any_recipient_opened: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CapsuleStatus {
    Draft,
    Sealed,
    Delivered,
    Opened,
}

impl CapsuleStatus {
    /// Maps raw backend flags onto the closed status set.
    pub fn derive(flags: StatusFlags) -> Self {
        match flags {
            StatusFlags {
                is_delivered: true,
                any_recipient_opened: true,
                ..
            } => CapsuleStatus::Opened,
            StatusFlags {
                is_delivered: true, ..
            } => CapsuleStatus::Delivered,
            StatusFlags {
                is_archived: false,
                has_delivery_date: true,
                ..
            } => CapsuleStatus::Sealed,
            _ => CapsuleStatus::Draft,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CapsuleStatus::Draft => "draft",
            CapsuleStatus::Sealed => "sealed",
            CapsuleStatus::Delivered => "delivered",
            CapsuleStatus::Opened => "opened",
        }
    }

    pub fn label(&self) -> String {
        capitalize(self.as_str())
    }

    /// Main action offered on a capsule card.
    pub fn primary_action(&self) -> CardAction {
        match self {
            CapsuleStatus::Draft => CardAction::Edit,
            CapsuleStatus::Sealed => CardAction::Details,
            CapsuleStatus::Delivered | CapsuleStatus::Opened => CardAction::ViewContent,
        }
    }
}

impl fmt::Display for CapsuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapsuleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(CapsuleStatus::Draft),
            "sealed" => Ok(CapsuleStatus::Sealed),
            "delivered" => Ok(CapsuleStatus::Delivered),
            "opened" => Ok(CapsuleStatus::Opened),
            _ => Err(format!("Invalid capsule status: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardAction {
    Edit,
    Details,
    ViewContent,
}

impl CardAction {
    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Edit => "Edit",
            CardAction::Details => "Details",
            CardAction::ViewContent => "View Content",
        }
    }
}

impl Capsule {
    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags {
            is_delivered: self.is_delivered,
            is_archived: self.is_archived,
            has_delivery_date: self
                .delivery_date
                .as_deref()
                .is_some_and(|date| !date.is_empty()),
            any_recipient_opened: self
                .recipients
                .iter()
                .any(|r| r.received_status.as_deref() == Some("opened")),
        }
    }

    pub fn status(&self) -> CapsuleStatus {
        CapsuleStatus::derive(self.status_flags())
    }

    /// `May 1, 2030`, or `Not scheduled` when there is no usable date.
    pub fn delivery_display(&self) -> String {
        self.delivery_date
            .as_deref()
            .and_then(format_long_date)
            .unwrap_or_else(|| "Not scheduled".to_string())
    }

    pub fn privacy_display(&self) -> String {
        match self.privacy_status.as_deref() {
            Some(status) if !status.is_empty() => capitalize(status),
            _ => "N/A".to_string(),
        }
    }

    /// Route path of the owner's detail view.
    pub fn detail_path(&self) -> String {
        format!("/capsule/{}", id_segment(&self.id))
    }
}

/// Renders a JSON id (number or string) as a path segment.
pub fn id_segment(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One item of a capsule's contents as shown to a recipient.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContentItem {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Capsule as exposed through a public access token.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublicCapsule {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub contents: Vec<ContentItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PublicCapsule {
    pub fn sender_display(&self) -> &str {
        self.owner_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("a friend")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: Value,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub notification_type: Option<String>,
    #[serde(default)]
    pub capsule: Option<Value>,
    #[serde(default)]
    pub capsule_title: Option<String>,
    #[serde(default)]
    pub created_at_formatted: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnreadCount {
    pub unread_count: u32,
}

impl UnreadCount {
    /// Badge text; hidden at zero, capped at `9+`.
    pub fn badge(&self) -> Option<String> {
        match self.unread_count {
            0 => None,
            1..=9 => Some(self.unread_count.to_string()),
            _ => Some("9+".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn capsule(value: Value) -> Capsule {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn delivered_and_opened_is_opened() {
        let c = capsule(json!({
            "id": 1, "is_delivered": true,
            "recipients": [{ "received_status": "opened" }]
        }));
        assert_eq!(c.status(), CapsuleStatus::Opened);
    }

    #[test]
    fn delivered_but_pending_is_delivered() {
        let c = capsule(json!({
            "id": 1, "is_delivered": true,
            "recipients": [{ "received_status": "pending" }]
        }));
        assert_eq!(c.status(), CapsuleStatus::Delivered);
    }

    #[test]
    fn scheduled_and_not_archived_is_sealed() {
        let c = capsule(json!({
            "id": 1, "is_delivered": false, "is_archived": false,
            "delivery_date": "2030-01-01"
        }));
        assert_eq!(c.status(), CapsuleStatus::Sealed);
    }

    #[test]
    fn missing_date_is_draft() {
        let c = capsule(json!({
            "id": 1, "is_delivered": false, "is_archived": false,
            "delivery_date": null
        }));
        assert_eq!(c.status(), CapsuleStatus::Draft);
    }

    #[test]
    fn archived_with_date_is_draft() {
        let flags = StatusFlags {
            is_archived: true,
            has_delivery_date: true,
            ..StatusFlags::default()
        };
        assert_eq!(CapsuleStatus::derive(flags), CapsuleStatus::Draft);
    }

    #[test]
    fn opened_recipient_without_delivery_is_not_opened() {
        let flags = StatusFlags {
            any_recipient_opened: true,
            has_delivery_date: true,
            ..StatusFlags::default()
        };
        assert_eq!(CapsuleStatus::derive(flags), CapsuleStatus::Sealed);
    }

    #[test]
    fn card_display_helpers() {
        let c = capsule(json!({ "id": "abc", "delivery_date": "2030-05-01", "privacy_status": "private" }));
        assert_eq!(c.delivery_display(), "May 1, 2030");
        assert_eq!(c.privacy_display(), "Private");
        assert_eq!(c.detail_path(), "/capsule/abc");
        assert_eq!(c.status().primary_action().label(), "Details");
    }

    #[test]
    fn cached_user_round_trips_unknown_fields() {
        let raw = json!({ "id": 7, "email": "a@b.c", "name": "Ana", "dob": "1990-01-01" });
        let user: User = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&user).unwrap(), raw);
        assert_eq!(user.display_name(), "Ana");
    }

    #[test]
    fn unread_badge_caps_at_nine() {
        assert_eq!(UnreadCount { unread_count: 0 }.badge(), None);
        assert_eq!(UnreadCount { unread_count: 4 }.badge().as_deref(), Some("4"));
        assert_eq!(UnreadCount { unread_count: 12 }.badge().as_deref(), Some("9+"));
    }
}
