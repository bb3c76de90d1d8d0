//! Delivery preference entity and the two-channel summary exchanged with clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use herald_core::types::id::{PreferenceId, UserId};

use crate::notification::UnknownVariant;

/// Preference rows written by the live protocol apply to every notification type.
pub const ALL_NOTIFICATION_TYPES: &str = "all";

/// A transport a user can enable or disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// Email digest delivery.
    Email,
    /// Live push over the persistent connection.
    Push,
}

impl DeliveryChannel {
    /// Return the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryChannel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            other => Err(UnknownVariant {
                kind: "delivery channel",
                value: other.to_string(),
            }),
        }
    }
}

/// One stored preference row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPreference {
    /// Row identifier.
    pub id: PreferenceId,
    /// Owning user.
    pub user_id: UserId,
    /// Notification type the row applies to, or `"all"`.
    pub notification_type: String,
    /// Whether the row enables delivery.
    pub enabled: bool,
    /// Channels this row covers.
    pub channels: Vec<DeliveryChannel>,
}

impl DeliveryPreference {
    /// Whether this row enables `channel`.
    pub fn allows(&self, channel: DeliveryChannel) -> bool {
        self.enabled && self.channels.contains(&channel)
    }

    /// Whether this row applies to notifications of `notification_type`.
    pub fn applies_to(&self, notification_type: &str) -> bool {
        self.notification_type == ALL_NOTIFICATION_TYPES
            || self.notification_type == notification_type
    }
}

/// Data required to insert a preference row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeliveryPreference {
    /// Notification type the row applies to, or `"all"`.
    pub notification_type: String,
    /// Whether the row enables delivery.
    pub enabled: bool,
    /// Channels this row covers.
    pub channels: Vec<DeliveryChannel>,
}

/// Per-channel switches as exchanged on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSummary {
    /// Email delivery enabled.
    pub email_notifications: bool,
    /// Live push delivery enabled.
    pub push_notifications: bool,
}

impl PreferenceSummary {
    /// Derive the summary from stored rows; no rows means everything is on.
    pub fn from_rows(rows: &[DeliveryPreference]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        Self {
            email_notifications: rows.iter().any(|r| r.allows(DeliveryChannel::Email)),
            push_notifications: rows.iter().any(|r| r.allows(DeliveryChannel::Push)),
        }
    }

    /// Rows that represent this summary.
    ///
    /// One `"all"` row per enabled channel. When both channels are off a
    /// single disabled marker row is written so the user is not mistaken
    /// for one who never chose.
    pub fn to_rows(&self) -> Vec<NewDeliveryPreference> {
        let mut rows = Vec::with_capacity(2);
        if self.email_notifications {
            rows.push(NewDeliveryPreference {
                notification_type: ALL_NOTIFICATION_TYPES.to_string(),
                enabled: true,
                channels: vec![DeliveryChannel::Email],
            });
        }
        if self.push_notifications {
            rows.push(NewDeliveryPreference {
                notification_type: ALL_NOTIFICATION_TYPES.to_string(),
                enabled: true,
                channels: vec![DeliveryChannel::Push],
            });
        }
        if rows.is_empty() {
            rows.push(NewDeliveryPreference {
                notification_type: ALL_NOTIFICATION_TYPES.to_string(),
                enabled: false,
                channels: Vec::new(),
            });
        }
        rows
    }
}

impl Default for PreferenceSummary {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(user_id: UserId, rows: Vec<NewDeliveryPreference>) -> Vec<DeliveryPreference> {
        rows.into_iter()
            .map(|r| DeliveryPreference {
                id: PreferenceId::new(),
                user_id,
                notification_type: r.notification_type,
                enabled: r.enabled,
                channels: r.channels,
            })
            .collect()
    }

    #[test]
    fn test_no_rows_means_all_enabled() {
        let summary = PreferenceSummary::from_rows(&[]);
        assert!(summary.email_notifications);
        assert!(summary.push_notifications);
    }

    #[test]
    fn test_one_row_per_enabled_channel() {
        let summary = PreferenceSummary {
            email_notifications: false,
            push_notifications: true,
        };
        let rows = summary.to_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].notification_type, "all");
        assert_eq!(rows[0].channels, vec![DeliveryChannel::Push]);

        let user = UserId::new();
        assert_eq!(PreferenceSummary::from_rows(&stored(user, rows)), summary);
    }

    #[test]
    fn test_all_disabled_survives_round_trip() {
        let summary = PreferenceSummary {
            email_notifications: false,
            push_notifications: false,
        };
        let user = UserId::new();
        let rows = stored(user, summary.to_rows());
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].enabled);
        assert_eq!(PreferenceSummary::from_rows(&rows), summary);
    }

    #[test]
    fn test_applies_to_all_or_exact_type() {
        let row = DeliveryPreference {
            id: PreferenceId::new(),
            user_id: UserId::new(),
            notification_type: "mention".to_string(),
            enabled: true,
            channels: vec![DeliveryChannel::Email],
        };
        assert!(row.applies_to("mention"));
        assert!(!row.applies_to("reply"));
        assert!(row.allows(DeliveryChannel::Email));
        assert!(!row.allows(DeliveryChannel::Push));
    }
}
