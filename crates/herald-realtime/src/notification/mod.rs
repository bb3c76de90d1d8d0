//! Notification publishing, inbox operations, and delivery preferences.

pub mod inbox;
pub mod preferences;
pub mod preview;
pub mod publisher;

pub use inbox::NotificationInbox;
pub use preferences::PreferenceService;
pub use publisher::{NotificationEvent, NotificationPublisher, PublishRequest};
