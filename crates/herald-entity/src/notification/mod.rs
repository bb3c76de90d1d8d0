//! Notification domain entities.

pub mod actor;
pub mod kind;
pub mod model;
pub mod payload;

pub use actor::{ActorSummary, NotificationActor};
pub use kind::{NotificationTarget, NotificationType, TargetType, UnknownVariant};
pub use model::{NewNotification, Notification};
pub use payload::NotificationPayload;
