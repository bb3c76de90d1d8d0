//! PostgreSQL implementations of the store traits.

pub mod content;
pub mod notification;
pub mod preference;

pub use content::ContentRepository;
pub use notification::NotificationRepository;
pub use preference::PreferenceRepository;
