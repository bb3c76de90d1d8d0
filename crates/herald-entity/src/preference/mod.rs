//! Delivery preference entities.

pub mod model;

pub use model::{
    ALL_NOTIFICATION_TYPES, DeliveryChannel, DeliveryPreference, NewDeliveryPreference,
    PreferenceSummary,
};
