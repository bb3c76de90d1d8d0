//! Live wire protocol: JSON frames in both directions and close reasons.

pub mod close;
pub mod frames;

pub use close::CloseReason;
pub use frames::{ClientFrame, ServerFrame};
