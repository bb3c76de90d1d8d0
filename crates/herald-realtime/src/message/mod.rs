//! Inbound frame decoding and command dispatch.

pub mod codec;
pub mod dispatcher;

pub use codec::{FrameError, MAX_FRAME_BYTES, decode_frame, encode_frame};
pub use dispatcher::MessageDispatcher;
