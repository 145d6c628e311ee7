//! Terminal-facing wire protocol: JSON message types, the codec, and close codes.

pub mod close_code;
pub mod codec;
pub mod messages;

pub use codec::{decode_inbound, encode_server_message, ProtocolError};
pub use messages::{iso_timestamp_now, ServerMessage};
