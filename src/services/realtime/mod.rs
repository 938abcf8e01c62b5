//! Live location sharing between connected clients.
mod error;
mod hub;

pub use error::WebSocketError;
pub use hub::{LocationHub, LocationUpdate};
