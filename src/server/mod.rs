//! Server module - HTTP surface of the lobby registry

mod error;
mod handlers;
mod listener;

pub use error::ApiError;
pub use listener::{router, LobbyServer};
