//! WebSocket game endpoint

mod connection;

pub use connection::ws_handler;
