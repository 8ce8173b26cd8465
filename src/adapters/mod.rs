//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                  |
//! |------------|--------------------|------------------------------|
//! | `http`     | (read side)        | ESP-IDF HTTP server          |
//! | `log_sink` | EventSink          | Serial log output            |
//! | `wifi`     | ConnectivityPort   | ESP-IDF WiFi STA             |
//!
//! Sensor drivers live in [`crate::sensors`].

pub mod http;
pub mod log_sink;
pub mod wifi;
