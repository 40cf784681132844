//! Utility re-exports for the dual-mode bot.
//!
//! - `connection`: HTTP/WebSocket command surface
//! - `controllers`: mode arbitration, motor output and sensor inputs
//! - `math`: differential drive mixing
//! - `frontend`: the embedded control page

pub mod connection;
pub mod controllers;
pub(crate) mod frontend;
pub mod math;

pub use connection::server::run as http;
pub use controllers::SystemController;
pub use embassy_time::*;
pub use math::mixer::{mix, DriveCommand};
