//! Module Exports
//!
//! This file exports the modules that make up the network command surface.
//!
//! # Modules
//! - `payload`: JSON payloads and the request body extractor.
//! - `server`: HTTP routes, the WebSocket command stream and the server task.

pub mod payload;
/// Module for the HTTP server, its routes and the WebSocket handler.
pub mod server;
