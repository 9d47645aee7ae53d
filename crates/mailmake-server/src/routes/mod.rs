//! HTTP and WebSocket routes

pub mod editor;
pub mod render;
pub mod templates;
