//! API models for requests and responses

pub mod api;
pub mod editor;
pub mod render;
pub mod template;

// Re-export commonly used types
pub use api::*;
pub use editor::*;
pub use render::*;
pub use template::*;
