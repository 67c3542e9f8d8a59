//! Request handlers.

pub mod health;
pub mod render;

pub use health::{health, ready};
pub use render::{get_render_status, queue_status, submit_render};
