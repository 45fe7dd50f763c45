//! HTTP route handlers

mod health;
mod status;

pub use health::health_check;
pub use status::service_info;
