//! HTTP API for the calorie tracker

pub mod auth_handlers;
pub mod calorie_handlers;
pub mod handlers;
pub mod routes;

pub use routes::create_router;
