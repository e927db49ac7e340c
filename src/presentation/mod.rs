// Presentation layer - HTTP surface over the simulation context
pub mod app_state;
pub mod handlers;
