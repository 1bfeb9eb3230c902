// Presentation layer - HTTP surface standing in for the browser form
pub mod app_state;
pub mod handlers;
pub mod router;
