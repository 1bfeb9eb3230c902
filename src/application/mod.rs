// Application layer - Form store, export use cases and self-checks
pub mod export_service;
pub mod form_service;
pub mod platform;
pub mod self_check;
