// Infrastructure layer - External dependencies and adapters
pub mod clipboard;
pub mod config;
pub mod download;
pub mod event_stream;
pub mod http_response;
pub mod json_encoder;
