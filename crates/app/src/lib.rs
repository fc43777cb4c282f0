#![deny(unsafe_code)]

/// Terminal session driving the chat controller.
pub mod app;
pub mod cli;
/// Persisted client settings.
pub mod settings;
pub mod terminal;
