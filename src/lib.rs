// ABOUTME: Library root for hangar - exposes the deploy pipeline and its seams for testing.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod options;
pub mod output;
pub mod settings;
pub mod types;
