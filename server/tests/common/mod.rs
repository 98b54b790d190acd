//! Common test utilities for the API integration tests
//!
//! Every `TestApp` gets its own temporary directory holding the database and
//! the upload store, so tests never share state.

pub mod app;
pub mod config;
pub mod fixtures;

pub use app::{spawn_app, spawn_app_with, TestApp, TestResponse, TestUser};
pub use config::TestConfig;
