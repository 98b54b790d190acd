pub mod auth;
pub mod authoring;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod permissions;
pub mod request_context;
pub mod routes;
pub mod stats;
pub mod submission;
pub mod user_agent;
