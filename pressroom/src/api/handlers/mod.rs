//! HTTP request handlers for the management API.

pub mod analytics;
pub mod auth;
pub mod content;
pub mod logs;
pub mod organizations;
pub mod provider_keys;
pub mod tool_settings;
pub mod tools;
pub mod users;
pub mod wordpress;
