//! Database layer: error mapping, entity models, and repositories.

pub mod errors;
pub mod handlers;
pub mod models;
