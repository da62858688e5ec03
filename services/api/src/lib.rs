//! Recipe management API service
//!
//! REST backend for recipes, tags, and ingredients with email-based user
//! accounts, opaque bearer-token authentication, and per-user data
//! isolation.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;
pub mod validation;
