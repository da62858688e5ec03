//! Common library for the recipebook application
//!
//! This crate provides shared functionality used across the recipebook
//! services, including database connectivity and error handling.

pub mod database;
pub mod error;
