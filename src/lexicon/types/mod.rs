//! Foundational data structures, error types, languages and configuration.

pub mod config;
pub mod error;
pub mod language;
pub mod models;
