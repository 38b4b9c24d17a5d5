//! Core domain concepts shared across all subdomains.
//!
//! - [`query::Query`] - a validated free-text query
//! - [`error::RegistryError`] - configuration-time registry errors
//! - [`error::InvalidOptionsError`] - request-time validation errors

pub mod error;
pub mod query;
