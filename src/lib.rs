//! Versioned request client for the Microsoft Dynamics 365 Web API.
//!
//! [`api::RequestClient`] performs one round-trip per call against
//! `{host}/api/data/v{major}.{minor}`, and [`api::WebApi`] layers record, query,
//! association and action helpers on top of it.

pub mod api;
pub mod config;
