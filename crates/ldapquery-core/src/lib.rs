//! # ldapquery-core
//!
//! Core types shared by the LDAP query gateway.
//!
//! This crate carries everything that does not need a network: the error taxonomy, the
//! configuration model, the inbound query model and its validator, trace identifiers and the
//! JSON response shapes.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and HTTP status / metrics label mapping
//! - [`config`] - Directory and server configuration
//! - [`query`] - Inbound search query parsing, defaulting and validation
//! - [`trace`] - Per-request trace identifiers
//! - [`types`] - Result entries and the response envelope

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod query;
pub mod trace;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
