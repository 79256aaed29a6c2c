//! Store Ratings Core - Shared domain types and access-control policies.
//!
//! This crate provides the types used across all Store Ratings components:
//! - `server` - HTTP API over the rating model
//! - `cli` - Command-line tools for migrations and bootstrapping
//!
//! # Architecture
//!
//! The core crate contains only types, validation and pure policy
//! predicates - no I/O, no database access, no HTTP. Storage constraints are
//! mirrored here so that requests are rejected before they reach the database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles, names, addresses and scores
//! - [`validation`] - Field-level validation errors
//! - [`policy`] - Per-row access-control predicates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod policy;
pub mod types;
pub mod validation;

pub use policy::{Caller, Decision, Operation, PolicyDenied, Resource, RowPolicy};
pub use types::*;
pub use validation::{Field, ValidationError};
