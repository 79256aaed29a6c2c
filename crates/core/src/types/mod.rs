//! Core types for Store Ratings.
//!
//! This module provides type-safe wrappers for the domain concepts that carry
//! storage-level constraints.

pub mod email;
pub mod id;
pub mod role;
pub mod score;
pub mod text;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::Role;
pub use score::Score;
pub use text::{Name, ProfileAddress, StoreAddress};
