//! Field-level validation errors.
//!
//! Every constraint the storage layer enforces has a variant here, so a
//! violation caught either in Rust or by a CHECK constraint reaches the caller
//! with the same field-level message.

use core::fmt;

use serde::Serialize;

use crate::types::EmailError;

/// The field a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Address,
    Score,
    Password,
    Rating,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::Score => "score",
            Self::Password => "password",
            Self::Rating => "rating",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constraint violation. Always recoverable and never retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text length outside an inclusive range.
    #[error("{field} must be between {min} and {max} characters (got {actual})")]
    Length {
        field: Field,
        min: usize,
        max: usize,
        actual: usize,
    },

    /// Text longer than an upper bound.
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: Field,
        max: usize,
        actual: usize,
    },

    /// Rating score outside 1..=5.
    #[error("score must be an integer between 1 and 5 (got {0})")]
    ScoreOutOfRange(i64),

    /// Malformed email address.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// A rating for this (rater, store) pair already exists.
    #[error("this store has already been rated by this user")]
    DuplicateRating,

    /// Password does not meet the policy.
    #[error("{0}")]
    Password(String),

    /// A storage constraint we could not map to a more specific variant.
    #[error("{field} violates constraint {constraint}")]
    Constraint { field: Field, constraint: String },
}

impl ValidationError {
    /// The field this error refers to.
    #[must_use]
    pub const fn field(&self) -> Field {
        match self {
            Self::Length { field, .. }
            | Self::TooLong { field, .. }
            | Self::Constraint { field, .. } => *field,
            Self::ScoreOutOfRange(_) => Field::Score,
            Self::Email(_) => Field::Email,
            Self::DuplicateRating => Field::Rating,
            Self::Password(_) => Field::Password,
        }
    }

    /// Translate a named storage constraint back into a validation error.
    ///
    /// Constraint names follow `<table>_<field>_<rule>` as declared in the
    /// schema migration.
    #[must_use]
    pub fn from_constraint(constraint: &str) -> Self {
        if constraint == "rating_rater_store_unique" {
            return Self::DuplicateRating;
        }

        let field = if constraint.contains("_name_") {
            Field::Name
        } else if constraint.contains("_address_") {
            Field::Address
        } else if constraint.contains("_email_") {
            Field::Email
        } else if constraint.contains("_score_") {
            Field::Score
        } else {
            Field::Rating
        };

        Self::Constraint {
            field,
            constraint: constraint.to_owned(),
        }
    }
}
