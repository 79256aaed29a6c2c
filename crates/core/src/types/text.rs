//! Length-bounded text fields.
//!
//! Lengths are counted in characters, matching `char_length()` in the
//! schema's CHECK constraints. Input is trimmed before it is measured.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{Field, ValidationError};

/// Shared impls for the text newtypes.
macro_rules! text_newtype {
    ($name:ident) => {
        impl $name {
            /// Returns the text as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the value and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, ::sqlx::error::BoxDynError> {
                // Guarded by the column's CHECK constraint
                <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

/// Display name of a profile or name of a store: 20-60 characters.
///
/// ```
/// use store_ratings_core::Name;
///
/// assert!(Name::parse("Corner Bakery and Coffee House").is_ok());
/// assert!(Name::parse("Too short").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    pub const MIN_LENGTH: usize = 20;
    pub const MAX_LENGTH: usize = 60;

    /// Display name given to profiles created without a usable name.
    pub const PLACEHOLDER: &'static str = "Unnamed Store Ratings User";

    /// The placeholder display name.
    #[must_use]
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_owned())
    }

    /// Parse a name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Length` when the trimmed input is shorter than
    /// 20 or longer than 60 characters.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let actual = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&actual) {
            return Err(ValidationError::Length {
                field: Field::Name,
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual,
            });
        }
        Ok(Self(s.to_owned()))
    }
}

text_newtype!(Name);

/// Optional address on a profile: at most 400 characters, may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileAddress(String);

impl ProfileAddress {
    pub const MAX_LENGTH: usize = 400;

    /// Parse a profile address. The empty string is accepted.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::TooLong` above 400 characters.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let actual = s.chars().count();
        if actual > Self::MAX_LENGTH {
            return Err(ValidationError::TooLong {
                field: Field::Address,
                max: Self::MAX_LENGTH,
                actual,
            });
        }
        Ok(Self(s.to_owned()))
    }
}

text_newtype!(ProfileAddress);

/// Required address on a store: 1-400 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreAddress(String);

impl StoreAddress {
    pub const MIN_LENGTH: usize = 1;
    pub const MAX_LENGTH: usize = 400;

    /// Parse a store address.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Length` when empty or above 400 characters.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let s = s.trim();
        let actual = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&actual) {
            return Err(ValidationError::Length {
                field: Field::Address,
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
                actual,
            });
        }
        Ok(Self(s.to_owned()))
    }
}

text_newtype!(StoreAddress);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_bounds() {
        assert!(Name::parse(&"a".repeat(19)).is_err());
        assert!(Name::parse(&"a".repeat(20)).is_ok());
        assert!(Name::parse(&"a".repeat(60)).is_ok());
        assert!(Name::parse(&"a".repeat(61)).is_err());
    }

    #[test]
    fn test_placeholder_is_a_valid_name() {
        assert_eq!(Name::parse(Name::PLACEHOLDER).unwrap(), Name::placeholder());
    }

    #[test]
    fn test_name_counts_characters_not_bytes() {
        // 20 two-byte characters
        assert!(Name::parse(&"é".repeat(20)).is_ok());
        // 31 three-byte characters, 93 bytes
        assert!(Name::parse(&"€".repeat(31)).is_ok());
    }

    #[test]
    fn test_name_is_trimmed_before_measuring() {
        let padded = format!("   {}   ", "a".repeat(19));
        assert!(matches!(
            Name::parse(&padded),
            Err(ValidationError::Length { actual: 19, .. })
        ));
    }

    #[test]
    fn test_profile_address_allows_empty() {
        assert_eq!(ProfileAddress::parse("").unwrap().as_str(), "");
        assert!(ProfileAddress::parse(&"x".repeat(400)).is_ok());
        assert!(matches!(
            ProfileAddress::parse(&"x".repeat(401)),
            Err(ValidationError::TooLong { actual: 401, .. })
        ));
    }

    #[test]
    fn test_store_address_requires_content() {
        assert!(StoreAddress::parse("").is_err());
        assert!(StoreAddress::parse("   ").is_err());
        assert!(StoreAddress::parse("1 Main St").is_ok());
        assert!(StoreAddress::parse(&"x".repeat(400)).is_ok());
        assert!(StoreAddress::parse(&"x".repeat(401)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Name>("\"short\"").is_err());
        let name: Name = serde_json::from_str("\"Riverside Hardware Supplies\"").unwrap();
        assert_eq!(name.as_str(), "Riverside Hardware Supplies");
    }
}
