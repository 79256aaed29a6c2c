//! Rating score.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// An integer star rating in `1..=5`.
///
/// Deserializing goes through `i64`, so fractional JSON numbers such as `4.5`
/// are rejected before range checking.
///
/// ```
/// use store_ratings_core::Score;
///
/// assert_eq!(Score::try_from(4).unwrap().get(), 4);
/// assert!(Score::try_from(0).is_err());
/// assert!(Score::try_from(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub struct Score(i16);

impl Score {
    pub const MIN: i16 = 1;
    pub const MAX: i16 = 5;

    /// Returns the score value.
    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }
}

impl TryFrom<i64> for Score {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        i16::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ValidationError::ScoreOutOfRange(value))
    }
}

impl TryFrom<f64> for Score {
    type Error = ValidationError;

    /// Accepts only whole numbers; `4.5` is rejected.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.fract() != 0.0 || !value.is_finite() {
            #[allow(clippy::cast_possible_truncation)] // reported value only
            return Err(ValidationError::ScoreOutOfRange(value as i64));
        }
        #[allow(clippy::cast_possible_truncation)] // whole number, range checked below
        Self::try_from(value as i64)
    }
}

impl From<Score> for i16 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Score {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i16 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Score {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i16 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::try_from(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Score {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i16 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_one_through_five() {
        for v in 1..=5 {
            assert_eq!(i64::from(Score::try_from(v).unwrap().get()), v);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(Score::try_from(0), Err(ValidationError::ScoreOutOfRange(0)));
        assert_eq!(Score::try_from(6), Err(ValidationError::ScoreOutOfRange(6)));
        assert!(Score::try_from(-1).is_err());
        assert!(Score::try_from(i64::MAX).is_err());
    }

    #[test]
    fn test_rejects_fractions() {
        assert!(Score::try_from(4.5_f64).is_err());
        assert!(Score::try_from(f64::NAN).is_err());
        assert_eq!(Score::try_from(3.0_f64).unwrap().get(), 3);
    }

    #[test]
    fn test_json_rejects_non_integers() {
        assert!(serde_json::from_str::<Score>("4.5").is_err());
        assert!(serde_json::from_str::<Score>("\"4\"").is_err());
        assert!(serde_json::from_str::<Score>("6").is_err());
        assert_eq!(serde_json::from_str::<Score>("5").unwrap().get(), 5);
        assert_eq!(serde_json::to_string(&Score::try_from(2).unwrap()).unwrap(), "2");
    }
}
