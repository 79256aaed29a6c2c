//! Application roles.

use serde::{Deserialize, Serialize};

/// Role of a profile, stored as the `ratings.user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "ratings.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users and stores.
    Admin,
    /// Browses stores and submits ratings.
    #[default]
    NormalUser,
    /// Owns a store and reads its feedback.
    StoreOwner,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::NormalUser, Self::StoreOwner];

    /// Returns the wire/storage name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::NormalUser => "normal_user",
            Self::StoreOwner => "store_owner",
        }
    }

    /// Parse a role, falling back to [`Role::NormalUser`] when the input is
    /// missing or not one of the enumerated roles.
    #[must_use]
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "normal_user" => Ok(Self::NormalUser),
            "store_owner" => Ok(Self::StoreOwner),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(Role::parse_or_default(Some("store_owner")), Role::StoreOwner);
        assert_eq!(Role::parse_or_default(Some(" admin ")), Role::Admin);
        assert_eq!(Role::parse_or_default(Some("superuser")), Role::NormalUser);
        assert_eq!(Role::parse_or_default(Some("")), Role::NormalUser);
        assert_eq!(Role::parse_or_default(None), Role::NormalUser);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::StoreOwner).unwrap(),
            "\"store_owner\""
        );
        assert!(serde_json::from_str::<Role>("\"StoreOwner\"").is_err());
    }
}
