//! Shopify API version definitions.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Shopify API version.
///
/// Shopify releases API versions quarterly. Known stable versions have their
/// own variants; anything else in `YYYY-MM` form is accepted as `Custom`.
///
/// # Example
///
/// ```rust
/// use shopify_graphql::ApiVersion;
///
/// let version: ApiVersion = "2024-10".parse().unwrap();
/// assert_eq!(version, ApiVersion::V2024_10);
/// assert_eq!(version.admin_graphql_path(), "/admin/api/2024-10/graphql.json");
/// assert_eq!(version.storefront_graphql_path(), "/api/2024-10/graphql.json");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// API version 2024-01
    V2024_01,
    /// API version 2024-04
    V2024_04,
    /// API version 2024-07
    V2024_07,
    /// API version 2024-10
    V2024_10,
    /// API version 2025-01
    V2025_01,
    /// API version 2025-04
    V2025_04,
    /// API version 2025-07
    V2025_07,
    /// API version 2025-10
    V2025_10,
    /// Unstable API version for development and testing.
    Unstable,
    /// Any other `YYYY-MM` version string.
    Custom(String),
}

impl ApiVersion {
    /// Returns the latest stable API version.
    #[must_use]
    pub const fn latest() -> Self {
        Self::V2025_10
    }

    /// Returns `true` if this is a known stable API version.
    #[must_use]
    pub const fn is_stable(&self) -> bool {
        !matches!(self, Self::Unstable | Self::Custom(_))
    }

    /// Path of the Admin GraphQL endpoint for this version.
    #[must_use]
    pub fn admin_graphql_path(&self) -> String {
        format!("/admin/api/{self}/graphql.json")
    }

    /// Path of the Storefront GraphQL endpoint for this version.
    #[must_use]
    pub fn storefront_graphql_path(&self) -> String {
        format!("/api/{self}/graphql.json")
    }

    fn is_valid_version_format(s: &str) -> bool {
        let Some((year, month)) = s.split_once('-') else {
            return false;
        };
        year.len() == 4
            && month.len() == 2
            && year.chars().all(|c| c.is_ascii_digit())
            && month.parse::<u8>().is_ok_and(|m| (1..=12).contains(&m))
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version_str = match self {
            Self::V2024_01 => "2024-01",
            Self::V2024_04 => "2024-04",
            Self::V2024_07 => "2024-07",
            Self::V2024_10 => "2024-10",
            Self::V2025_01 => "2025-01",
            Self::V2025_04 => "2025-04",
            Self::V2025_07 => "2025-07",
            Self::V2025_10 => "2025-10",
            Self::Unstable => "unstable",
            Self::Custom(s) => s,
        };
        f.write_str(version_str)
    }
}

impl FromStr for ApiVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        match s.as_str() {
            "2024-01" => Ok(Self::V2024_01),
            "2024-04" => Ok(Self::V2024_04),
            "2024-07" => Ok(Self::V2024_07),
            "2024-10" => Ok(Self::V2024_10),
            "2025-01" => Ok(Self::V2025_01),
            "2025-04" => Ok(Self::V2025_04),
            "2025-07" => Ok(Self::V2025_07),
            "2025-10" => Ok(Self::V2025_10),
            "unstable" => Ok(Self::Unstable),
            _ if Self::is_valid_version_format(&s) => Ok(Self::Custom(s)),
            _ => Err(ConfigError::InvalidApiVersion { version: s }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_versions_round_trip_through_display() {
        for version in ["2024-01", "2024-10", "2025-07", "unstable"] {
            let parsed: ApiVersion = version.parse().unwrap();
            assert_eq!(parsed.to_string(), version);
        }
    }

    #[test]
    fn test_older_versions_parse_as_custom() {
        let version: ApiVersion = "2022-04".parse().unwrap();
        assert_eq!(version, ApiVersion::Custom("2022-04".to_string()));
        assert!(!version.is_stable());
        assert_eq!(version.admin_graphql_path(), "/admin/api/2022-04/graphql.json");
    }

    #[test]
    fn test_invalid_versions_are_rejected() {
        assert!("2024-13".parse::<ApiVersion>().is_err());
        assert!("24-01".parse::<ApiVersion>().is_err());
        assert!("latest".parse::<ApiVersion>().is_err());
    }

    #[test]
    fn test_default_is_latest() {
        assert_eq!(ApiVersion::default(), ApiVersion::latest());
        assert!(ApiVersion::latest().is_stable());
    }
}
