//! Origin allow-list for the upgrade handshake.

use std::collections::HashSet;

use axum::http::HeaderMap;
use axum::http::header::ORIGIN;

use crate::error::UpgradeError;

/// Origin used when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Set of origins permitted to open a session. Matching is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    origins: HashSet<String>,
}

impl AllowedOrigins {
    /// Builds the set from individual origins.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a comma-separated list, trimming entries and dropping blanks.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    /// Returns `true` if `origin` is in the set.
    #[must_use]
    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    /// Validates the `Origin` header of an upgrade request, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`UpgradeError::OriginMissing`] when the header is absent or
    /// not visible ASCII, and [`UpgradeError::OriginNotAllowed`] when it is
    /// not in the set.
    pub fn check<'h>(&self, headers: &'h HeaderMap) -> Result<&'h str, UpgradeError> {
        let origin = headers
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .ok_or(UpgradeError::OriginMissing)?;
        if self.is_allowed(origin) {
            Ok(origin)
        } else {
            Err(UpgradeError::OriginNotAllowed(origin.to_string()))
        }
    }

    /// Number of configured origins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// Returns `true` if no origin is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self::new([DEFAULT_ORIGIN])
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(origin: Option<&'static str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(o) = origin {
            map.insert(ORIGIN, HeaderValue::from_static(o));
        }
        map
    }

    #[test]
    fn default_allows_localhost_3000() {
        let origins = AllowedOrigins::default();
        assert!(origins.is_allowed("http://localhost:3000"));
        assert_eq!(origins.len(), 1);
    }

    #[test]
    fn matching_is_exact() {
        let origins = AllowedOrigins::default();
        assert!(!origins.is_allowed("http://localhost:3000/"));
        assert!(!origins.is_allowed("HTTP://LOCALHOST:3000"));
        assert!(!origins.is_allowed("http://localhost"));
    }

    #[test]
    fn check_accepts_listed_origin() {
        let origins = AllowedOrigins::default();
        let map = headers(Some("http://localhost:3000"));
        assert_eq!(origins.check(&map).ok(), Some("http://localhost:3000"));
    }

    #[test]
    fn check_rejects_unlisted_and_missing() {
        let origins = AllowedOrigins::default();
        assert!(matches!(
            origins.check(&headers(Some("http://evil.example"))),
            Err(UpgradeError::OriginNotAllowed(o)) if o == "http://evil.example"
        ));
        assert!(matches!(
            origins.check(&headers(None)),
            Err(UpgradeError::OriginMissing)
        ));
    }

    #[test]
    fn parse_drops_blank_entries() {
        let origins = AllowedOrigins::parse(",, ,");
        assert!(origins.is_empty());
    }
}
