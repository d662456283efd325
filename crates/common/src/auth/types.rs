//! OAuth credential types
//!
//! A [`Credential`] is the bearer token plus the metadata needed to decide
//! when it must be replaced. The serialized form is the flat credential file
//! layout: `{ "access_token", "refresh_token", "expires_at" }`.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// OAuth access token with optional refresh token and absolute expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token sent on every authenticated call
    pub access_token: String,

    /// Refresh token, absent for client-credentials grants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiration timestamp (UTC, RFC 3339 on disk)
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self { access_token: access_token.into(), refresh_token, expires_at }
    }

    /// Build a credential from a token response lifetime (`expires_in`
    /// seconds from now).
    ///
    /// Returns `None` when the expiry is not representable; callers handling
    /// server input treat that as a malformed response.
    #[must_use]
    pub fn try_from_lifetime(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: i64,
    ) -> Option<Self> {
        let expires_at = offset_from_now(expires_in_secs)?;
        Some(Self::new(access_token, refresh_token, expires_at))
    }

    /// Like [`try_from_lifetime`](Self::try_from_lifetime), but clamps an
    /// unrepresentable expiry to the earliest or latest instant.
    #[must_use]
    pub fn from_lifetime(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: i64,
    ) -> Self {
        let expires_at = offset_from_now(expires_in_secs).unwrap_or(if expires_in_secs > 0 {
            DateTime::<Utc>::MAX_UTC
        } else {
            DateTime::<Utc>::MIN_UTC
        });
        Self::new(access_token, refresh_token, expires_at)
    }

    /// True when the token is expired or will expire within `skew_secs`.
    #[must_use]
    pub fn is_expired(&self, skew_secs: i64) -> bool {
        match offset_from_now(skew_secs) {
            Some(deadline) => deadline >= self.expires_at,
            // A skew past the end of time covers every expiry.
            None => skew_secs > 0,
        }
    }

    /// True when a refresh-token grant is possible.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    #[must_use]
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds()
    }
}

fn offset_from_now(secs: i64) -> Option<DateTime<Utc>> {
    Utc::now().checked_add_signed(TimeDelta::try_seconds(secs)?)
}

// Tokens never reach log output.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_honours_skew() {
        let credential = Credential::from_lifetime("access", None, 20);

        assert!(!credential.is_expired(0));
        assert!(credential.is_expired(30));
    }

    #[test]
    fn past_expiry_is_expired_without_skew() {
        let credential = Credential::new("access", None, Utc::now() - TimeDelta::seconds(1));
        assert!(credential.is_expired(0));
    }

    #[test]
    fn unrepresentable_lifetime_is_rejected() {
        assert!(Credential::try_from_lifetime("access", None, i64::MAX).is_none());
        assert!(Credential::try_from_lifetime("access", None, 3600).is_some());
    }

    #[test]
    fn extreme_values_do_not_panic() {
        let far = Credential::from_lifetime("access", None, i64::MAX);
        assert_eq!(far.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!far.is_expired(30));

        let fresh = Credential::from_lifetime("access", None, 3600);
        assert!(fresh.is_expired(i64::MAX));
        assert!(!fresh.is_expired(i64::MIN));
    }

    #[test]
    fn empty_refresh_token_cannot_refresh() {
        let credential = Credential::from_lifetime("access", Some(String::new()), 3600);
        assert!(!credential.can_refresh());
    }

    #[test]
    fn serializes_to_flat_file_layout() {
        let expires_at = DateTime::parse_from_rfc3339("2024-06-24T10:00:00Z").unwrap();
        let credential =
            Credential::new("access", Some("refresh".into()), expires_at.with_timezone(&Utc));

        let json = serde_json::to_value(&credential).unwrap();

        assert_eq!(json["access_token"], "access");
        assert_eq!(json["refresh_token"], "refresh");
        assert_eq!(json["expires_at"], "2024-06-24T10:00:00Z");
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let credential = Credential::from_lifetime("secret-access", Some("secret-refresh".into()), 60);
        let rendered = format!("{credential:?}");

        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
