//! Persisted OAuth session material shared by the backends.
//!
//! A secrets unit holds exactly four session keys. Restoring is lenient: a unit without a
//! `token_type`, or with an `expiry` that is not RFC3339, simply yields no session.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::secrets::{Secrets, SecretsError};

pub const TOKEN_TYPE: &str = "token_type";
pub const ACCESS_TOKEN: &str = "access_token";
pub const EXPIRY: &str = "expiry";
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Tokens are refreshed slightly before they actually expire.
const EXPIRY_LEEWAY_SECS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthToken {
    pub token_type: String,
    pub access_token: String,
    pub expiry: DateTime<Utc>,
    pub refresh_token: String,
}

impl OAuthToken {
    /// Build a token from a token endpoint response's `expires_in` seconds.
    pub fn expiring_in(
        token_type: String,
        access_token: String,
        expires_in: u64,
        refresh_token: String,
    ) -> Self {
        let expires_in = i64::try_from(expires_in).unwrap_or(i64::MAX);
        Self {
            token_type,
            access_token,
            expiry: Utc::now() + Duration::seconds(expires_in.min(i64::from(u32::MAX))),
            refresh_token,
        }
    }

    pub fn restore(secrets: &dyn Secrets) -> Option<Self> {
        if !secrets.is_set(TOKEN_TYPE) {
            return None;
        }

        let expiry = match DateTime::parse_from_rfc3339(&secrets.get(EXPIRY)) {
            Ok(expiry) => expiry.with_timezone(&Utc),
            Err(error) => {
                log::warn!("Ignoring stored session with malformed expiry: {}", error);
                return None;
            }
        };

        Some(Self {
            token_type: secrets.get(TOKEN_TYPE),
            access_token: secrets.get(ACCESS_TOKEN),
            expiry,
            refresh_token: secrets.get(REFRESH_TOKEN),
        })
    }

    pub fn persist(&self, secrets: &mut dyn Secrets) -> Result<(), SecretsError> {
        secrets.set(TOKEN_TYPE, &self.token_type);
        secrets.set(ACCESS_TOKEN, &self.access_token);
        secrets.set(
            EXPIRY,
            &self.expiry.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        secrets.set(REFRESH_TOKEN, &self.refresh_token);
        secrets.save()
    }

    pub fn is_expired(&self) -> bool {
        self.expiry - Duration::seconds(EXPIRY_LEEWAY_SECS) <= Utc::now()
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemorySecrets;
    use chrono::TimeZone;

    fn stored(expiry: &str) -> MemorySecrets {
        MemorySecrets::with_values(&[
            (TOKEN_TYPE, "Bearer"),
            (ACCESS_TOKEN, "access"),
            (EXPIRY, expiry),
            (REFRESH_TOKEN, "refresh"),
        ])
    }

    #[test]
    fn test_restore_without_token_type() {
        let secrets = MemorySecrets::with_values(&[(ACCESS_TOKEN, "access")]);
        assert_eq!(OAuthToken::restore(&secrets), None);
    }

    #[test]
    fn test_restore_with_malformed_expiry() {
        let secrets = stored("next tuesday");
        assert_eq!(OAuthToken::restore(&secrets), None);
    }

    #[test]
    fn test_restore_reads_all_fields() {
        let secrets = stored("2030-01-02T03:04:05+01:00");
        let token = OAuthToken::restore(&secrets).unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.access_token, "access");
        assert_eq!(token.refresh_token, "refresh");
        assert_eq!(
            token.expiry,
            Utc.with_ymd_and_hms(2030, 1, 2, 2, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_persist_writes_rfc3339_and_saves() {
        let mut secrets = MemorySecrets::default();
        let token = OAuthToken {
            token_type: "Bearer".into(),
            access_token: "new-access".into(),
            expiry: Utc.with_ymd_and_hms(2031, 5, 6, 7, 8, 9).unwrap(),
            refresh_token: "new-refresh".into(),
        };

        token.persist(&mut secrets).unwrap();

        assert_eq!(secrets.value(EXPIRY).as_deref(), Some("2031-05-06T07:08:09Z"));
        assert_eq!(secrets.value(ACCESS_TOKEN).as_deref(), Some("new-access"));
        assert_eq!(secrets.save_count(), 1);
        assert_eq!(OAuthToken::restore(&secrets), Some(token));
    }

    #[test]
    fn test_expiry_checks() {
        let token = OAuthToken::expiring_in("Bearer".into(), "a".into(), 3600, String::new());
        assert!(!token.is_expired());
        assert!(!token.can_refresh());

        let expired = OAuthToken {
            expiry: Utc::now() - Duration::seconds(1),
            ..token
        };
        assert!(expired.is_expired());
    }
}
