use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims carried by a signed token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the principal the token was issued for.
    pub sub: String,
    /// Issued at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiration time (Unix timestamp, seconds).
    pub exp: i64,
    /// Token id, unique per mint.
    pub jti: String,
    /// Secondary claims supplied at mint time.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A minted token together with the metadata the renewal policy needs.
///
/// This is what the cache stores for a principal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The encoded token.
    pub token: String,
    /// The principal the token was issued for.
    pub subject: String,
    /// Unique id of this token (the `jti` claim).
    pub token_id: String,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the token stops verifying.
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Lifetime left at `now`; zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

// Keeps the encoded token out of logs.
impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("subject", &self.subject)
            .field("token_id", &self.token_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_at: DateTime<Utc>) -> TokenRecord {
        TokenRecord {
            token: "header.payload.signature".to_owned(),
            subject: "alice".to_owned(),
            token_id: "1".to_owned(),
            issued_at: expires_at - chrono::Duration::minutes(60),
            expires_at,
        }
    }

    #[test]
    fn test_remaining() {
        let now = Utc::now();
        let record = record(now + chrono::Duration::minutes(4));
        assert_eq!(record.remaining(now), Duration::from_secs(240));
        assert_eq!(
            record.remaining(now + chrono::Duration::minutes(5)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let output = format!("{:?}", record(Utc::now()));
        assert!(!output.contains("signature"));
        assert!(output.contains("alice"));
    }

    #[test]
    fn test_claims_flatten_extra() {
        let mut extra = Map::new();
        extra.insert("role".to_owned(), Value::from("admin"));
        let claims = TokenClaims {
            sub: "alice".to_owned(),
            iat: 1,
            exp: 2,
            jti: "x".to_owned(),
            extra,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "admin");
        let back: TokenClaims = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }
}
