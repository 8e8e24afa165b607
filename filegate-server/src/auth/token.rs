use std::fmt;
use std::time::Duration;

use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, get_current_timestamp,
};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// The claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: u64,
}

/// Issues and verifies signed, time-limited session tokens.
///
/// Tokens are self-contained: validity is determined entirely by the
/// signature and the embedded expiry at verification time. No session
/// state exists server-side and none is consulted.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

impl TokenService {
    /// Creates a token service signing with the given secret.
    pub fn new(secret: &str, validity: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity,
        }
    }

    /// Issues a token asserting the given subject, expiring after the
    /// configured validity.
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_owned(),
            exp: get_current_timestamp() + self.validity.as_secs(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verifies a token's signature and expiry, returning its subject.
    ///
    /// Malformed and expired tokens fail alike; callers cannot
    /// distinguish the two.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims.sub)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("the-test-secret", Duration::from_secs(2 * 60 * 60))
    }

    #[test]
    fn issues_and_validates_tokens() {
        let service = service();

        let token = service.issue("a@b.com").unwrap();
        let subject = service.verify(&token).unwrap();

        assert_eq!(subject, "a@b.com");
    }

    #[test]
    fn rejects_expired_tokens() {
        let claims = serde_json::json!({
            "sub": "a@b.com",
            "exp": get_current_timestamp() - 100,
        });

        let header = Header::default();
        let key = EncodingKey::from_secret(b"the-test-secret");
        let token = encode(&header, &claims, &key).unwrap();

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let other = TokenService::new("a-different-secret", Duration::from_secs(60));
        let token = other.issue("a@b.com").unwrap();

        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert!(service().verify("not.a.token").is_err());
        assert!(service().verify("").is_err());
    }
}
