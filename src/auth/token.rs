use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use super::IdentityClaims;
use crate::error::VerifyError;

/// TokenPayload
///
/// The JWT body. `sub` is the numeric user id and `role` the authority string
/// recorded on the user at issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub sub: i64,
    pub role: String,
    /// Issued-at, seconds since the epoch.
    pub iat: u64,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

/// TokenService
///
/// Issues and verifies HS256 tokens with a secret supplied at construction.
/// Cloning is cheap; the keys are shared.
#[derive(Clone)]
pub struct TokenService {
    inner: Arc<Keys>,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` so that `now == exp` counts as expired.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            inner: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                validation,
                ttl,
            }),
        }
    }

    pub fn issue(&self, claims: &IdentityClaims) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(claims, SystemTime::now())
    }

    /// Signs `claims` as if issued at `now`. The same inputs always give the same token.
    pub fn issue_at(
        &self,
        claims: &IdentityClaims,
        now: SystemTime,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = unix_seconds(now);
        let payload = TokenPayload {
            sub: claims.subject_id,
            role: claims.role.clone(),
            iat,
            exp: iat.saturating_add(self.inner.ttl.as_secs()),
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.inner.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, VerifyError> {
        self.verify_at(token, SystemTime::now())
    }

    /// Checks the signature, then the expiry against `now`.
    ///
    /// Any decode failure other than a signature mismatch is reported as `Malformed`.
    pub fn verify_at(&self, token: &str, now: SystemTime) -> Result<IdentityClaims, VerifyError> {
        let data = decode::<TokenPayload>(token, &self.inner.decoding, &self.inner.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerifyError::InvalidSignature,
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                _ => VerifyError::Malformed,
            })?;

        let payload = data.claims;
        if unix_seconds(now) >= payload.exp {
            return Err(VerifyError::Expired);
        }

        Ok(IdentityClaims {
            subject_id: payload.sub,
            role: payload.role,
        })
    }
}

fn unix_seconds(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"token-service-test-secret";
    const TTL: Duration = Duration::from_secs(10_800);

    fn service() -> TokenService {
        TokenService::new(SECRET, TTL)
    }

    #[test]
    fn issued_token_verifies_to_same_claims() {
        let claims = IdentityClaims::new(42, "user");
        let token = service().issue(&claims).unwrap();

        assert_eq!(service().verify(&token).unwrap(), claims);
    }

    #[test]
    fn repeated_verification_is_stable() {
        let tokens = service();
        let claims = IdentityClaims::new(7, "admin");
        let token = tokens.issue(&claims).unwrap();

        let first = tokens.verify(&token).unwrap();
        let second = tokens.verify(&token).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, claims);
    }

    #[test]
    fn issuance_is_deterministic_for_a_fixed_clock() {
        let claims = IdentityClaims::new(3, "user");
        let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        assert_eq!(
            service().issue_at(&claims, at).unwrap(),
            service().issue_at(&claims, at).unwrap()
        );
    }

    #[test]
    fn token_expires_exactly_at_the_boundary() {
        let tokens = service();
        let issued = SystemTime::now() - Duration::from_secs(60);
        let token = tokens.issue_at(&IdentityClaims::new(1, "user"), issued).unwrap();

        let just_before = issued + TTL - Duration::from_secs(1);
        assert!(tokens.verify_at(&token, just_before).is_ok());

        let boundary = issued + TTL;
        assert_eq!(tokens.verify_at(&token, boundary), Err(VerifyError::Expired));

        let after = issued + TTL + Duration::from_secs(3600);
        assert_eq!(tokens.verify_at(&token, after), Err(VerifyError::Expired));
    }

    #[test]
    fn old_token_is_expired_now() {
        let tokens = service();
        let issued = SystemTime::now() - TTL - Duration::from_secs(5);
        let token = tokens.issue_at(&IdentityClaims::new(1, "user"), issued).unwrap();

        assert_eq!(tokens.verify(&token), Err(VerifyError::Expired));
    }

    #[test]
    fn other_secret_is_an_invalid_signature() {
        let token = service().issue(&IdentityClaims::new(1, "user")).unwrap();
        let other = TokenService::new(b"some-other-secret", TTL);

        assert_eq!(other.verify(&token), Err(VerifyError::InvalidSignature));
    }

    #[test]
    fn tampering_with_any_segment_is_rejected() {
        let tokens = service();
        let token = tokens.issue(&IdentityClaims::new(9, "user")).unwrap();
        let payload_start = token.find('.').unwrap() + 1;
        let payload_end = token.rfind('.').unwrap();

        for index in payload_start..payload_end - 1 {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            if tampered == token {
                continue;
            }
            assert!(
                tokens.verify(&tampered).is_err(),
                "tampered byte {index} was accepted"
            );
        }
    }

    #[test]
    fn escalated_role_with_original_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue(&IdentityClaims::new(9, "user")).unwrap();
        let mut segments: Vec<&str> = token.split('.').collect();
        let forged = tokens.issue(&IdentityClaims::new(9, "admin")).unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        segments[1] = forged_payload.as_str();

        assert_eq!(
            tokens.verify(&segments.join(".")),
            Err(VerifyError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(service().verify("not-a-token"), Err(VerifyError::Malformed));
        assert_eq!(service().verify(""), Err(VerifyError::Malformed));
    }
}
