use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::identity::UserId;

#[derive(Debug, Error)]
pub(crate) enum IdentityError {
    #[error("token decode/validation failed")]
    Decode(#[source] jsonwebtoken::errors::Error),

    #[error("token carries no subject")]
    MissingSubject,
}

/// Resolves a bearer credential into a caller identity.
pub(crate) trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, IdentityError>;
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) aud: Option<String>,
}

/// HS256 ID tokens; the `sub` claim is the caller identity.
pub(crate) struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    const LEEWAY_SECONDS: u64 = 10;

    pub(crate) fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = Self::LEEWAY_SECONDS;
        let mut required = vec!["exp", "sub"];
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        // jsonwebtoken only checks iss/aud when present unless they are required.
        validation.set_required_spec_claims(&required[..]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<UserId, IdentityError> {
        let token_data =
            decode::<Claims>(token, &self.key, &self.validation).map_err(IdentityError::Decode)?;
        UserId::new(token_data.claims.sub).map_err(|_| IdentityError::MissingSubject)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    use super::{Claims, IdentityError, IdentityVerifier, JwtIdentityVerifier};

    pub(crate) const TEST_SECRET: &str = "test-secret-that-is-at-least-32-characters";

    pub(crate) fn issue_token(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token must encode")
    }

    pub(crate) fn claims_for(sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iss: None,
            aud: None,
        }
    }

    #[test]
    fn verify_returns_subject_as_identity() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET, None, None);
        let token = issue_token(TEST_SECRET, &claims_for("firebase-uid-1"));

        let identity = verifier.verify(&token).expect("token must verify");
        assert_eq!(identity.as_str(), "firebase-uid-1");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET, None, None);
        let token = issue_token("another-secret-that-is-also-long-enough", &claims_for("u"));

        assert!(matches!(verifier.verify(&token), Err(IdentityError::Decode(_))));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET, None, None);
        let mut claims = claims_for("u");
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();

        assert!(verifier.verify(&issue_token(TEST_SECRET, &claims)).is_err());
    }

    #[test]
    fn verify_rejects_blank_subject() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET, None, None);
        let token = issue_token(TEST_SECRET, &claims_for("  "));

        assert!(matches!(
            verifier.verify(&token),
            Err(IdentityError::MissingSubject)
        ));
    }

    #[test]
    fn verify_checks_issuer_and_audience_when_configured() {
        let verifier =
            JwtIdentityVerifier::new(TEST_SECRET, Some("bollocks-auth"), Some("api.bollocks.social"));

        let mut claims = claims_for("u");
        assert!(matches!(
            verifier.verify(&issue_token(TEST_SECRET, &claims)),
            Err(IdentityError::Decode(_))
        ));

        claims.iss = Some("bollocks-auth".to_string());
        claims.aud = Some("api.bollocks.social".to_string());
        let identity = verifier
            .verify(&issue_token(TEST_SECRET, &claims))
            .expect("token must verify");
        assert_eq!(identity.as_str(), "u");
    }

    #[test]
    fn verify_requires_issuer_claim_when_configured() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET, Some("bollocks-auth"), None);

        let mut claims = claims_for("intruder");
        assert!(verifier.verify(&issue_token(TEST_SECRET, &claims)).is_err());

        claims.iss = Some("someone-else".to_string());
        assert!(verifier.verify(&issue_token(TEST_SECRET, &claims)).is_err());

        claims.iss = Some("bollocks-auth".to_string());
        assert!(verifier.verify(&issue_token(TEST_SECRET, &claims)).is_ok());
    }

    #[test]
    fn verify_requires_audience_claim_when_configured() {
        let verifier = JwtIdentityVerifier::new(TEST_SECRET, None, Some("api.bollocks.social"));

        let mut claims = claims_for("intruder");
        assert!(verifier.verify(&issue_token(TEST_SECRET, &claims)).is_err());

        claims.aud = Some("api.bollocks.social".to_string());
        assert!(verifier.verify(&issue_token(TEST_SECRET, &claims)).is_ok());
    }
}
