use crate::error::AppResult;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Claims the client cares about. The backend verifies signatures; the client
/// only reads expiry to avoid sending a token it already knows is dead.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

pub fn peek_claims(token: &str) -> AppResult<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

/// Opaque (non-JWT) tokens are never considered expired locally.
pub fn is_token_expired(token: &str, now: DateTime<Utc>) -> bool {
    match peek_claims(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => exp <= now.timestamp(),
        Ok(_) => false,
        Err(e) => {
            log::debug!("Session token is not a readable JWT: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_with_exp(exp: i64) -> String {
        let claims = TokenClaims {
            exp: Some(exp),
            role: Some("admin".to_string()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"backend-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_peek_claims_without_secret() {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        let claims = peek_claims(&token_with_exp(exp)).unwrap();
        assert_eq!(claims.exp, Some(exp));
        assert_eq!(claims.role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let live = token_with_exp((now + Duration::minutes(5)).timestamp());
        let dead = token_with_exp((now - Duration::minutes(5)).timestamp());
        assert!(!is_token_expired(&live, now));
        assert!(is_token_expired(&dead, now));
        assert!(!is_token_expired("opaque-session-id", now));
    }
}
