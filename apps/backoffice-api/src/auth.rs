//! JWT authentication module.
//!
//! Handles session token generation and validation, and the `jwt` cookie
//! that carries the token between requests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "jwt";

/// Issues and checks session tokens for a user id.
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: i64) -> ApiResult<String>;

    /// Returns the user id the token was issued for.
    fn verify(&self, token: &str) -> ApiResult<i64>;

    /// Lifetime of an issued token in seconds.
    fn lifetime_secs(&self) -> i64;
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// HS256 token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| ApiError::unauthenticated(format!("invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

impl TokenService for JwtManager {
    fn issue(&self, user_id: i64) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("failed to generate token: {}", e)))
    }

    fn verify(&self, token: &str) -> ApiResult<i64> {
        let claims = self.validate_token(token)?;
        claims
            .sub
            .parse()
            .map_err(|_| ApiError::unauthenticated("invalid token subject"))
    }

    fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }
}

// =============================================================================
// Cookies
// =============================================================================

/// Extract the session token from a `Cookie` header value.
///
/// ## Example
/// ```rust
/// use tally_backoffice_api::auth::extract_cookie_token;
///
/// assert_eq!(extract_cookie_token("theme=dark; jwt=abc.def"), Some("abc.def"));
/// assert_eq!(extract_cookie_token("theme=dark"), None);
/// ```
pub fn extract_cookie_token(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
    })
}

/// `Set-Cookie` value carrying a fresh session token.
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that clears the session.
pub fn expired_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);

        let token = manager.issue(42).unwrap();
        assert_eq!(manager.verify(&token).unwrap(), 42);

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthenticated() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600);
        let checker = JwtManager::new("secret-b".to_string(), 3600);

        let token = issuer.issue(7).unwrap();
        let err = checker.verify(&token).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // default validation leeway is 60s
        let manager = JwtManager::new("test-secret".to_string(), -120);
        let token = manager.issue(7).unwrap();
        assert!(manager.verify(&token).is_err());
    }

    #[test]
    fn test_cookie_helpers() {
        assert_eq!(extract_cookie_token("jwt=tok"), Some("tok"));
        assert_eq!(extract_cookie_token("a=1;  jwt=tok ; b=2"), Some("tok"));
        assert_eq!(extract_cookie_token("xjwt=tok"), None);
        assert_eq!(extract_cookie_token("jwt="), None);

        let cookie = session_cookie("tok", 86400, true);
        assert!(cookie.starts_with("jwt=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = expired_cookie(false);
        assert!(cleared.starts_with("jwt=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
