use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The only algorithm this service signs with or accepts.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token algorithm is not accepted")]
    UnsupportedAlgorithm,

    #[error("token is malformed")]
    Malformed,

    #[error("token subject is not a valid user id")]
    InvalidSubject,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::UnsupportedAlgorithm
            }
            _ => TokenError::Malformed,
        }
    }
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub uid: String,
    pub email: String,
    /// Administered services derived at issue time
    pub admin_services: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Authenticated identity recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub admin_services: Vec<String>,
}

impl Principal {
    pub fn has_admin_service(&self, service: &str) -> bool {
        self.admin_services.iter().any(|s| s == service)
    }
}

/// HMAC token codec. The secret is injected once and never read from globals.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry: Duration,
}

impl JwtService {
    pub fn new(secret: &Secret<String>, token_expiry: Duration) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry,
        }
    }

    /// Issue a session token with the configured lifetime.
    pub fn issue_session_token(
        &self,
        user_id: Uuid,
        email: &str,
        admin_services: Vec<String>,
    ) -> Result<String, TokenError> {
        self.issue(user_id, email, admin_services, self.token_expiry)
    }

    /// Issue a token valid for `ttl` from now.
    pub fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        admin_services: Vec<String>,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing("token lifetime is out of range".to_string()))?;
        let claims = SessionClaims {
            uid: user_id.to_string(),
            email: email.to_string(),
            admin_services,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm and expiry, returning the decoded claims.
    pub fn decode_claims(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }

    /// Verify a token and resolve the principal it carries.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.decode_claims(token)?;
        let user_id = Uuid::parse_str(&claims.uid).map_err(|_| TokenError::InvalidSubject)?;

        Ok(Principal {
            user_id,
            email: claims.email,
            admin_services: claims.admin_services,
        })
    }

    /// Token lifetime in seconds (for client info)
    pub fn token_expiry_seconds(&self) -> i64 {
        self.token_expiry.num_seconds()
    }
}
