//! Access token codec.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret. Verification
//! needs nothing but the secret and the clock, so any instance of any service
//! can accept a token without touching shared state. Rotating the secret
//! invalidates every outstanding token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use domain::UserRole;

use crate::config::TokenConfig;
use crate::error::{AppError, AppResult};

/// Intended use of a token. A token minted for one use never verifies for
/// the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub role: UserRole,
    /// Session the token was minted for
    pub sid: Uuid,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Who a token is issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: UserRole,
    pub session_id: Uuid,
}

/// Verification and signing failures.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token could not be decoded")]
    Malformed,

    #[error("token type {found:?} does not match expected {expected:?}")]
    WrongType { expected: TokenType, found: TokenType },

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature | TokenError::WrongType { .. } => AppError::InvalidToken,
            TokenError::Expired => AppError::Expired,
            TokenError::Malformed => AppError::Malformed,
            TokenError::Signing(msg) => AppError::Internal(msg),
        }
    }
}

/// Anything that can turn a bearer string into trusted claims.
pub trait AccessVerifier: Send + Sync {
    fn verify_access(&self, token: &str) -> AppResult<Claims>;
}

/// Stateless signer/verifier.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from raw secret bytes.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.secret_bytes())
    }

    /// Sign a token valid for `lifetime` from now.
    pub fn issue(
        &self,
        identity: Identity,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(identity, token_type, lifetime, Utc::now())
    }

    /// Sign a token as if issued at `now`.
    pub fn issue_at(
        &self,
        identity: Identity,
        token_type: TokenType,
        lifetime: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: identity.user_id,
            role: identity.role,
            sid: identity.session_id,
            typ: token_type,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, expiry and intended use.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })?;

        // jsonwebtoken still accepts a token in its final second
        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        if claims.typ != expected {
            return Err(TokenError::WrongType {
                expected,
                found: claims.typ,
            });
        }

        Ok(claims)
    }
}

impl AccessVerifier for TokenCodec {
    fn verify_access(&self, token: &str) -> AppResult<Claims> {
        Ok(self.verify(token, TokenType::Access)?)
    }
}
