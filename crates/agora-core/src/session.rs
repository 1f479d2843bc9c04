use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};

use agora_types::api::Claims;
use agora_types::models::User;

use crate::error::{AuthError, Error, Result};

pub const DEFAULT_SESSION_DAYS: i64 = 10;

/// Issues and verifies long-lived session credentials.
pub trait SessionCodec: Send + Sync {
    fn issue(&self, user: &User) -> Result<String>;

    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 JWT sessions.
#[derive(Clone)]
pub struct JwtSessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    validity: Duration,
}

impl JwtSessions {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            validity: Duration::days(DEFAULT_SESSION_DAYS),
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user.id,
            handle: user.handle.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.validity).timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("failed to sign session: {e}")))
    }
}

impl SessionCodec for JwtSessions {
    fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}
