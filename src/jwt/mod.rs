//! Bearer token signing and verification

use crate::config::JwtConfig;
use crate::domain::StringUuid;
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const AUDIENCE: &str = "itinera-api";

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Id of the `personal_access_tokens` row backing this token
    pub sid: String,
    pub email: String,
    pub name: String,
    pub iss: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<StringUuid> {
        StringUuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))
    }

    pub fn token_id(&self) -> Result<StringUuid> {
        StringUuid::parse_str(&self.sid)
            .map_err(|_| AppError::Unauthorized("Malformed token id".to_string()))
    }
}

/// HS256 token manager
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Validation with a 5 second leeway instead of the default 60.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.set_audience(&[AUDIENCE]);
        v.set_issuer(&[&self.config.issuer]);
        v
    }

    /// Sign an access token bound to a stored token row
    pub fn create_access_token(
        &self,
        user_id: StringUuid,
        token_id: StringUuid,
        email: &str,
        name: &str,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.access_token_ttl_secs);

        let claims = AccessClaims {
            sub: user_id.to_string(),
            sid: token_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            iss: self.config.issuer.clone(),
            aud: AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Verify signature, issuer, audience and expiry
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.strict_validation())?;
        Ok(token_data.claims)
    }

    pub fn access_token_ttl(&self) -> i64 {
        self.config.access_token_ttl_secs
    }
}
