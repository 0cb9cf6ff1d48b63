//! JWT bearer token handling
//!
//! Tokens are issued by the identity service; this crate only verifies them.
//! `create_access_token` exists for local tooling and tests.

use crate::config::JwtConfig;
use crate::domain::ClientType;
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Claims of a Secrets Manager access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user or service account ID)
    pub sub: String,
    pub iss: String,
    /// Kind of caller; absent means a user
    #[serde(default)]
    pub client_type: ClientType,
    pub iat: i64,
    pub exp: i64,
}

/// JWT token manager
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

    /// Leeway of 5 seconds instead of the library default of 60.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.set_issuer(&[&self.config.issuer]);
        v
    }

    pub fn create_access_token(&self, subject: Uuid, client_type: ClientType) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ACCESS_TOKEN_TTL_SECS);

        let claims = AccessClaims {
            sub: subject.to_string(),
            iss: self.config.issuer.clone(),
            client_type,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.strict_validation())
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;
        Ok(token_data.claims)
    }
}
