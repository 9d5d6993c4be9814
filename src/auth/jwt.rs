use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::{claims::Claims, AuthError};
use crate::config::JwtConfig;

/// HS256 signing and verification keys plus the issuer policy.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            ttl: Duration::seconds(cfg.ttl_days.saturating_mul(86_400)),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Signs a token for `user_id` issued at `now`, expiring `ttl` later.
    pub fn sign_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now
            .checked_add(self.ttl)
            .context("token expiry is out of range")?;
        let claims = Claims {
            sub: user_id,
            iss: self.issuer.clone(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    /// Checks the signature only; expiry and issuer are judged by `check_at`.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(AuthError::InvalidToken)?;
        Ok(data.claims)
    }

    /// Expiry wins over issuer: an expired foreign token reports as expired.
    pub fn check_at(&self, claims: &Claims, now: OffsetDateTime) -> Result<(), AuthError> {
        if now.unix_timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        if claims.iss != self.issuer {
            return Err(AuthError::IssuerMismatch);
        }
        debug!(user_id = %claims.sub, "jwt verified");
        Ok(())
    }

    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        self.check_at(&claims, now)?;
        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) fn test_keys(secret: &str, issuer: &str) -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: secret.into(),
        issuer: issuer.into(),
        ttl_days: 30,
    })
}
