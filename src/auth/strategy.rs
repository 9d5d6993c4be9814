use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use super::{jwt::JwtKeys, password::PasswordHasher, validation::normalize_email, AuthError};
use crate::{
    state::AppState,
    users::{User, UserStore},
};

/// A verification procedure with a uniform success/failure contract.
#[async_trait]
pub trait Strategy {
    type Credentials: Send;
    type Output;

    async fn authenticate(&self, credentials: Self::Credentials) -> Result<Self::Output, AuthError>;
}

pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Email + password against the user store; issues a token on success.
#[derive(Clone)]
pub struct LocalStrategy {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
    hasher: PasswordHasher,
}

impl FromRef<AppState> for LocalStrategy {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.keys.clone(), state.hasher.clone())
    }
}

impl LocalStrategy {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys, hasher: PasswordHasher) -> Self {
        Self {
            users,
            keys,
            hasher,
        }
    }

    pub async fn authenticate_at(
        &self,
        credentials: LoginCredentials,
        now: OffsetDateTime,
    ) -> Result<(User, String), AuthError> {
        let email = normalize_email(&credentials.email);

        let mut user = match self.users.find_by_email(&email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::UnknownEmail);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(AuthError::Store(e));
            }
        };

        let ok = self
            .hasher
            .verify_blocking(credentials.password, user.password_hash.clone())
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user.id, "verify_password failed");
                AuthError::Store(e)
            })?;

        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::WrongPassword);
        }

        if let Err(e) = self.users.touch_last_login(user.id, now).await {
            error!(error = %e, user_id = %user.id, "touch_last_login failed");
            return Err(AuthError::Store(e));
        }
        user.last_login = Some(now);

        let token = self.keys.sign_at(user.id, now).map_err(|e| {
            error!(error = %e, user_id = %user.id, "jwt sign failed");
            AuthError::Store(e)
        })?;

        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }
}

#[async_trait]
impl Strategy for LocalStrategy {
    type Credentials = LoginCredentials;
    type Output = (User, String);

    async fn authenticate(&self, credentials: LoginCredentials) -> Result<(User, String), AuthError> {
        self.authenticate_at(credentials, OffsetDateTime::now_utc()).await
    }
}

/// Bearer token check: signature, expiry, issuer, then the subject must still exist.
#[derive(Clone)]
pub struct TokenStrategy {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for TokenStrategy {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.keys.clone())
    }
}

impl TokenStrategy {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    pub async fn authenticate_at(&self, token: &str, now: OffsetDateTime) -> Result<(), AuthError> {
        let claims = self.keys.verify_at(token, now).map_err(|e| {
            warn!(error = %e, code = e.code(), "token rejected");
            e
        })?;

        match self.users.find_by_id(claims.sub).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                Err(AuthError::UnknownSubject)
            }
            Err(e) => {
                error!(error = %e, user_id = %claims.sub, "find_by_id failed");
                Err(AuthError::Store(e))
            }
        }
    }
}

#[async_trait]
impl Strategy for TokenStrategy {
    type Credentials = String;
    type Output = ();

    async fn authenticate(&self, token: String) -> Result<(), AuthError> {
        self.authenticate_at(&token, OffsetDateTime::now_utc()).await
    }
}
