use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::User;

/// Request body for signup. Missing or non-string fields become empty strings and fail validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub username: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub password: String,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        _ => String::new(),
    })
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub payload: LoginPayload,
}

#[derive(Debug, Serialize)]
pub struct LoginPayload {
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
