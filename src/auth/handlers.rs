use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoginPayload, LoginRequest, LoginResponse, SignupRequest, SignupResponse,
            ValidateResponse,
        },
        extractors::{BearerToken, JsonOrForm},
        services,
        strategy::{LocalStrategy, LoginCredentials, Strategy, TokenStrategy},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/validate", get(validate))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    JsonOrForm(payload): JsonOrForm<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let msg = services::signup(&state, &payload.username, &payload.email, &payload.password).await?;
    Ok(Json(SignupResponse { success: true, msg }))
}

#[instrument(skip(strategy, payload))]
pub async fn login(
    State(strategy): State<LocalStrategy>,
    JsonOrForm(payload): JsonOrForm<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user, token) = strategy
        .authenticate(LoginCredentials {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        payload: LoginPayload {
            user: user.into(),
            token,
        },
    }))
}

#[instrument(skip(strategy, token))]
pub async fn validate(
    State(strategy): State<TokenStrategy>,
    BearerToken(token): BearerToken,
) -> Result<Json<ValidateResponse>, ApiError> {
    strategy.authenticate(token).await?;
    Ok(Json(ValidateResponse { success: true }))
}
