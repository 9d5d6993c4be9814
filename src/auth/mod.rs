use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
mod error;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;
pub mod strategy;
pub mod validation;

pub use error::AuthError;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
