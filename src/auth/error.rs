use thiserror::Error;

/// Why a strategy refused to authenticate.
#[derive(Debug, Error)]
pub enum AuthError {
    // Unknown email and wrong password share one message and code.
    #[error("Invalid email and password combo.")]
    UnknownEmail,

    #[error("Invalid email and password combo.")]
    WrongPassword,

    #[error("No bearer token provided.")]
    MissingToken,

    #[error("Invalid token, please login again.")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Token expired, please login in again.")]
    TokenExpired,

    #[error("Token was not issued by this server, please login again.")]
    IssuerMismatch,

    #[error("Unable to auth user.")]
    UnknownSubject,

    #[error("Unable to auth user.")]
    Store(#[source] anyhow::Error),
}

impl AuthError {
    /// Stable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownEmail | Self::WrongPassword => "invalid_credentials",
            Self::MissingToken => "missing_token",
            Self::InvalidToken(_) => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::IssuerMismatch => "issuer_mismatch",
            Self::UnknownSubject => "unknown_user",
            Self::Store(_) => "auth_unavailable",
        }
    }
}
