use tracing::{error, info, warn};

use super::validation::validate_signup;
use crate::{
    error::{ApiError, ServerCode},
    state::AppState,
    users::NewUser,
};

/// Validates, rejects duplicate emails, hashes and inserts. Returns the greeting for the client.
pub async fn signup(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> Result<String, ApiError> {
    let input = validate_signup(username, email, password).map_err(|errors| {
        warn!(count = errors.len(), "signup validation failed");
        ApiError::Validation(errors)
    })?;

    match state.users.find_by_email(&input.email).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            warn!(email = %input.email, "email already registered");
            return Err(ApiError::DuplicateUser);
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(ApiError::Server(ServerCode::UserLookup));
        }
    }

    let password_hash = state
        .hasher
        .hash_blocking(input.password)
        .await
        .map_err(|e| {
            error!(error = %e, "hash_password failed");
            ApiError::Server(ServerCode::UserInsert)
        })?;

    let user = state
        .users
        .insert(NewUser {
            username: input.username,
            email: input.email,
            password_hash,
        })
        .await
        .map_err(|e| {
            error!(error = %e, "create user failed");
            ApiError::Server(ServerCode::UserInsert)
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(format!("Thank you, {} you can now login.", user.username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{store::MemoryUserStore, UserStore};
    use std::sync::Arc;

    fn state() -> (AppState, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        (AppState::fake_with(store.clone()), store)
    }

    #[tokio::test]
    async fn creates_exactly_one_record_with_hashed_password() {
        let (state, store) = state();
        let msg = signup(&state, "ann", "ann@x.com", "secret1").await.unwrap();
        assert_eq!(msg, "Thank you, ann you can now login.");
        assert_eq!(store.len(), 1);

        let user = store.find_by_email("ann@x.com").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(state.hasher.verify("secret1", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_insert() {
        let (state, store) = state();
        signup(&state, "ann", "ann@x.com", "secret1").await.unwrap();

        let err = signup(&state, "ann2", "ANN@x.com", "secret2").await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateUser));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn validation_failure_touches_nothing() {
        let (state, store) = state();
        store.fail_on("find_by_email");
        let err = signup(&state, "ann", "ann@x.com", "12345").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref e) if e.len() == 1));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn lookup_and_insert_failures_have_distinct_codes() {
        let (state, store) = state();
        store.fail_on("find_by_email");
        let err = signup(&state, "ann", "ann@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, ApiError::Server(ServerCode::UserLookup)));

        let (state, store) = self::state();
        store.fail_on("insert");
        let err = signup(&state, "ann", "ann@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, ApiError::Server(ServerCode::UserInsert)));
        assert_eq!(store.len(), 0);
    }
}
