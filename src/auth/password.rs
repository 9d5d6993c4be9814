use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::PasswordConfig;

/// Argon2id hasher carrying the configured cost parameters.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self { params })
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Cost parameters are read from the stored hash, so older hashes keep verifying after a config change.
    pub fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Runs `hash` on the blocking pool.
    pub async fn hash_blocking(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    /// Runs `verify` on the blocking pool.
    pub async fn verify_blocking(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await?
    }
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("cheap argon2 params are valid")
}
