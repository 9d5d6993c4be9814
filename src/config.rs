use anyhow::Context;
use serde::Deserialize;

/// Upper bound for `JWT_TTL_DAYS`, ten years.
pub const MAX_TTL_DAYS: i64 = 3650;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_days: i64,
}

/// Argon2 cost parameters used when hashing new passwords.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let defaults = PasswordConfig::default();
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "authd".into()),
            ttl_days: parse_or(&lookup, "JWT_TTL_DAYS", 30)?,
        };
        if !(1..=MAX_TTL_DAYS).contains(&jwt.ttl_days) {
            anyhow::bail!(
                "JWT_TTL_DAYS must be between 1 and {MAX_TTL_DAYS}, got {}",
                jwt.ttl_days
            );
        }
        let password = PasswordConfig {
            memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "PASSWORD_HASH_PARALLELISM", defaults.parallelism)?,
        };
        Ok(Self {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "SERVER_PORT", 4001)?,
            jwt,
            password,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults_for_optional_values() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/authd"),
            ("JWT_SECRET", "shh"),
        ]))
        .expect("config should parse");

        assert_eq!(cfg.port, 4001);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.database_max_connections, 10);
        assert_eq!(cfg.jwt.issuer, "authd");
        assert_eq!(cfg.jwt.ttl_days, 30);
        assert_eq!(cfg.password.memory_kib, argon2::Params::DEFAULT_M_COST);
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db/authd"),
            ("JWT_SECRET", "shh"),
            ("JWT_ISSUER", "accounts.example"),
            ("JWT_TTL_DAYS", "7"),
            ("SERVER_PORT", "9000"),
            ("PASSWORD_HASH_ITERATIONS", "3"),
        ]))
        .expect("config should parse");

        assert_eq!(cfg.jwt.issuer, "accounts.example");
        assert_eq!(cfg.jwt.ttl_days, 7);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.password.iterations, 3);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://db")]))
            .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn rejects_out_of_range_token_lifetime() {
        for ttl in ["0", "-5", "3651", "9223372036854775807"] {
            let err = AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://db"),
                ("JWT_SECRET", "shh"),
                ("JWT_TTL_DAYS", ttl),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_DAYS"), "ttl {ttl}: {err}");
        }

        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "shh"),
            ("JWT_TTL_DAYS", "3650"),
        ]))
        .expect("upper bound is accepted");
        assert_eq!(cfg.jwt.ttl_days, MAX_TTL_DAYS);
    }

    #[test]
    fn rejects_unparseable_port() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "shh"),
            ("SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}
