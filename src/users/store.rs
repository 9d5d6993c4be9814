use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{NewUser, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn insert(&self, user: NewUser) -> anyhow::Result<User>;
    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()>;
}

/// PostgreSQL-backed store over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, last_login, created_at
            FROM users
            WHERE email = $1
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("select user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, last_login, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("select user by id")?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, last_login, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE users SET last_login = $2 WHERE id = $1"#)
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await
            .context("update last_login")?;
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryUserStore;

#[cfg(test)]
mod memory {
    use std::sync::Mutex;

    use super::*;

    /// In-process store used by unit and route tests.
    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<Vec<User>>,
        fail: Mutex<Option<&'static str>>,
    }

    impl MemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every subsequent call to `op` fail.
        pub fn fail_on(&self, op: &'static str) {
            *self.fail.lock().unwrap() = Some(op);
        }

        pub fn len(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub fn get(&self, id: Uuid) -> Option<User> {
            self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
        }

        fn check(&self, op: &'static str) -> anyhow::Result<()> {
            if *self.fail.lock().unwrap() == Some(op) {
                anyhow::bail!("{op}: store unavailable");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            self.check("find_by_email")?;
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
            self.check("find_by_id")?;
            Ok(self.get(id))
        }

        async fn insert(&self, user: NewUser) -> anyhow::Result<User> {
            self.check("insert")?;
            let user = User {
                id: Uuid::new_v4(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                last_login: None,
                created_at: OffsetDateTime::now_utc(),
            };
            self.users.lock().unwrap().push(user.clone());
            Ok(user)
        }

        async fn touch_last_login(&self, id: Uuid, at: OffsetDateTime) -> anyhow::Result<()> {
            self.check("touch_last_login")?;
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.iter_mut().find(|u| u.id == id) {
                user.last_login = Some(at);
            }
            Ok(())
        }
    }
}
