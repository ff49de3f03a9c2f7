use sqlx::Row;
use uuid::Uuid;

use common::prelude::Owner;

use super::Database;
use crate::error::VaultError;

/// An account as stored.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub owner: Owner,
    pub login: String,
    pub password_hash: String,
}

impl Database {
    pub async fn insert_user(&self, login: &str, password_hash: &str) -> Result<Owner, VaultError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO users (id, login, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(login)
        .bind(password_hash)
        .bind(now)
        .execute(&**self)
        .await
        .map_err(|e| match VaultError::from(e) {
            VaultError::AlreadyExists(_) => VaultError::AlreadyExists(format!("login {}", login)),
            other => other,
        })?;

        Ok(Owner::new(id))
    }

    pub async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRow>, VaultError> {
        let row = sqlx::query("SELECT id, login, password_hash FROM users WHERE login = ?")
            .bind(login)
            .fetch_optional(&**self)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: String = row.get("id");
        let id = Uuid::parse_str(&id)
            .map_err(|e| VaultError::internal(format!("corrupt user id {}: {}", id, e)))?;

        Ok(Some(UserRow {
            owner: Owner::new(id),
            login: row.get("login"),
            password_hash: row.get("password_hash"),
        }))
    }
}
