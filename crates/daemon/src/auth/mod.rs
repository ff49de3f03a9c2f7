//! Identity: password hashing, token issue and verification, and the
//! register / authenticate operations.

mod middleware;

use std::sync::OnceLock;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::prelude::Owner;
use common::validation;

use crate::database::Database;
use crate::error::VaultError;

pub use middleware::{require_owner, AuthOwner};

/// Token claims. `sub` is the owner id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(secret: &[u8], token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_ttl,
        }
    }

    pub fn issue_token(&self, owner: &Owner) -> Result<String, VaultError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: owner.to_string(),
            iat: now,
            exp: now + self.token_ttl.as_secs() as i64,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| VaultError::internal(format!("token signing failed: {}", e)))
    }

    /// Missing, malformed, badly signed and expired tokens all fail the
    /// same way.
    pub fn verify_token(&self, token: &str) -> Result<Owner, VaultError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |e| {
                tracing::debug!(error = %e, "token rejected");
                VaultError::Unauthenticated
            },
        )?;
        Uuid::parse_str(&data.claims.sub)
            .map(Owner::new)
            .map_err(|_| VaultError::Unauthenticated)
    }

    /// Create an account and return a token for it.
    pub async fn register(
        &self,
        db: &Database,
        login: &str,
        password: &str,
    ) -> Result<(Owner, String), VaultError> {
        validation::required("login", login)?;
        validation::required("password", password)?;

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| VaultError::internal(format!("password hashing task failed: {}", e)))??;
        let owner = db.insert_user(login, &hash).await?;
        tracing::info!(%owner, "account registered");

        let token = self.issue_token(&owner)?;
        Ok((owner, token))
    }

    /// Check a login and password. Unknown logins and wrong passwords are
    /// indistinguishable to the caller, in result and in cost: an unknown
    /// login is still checked against a stand-in hash.
    pub async fn authenticate(
        &self,
        db: &Database,
        login: &str,
        password: &str,
    ) -> Result<Owner, VaultError> {
        let user = db.find_user_by_login(login).await?;
        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => dummy_hash().to_string(),
        };
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| VaultError::internal(format!("password check task failed: {}", e)))?;

        match user {
            Some(user) if matches => Ok(user.owner),
            Some(user) => {
                tracing::debug!(owner = %user.owner, "authentication failed: wrong password");
                Err(VaultError::Unauthenticated)
            }
            None => {
                tracing::debug!("authentication failed: unknown login");
                Err(VaultError::Unauthenticated)
            }
        }
    }

    pub async fn login(
        &self,
        db: &Database,
        login: &str,
        password: &str,
    ) -> Result<(Owner, String), VaultError> {
        let owner = self.authenticate(db, login, password).await?;
        let token = self.issue_token(&owner)?;
        Ok((owner, token))
    }
}

fn hash_password(password: &str) -> Result<String, VaultError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| VaultError::internal(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| hash_password("vault-unknown-login").unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn service() -> AuthService {
        AuthService::new(b"test-signing-key", Duration::from_secs(60))
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_dummy_hash_is_a_real_hash() {
        assert!(PasswordHash::new(dummy_hash()).is_ok());
        assert!(!verify_password("", dummy_hash()));
    }

    #[tokio::test]
    async fn test_unknown_login_still_runs_a_password_check() {
        let db = Database::in_memory().await.unwrap();
        let auth = service();
        auth.register(&db, "alice", "pw").await.unwrap();

        let err = auth
            .authenticate(&db, "mallory", "pw")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert!(DUMMY_HASH.get().is_some());
    }

    #[test]
    fn test_token_round_trip() {
        let auth = service();
        let owner = Owner::new(Uuid::new_v4());
        let token = auth.issue_token(&owner).unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), owner);
    }

    #[test]
    fn test_foreign_and_expired_tokens_rejected() {
        let auth = service();
        let owner = Owner::new(Uuid::new_v4());

        let other = AuthService::new(b"another-key", Duration::from_secs(60));
        let forged = other.issue_token(&owner).unwrap();
        assert_eq!(
            auth.verify_token(&forged).unwrap_err().kind(),
            ErrorKind::Unauthenticated
        );

        let now = chrono::Utc::now().timestamp();
        let stale = Claims {
            sub: owner.to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let stale = encode(&Header::default(), &stale, &auth.encoding_key).unwrap();
        assert_eq!(
            auth.verify_token(&stale).unwrap_err().kind(),
            ErrorKind::Unauthenticated
        );

        assert!(auth.verify_token("garbage").is_err());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let db = Database::in_memory().await.unwrap();
        let auth = service();

        let (owner, token) = auth.register(&db, "alice", "pw").await.unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), owner);

        let (again, _) = auth.login(&db, "alice", "pw").await.unwrap();
        assert_eq!(again, owner);

        let wrong_password = auth.login(&db, "alice", "nope").await.unwrap_err();
        let unknown_login = auth.login(&db, "mallory", "pw").await.unwrap_err();
        assert_eq!(wrong_password.kind(), ErrorKind::Unauthenticated);
        assert_eq!(wrong_password.to_string(), unknown_login.to_string());

        let dup = auth.register(&db, "alice", "pw2").await.unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::AlreadyExists);

        let blank = auth.register(&db, "", "pw").await.unwrap_err();
        assert_eq!(blank.kind(), ErrorKind::Invalid);
    }
}
