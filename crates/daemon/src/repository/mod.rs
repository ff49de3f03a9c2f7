//! One record engine for every secret kind.
//!
//! [`Repository<K>`] implements create / get-all / partial update / remove
//! once. A kind plugs in through [`StoredKind`], which names its table and
//! columns and converts between its fields and SQL values. Every statement
//! is scoped by `owner_id`, so a foreign record is indistinguishable from a
//! missing one.

mod kinds;

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqliteConnection};
use uuid::Uuid;

use common::prelude::{Kind, Owner, RecordId, Secret, SecretKind, SecretRecord};
use common::secret::{self, Patch};

use crate::database::Database;
use crate::error::VaultError;

/// A column value, bound positionally.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
}

/// Storage mapping for a secret kind.
pub trait StoredKind: Kind {
    const TABLE: &'static str;

    /// Kind-specific columns, in the order [`StoredKind::values`] yields them.
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<SqlValue>;

    /// One entry per column; `None` leaves the stored value untouched.
    fn patch_values(patch: &Self::Patch) -> Vec<Option<SqlValue>>;

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Integer(v) => query.bind(v),
    }
}

fn bind_optional<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: Option<SqlValue>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Some(v) => bind_value(query, v),
        None => query.bind(None::<String>),
    }
}

fn parse_owner(raw: &str) -> Result<Owner, sqlx::Error> {
    Uuid::parse_str(raw)
        .map(Owner::new)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

pub struct Repository<K> {
    db: Database,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for Repository<K> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: StoredKind> Repository<K> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }

    pub fn kind(&self) -> SecretKind {
        K::KIND
    }

    fn select_sql(filter: &str) -> String {
        format!(
            "SELECT id, owner_id, name, {} FROM {} WHERE {} ORDER BY id",
            K::COLUMNS.join(", "),
            K::TABLE,
            filter
        )
    }

    fn secret_from_row(row: &SqliteRow) -> Result<Secret<K>, sqlx::Error> {
        let owner: String = row.try_get("owner_id")?;
        Ok(Secret {
            id: RecordId::new(row.try_get("id")?),
            owner: parse_owner(&owner)?,
            name: row.try_get("name")?,
            data: K::from_row(row)?,
        })
    }

    /// Validate and insert a new record.
    pub async fn create(&self, owner: &Owner, name: &str, data: &K) -> Result<RecordId, VaultError> {
        secret::validate_new(name, data)?;
        let mut conn = self.db.acquire().await?;
        self.insert(&mut *conn, owner, name, data).await
    }

    /// Insert without validation, on a caller-supplied connection so the
    /// insert can join a larger transaction.
    pub(crate) async fn insert(
        &self,
        conn: &mut SqliteConnection,
        owner: &Owner,
        name: &str,
        data: &K,
    ) -> Result<RecordId, VaultError> {
        let now = chrono::Utc::now().timestamp();
        let placeholders = vec!["?"; K::COLUMNS.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} (owner_id, name, {}, created_at, updated_at) VALUES (?, ?, {}, ?, ?)",
            K::TABLE,
            K::COLUMNS.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql).bind(owner.to_string()).bind(name.to_string());
        for value in data.values() {
            query = bind_value(query, value);
        }
        let result = query.bind(now).bind(now).execute(&mut *conn).await?;

        let id = RecordId::new(result.last_insert_rowid());
        tracing::debug!(kind = %K::KIND, %owner, %id, "secret created");
        Ok(id)
    }

    /// Every record owned by `owner`. Empty, not an error, when there are none.
    pub async fn get_all(&self, owner: &Owner) -> Result<Vec<Secret<K>>, VaultError> {
        let sql = Self::select_sql("owner_id = ?");
        let rows = sqlx::query(&sql)
            .bind(owner.to_string())
            .fetch_all(&*self.db)
            .await?;

        rows.iter()
            .map(|row| Self::secret_from_row(row).map_err(VaultError::from))
            .collect()
    }

    pub async fn get(&self, owner: &Owner, id: RecordId) -> Result<Secret<K>, VaultError> {
        let sql = Self::select_sql("id = ? AND owner_id = ?");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(owner.to_string())
            .fetch_optional(&*self.db)
            .await?;

        match row {
            Some(row) => Ok(Self::secret_from_row(&row)?),
            None => {
                tracing::debug!(kind = %K::KIND, %owner, %id, "lookup matched no owned record");
                Err(VaultError::NotFound)
            }
        }
    }

    /// Apply only the fields present in `patch`, in a single statement.
    pub async fn update(&self, owner: &Owner, id: RecordId, patch: Patch<K>) -> Result<(), VaultError> {
        patch.validate()?;

        let assignments = K::COLUMNS
            .iter()
            .map(|col| format!("{col} = COALESCE(?, {col})"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET name = COALESCE(?, name), {}, updated_at = ? WHERE id = ? AND owner_id = ?",
            K::TABLE,
            assignments
        );

        let mut query = sqlx::query(&sql).bind(patch.name.clone());
        for value in K::patch_values(&patch.data) {
            query = bind_optional(query, value);
        }
        let result = query
            .bind(chrono::Utc::now().timestamp())
            .bind(id.get())
            .bind(owner.to_string())
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(kind = %K::KIND, %owner, %id, "update matched no owned record");
            return Err(VaultError::NotFound);
        }
        tracing::debug!(kind = %K::KIND, %owner, %id, "secret updated");
        Ok(())
    }

    /// Ownership is checked by the delete itself, not by an earlier read.
    pub async fn remove(&self, owner: &Owner, id: RecordId) -> Result<(), VaultError> {
        let sql = format!("DELETE FROM {} WHERE id = ? AND owner_id = ?", K::TABLE);
        let result = sqlx::query(&sql)
            .bind(id.get())
            .bind(owner.to_string())
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(kind = %K::KIND, %owner, %id, "remove matched no owned record");
            return Err(VaultError::NotFound);
        }
        tracing::debug!(kind = %K::KIND, %owner, %id, "secret removed");
        Ok(())
    }
}

/// The per-kind GetAll used by aggregation.
#[async_trait]
pub trait KindListing: Send + Sync {
    fn kind(&self) -> SecretKind;

    async fn list(&self, owner: &Owner) -> Result<Vec<SecretRecord>, VaultError>;
}

#[async_trait]
impl<K: StoredKind> KindListing for Repository<K> {
    fn kind(&self) -> SecretKind {
        K::KIND
    }

    async fn list(&self, owner: &Owner) -> Result<Vec<SecretRecord>, VaultError> {
        Ok(self
            .get_all(owner)
            .await?
            .into_iter()
            .map(K::into_record)
            .collect())
    }
}
