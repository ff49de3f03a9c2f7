use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use common::prelude::{
    BinaryMetadata, BinaryPatch, Card, CardPatch, Credential, CredentialPatch, Note, NotePatch,
};

use super::{SqlValue, StoredKind};

fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

fn opt_text(value: &Option<String>) -> Option<SqlValue> {
    value.as_deref().map(text)
}

impl StoredKind for Credential {
    const TABLE: &'static str = "credentials";
    const COLUMNS: &'static [&'static str] = &["login", "password", "website", "notes"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            text(&self.login),
            text(&self.password),
            text(&self.website),
            text(&self.notes),
        ]
    }

    fn patch_values(patch: &CredentialPatch) -> Vec<Option<SqlValue>> {
        vec![
            opt_text(&patch.login),
            opt_text(&patch.password),
            opt_text(&patch.website),
            opt_text(&patch.notes),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Credential {
            login: row.try_get("login")?,
            password: row.try_get("password")?,
            website: row.try_get("website")?,
            notes: row.try_get("notes")?,
        })
    }
}

impl StoredKind for Note {
    const TABLE: &'static str = "notes";
    const COLUMNS: &'static [&'static str] = &["body"];

    fn values(&self) -> Vec<SqlValue> {
        vec![text(&self.body)]
    }

    fn patch_values(patch: &NotePatch) -> Vec<Option<SqlValue>> {
        vec![opt_text(&patch.body)]
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Note {
            body: row.try_get("body")?,
        })
    }
}

impl StoredKind for BinaryMetadata {
    const TABLE: &'static str = "binaries";
    const COLUMNS: &'static [&'static str] = &["filename", "size", "notes"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            text(&self.filename),
            // validated to fit before any insert
            SqlValue::Integer(i64::try_from(self.size).unwrap_or(i64::MAX)),
            text(&self.notes),
        ]
    }

    // size is fixed at upload
    fn patch_values(patch: &BinaryPatch) -> Vec<Option<SqlValue>> {
        vec![opt_text(&patch.filename), None, opt_text(&patch.notes)]
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let size: i64 = row.try_get("size")?;
        Ok(BinaryMetadata {
            filename: row.try_get("filename")?,
            size: u64::try_from(size).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            notes: row.try_get("notes")?,
        })
    }
}

impl StoredKind for Card {
    const TABLE: &'static str = "cards";
    const COLUMNS: &'static [&'static str] = &["number", "expiration", "cvv", "holder", "notes"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            text(&self.number),
            text(&self.expiration),
            text(&self.cvv),
            text(&self.holder),
            text(&self.notes),
        ]
    }

    fn patch_values(patch: &CardPatch) -> Vec<Option<SqlValue>> {
        vec![
            opt_text(&patch.number),
            opt_text(&patch.expiration),
            opt_text(&patch.cvv),
            opt_text(&patch.holder),
            opt_text(&patch.notes),
        ]
    }

    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Card {
            number: row.try_get("number")?,
            expiration: row.try_get("expiration")?,
            cvv: row.try_get("cvv")?,
            holder: row.try_get("holder")?,
            notes: row.try_get("notes")?,
        })
    }
}
