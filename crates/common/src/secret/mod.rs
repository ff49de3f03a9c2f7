//! Secret records.
//!
//! A record is a [`Secret<K>`]: identity and ownership shared by every kind,
//! plus the kind-specific field set `K`. Each kind implements [`Kind`], which
//! supplies its validators and how a partial update folds into stored fields.
//! Storage and transport are generic over that trait.

mod binary;
mod card;
mod credential;
mod note;

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{self, ValidationError};

pub use binary::{BinaryMetadata, BinaryPatch};
pub use card::{Card, CardPatch};
pub use credential::{Credential, CredentialPatch};
pub use note::{Note, NotePatch};

/// The authenticated user a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(Uuid);

impl Owner {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn id(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Owner {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned record identity, unique within its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretKind {
    Credential,
    Note,
    Binary,
    Card,
}

impl SecretKind {
    pub const ALL: [SecretKind; 4] = [
        SecretKind::Credential,
        SecretKind::Note,
        SecretKind::Binary,
        SecretKind::Card,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKind::Credential => "credential",
            SecretKind::Note => "note",
            SecretKind::Binary => "binary",
            SecretKind::Card => "card",
        }
    }
}

impl Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown secret kind: {0}")]
pub struct UnknownKind(String);

impl FromStr for SecretKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credential" => Ok(SecretKind::Credential),
            "note" => Ok(SecretKind::Note),
            "binary" => Ok(SecretKind::Binary),
            "card" => Ok(SecretKind::Card),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Capabilities one secret kind contributes to the generic record engine.
pub trait Kind:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: SecretKind;

    /// Partial update: `None` fields leave the stored value alone.
    type Patch: Clone
        + Debug
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Full validation for a new record's fields.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Validation of only the fields a patch actually carries.
    fn validate_patch(patch: &Self::Patch) -> Result<(), ValidationError>;

    fn into_record(secret: Secret<Self>) -> SecretRecord;
}

/// One stored secret of kind `K`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "K: Kind")]
pub struct Secret<K: Kind> {
    pub id: RecordId,
    pub owner: Owner,
    pub name: String,
    #[serde(flatten)]
    pub data: K,
}

/// Partial update for a record of kind `K`, including the shared `name`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "K: Kind")]
pub struct Patch<K: Kind> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub data: K::Patch,
}

impl<K: Kind> Default for Patch<K> {
    fn default() -> Self {
        Self {
            name: None,
            data: K::Patch::default(),
        }
    }
}

impl<K: Kind> Patch<K> {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required_if_present("name", self.name.as_ref())?;
        K::validate_patch(&self.data)
    }
}

/// Validate a new record: shared fields, then the kind's own rules.
pub fn validate_new<K: Kind>(name: &str, data: &K) -> Result<(), ValidationError> {
    validation::required("name", name)?;
    data.validate()
}

/// A record of any kind, as returned by cross-kind listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "secret", rename_all = "snake_case")]
pub enum SecretRecord {
    Credential(Secret<Credential>),
    Note(Secret<Note>),
    Binary(Secret<BinaryMetadata>),
    Card(Secret<Card>),
}

impl SecretRecord {
    pub fn kind(&self) -> SecretKind {
        match self {
            SecretRecord::Credential(_) => SecretKind::Credential,
            SecretRecord::Note(_) => SecretKind::Note,
            SecretRecord::Binary(_) => SecretKind::Binary,
            SecretRecord::Card(_) => SecretKind::Card,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            SecretRecord::Credential(s) => s.id,
            SecretRecord::Note(s) => s.id,
            SecretRecord::Binary(s) => s.id,
            SecretRecord::Card(s) => s.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SecretRecord::Credential(s) => &s.name,
            SecretRecord::Note(s) => &s.name,
            SecretRecord::Binary(s) => &s.name,
            SecretRecord::Card(s) => &s.name,
        }
    }

    pub fn owner(&self) -> Owner {
        match self {
            SecretRecord::Credential(s) => s.owner,
            SecretRecord::Note(s) => s.owner,
            SecretRecord::Binary(s) => s.owner,
            SecretRecord::Card(s) => s.owner,
        }
    }
}

/// Field set for a `Create` call. Binary secrets carry metadata only; their
/// content arrives through the upload stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecretData {
    Credential(Credential),
    Note(Note),
    Binary(BinaryMetadata),
    Card(Card),
}

impl SecretData {
    pub fn kind(&self) -> SecretKind {
        match self {
            SecretData::Credential(_) => SecretKind::Credential,
            SecretData::Note(_) => SecretKind::Note,
            SecretData::Binary(_) => SecretKind::Binary,
            SecretData::Card(_) => SecretKind::Card,
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), ValidationError> {
        match self {
            SecretData::Credential(d) => validate_new(name, d),
            SecretData::Note(d) => validate_new(name, d),
            SecretData::Binary(d) => validate_new(name, d),
            SecretData::Card(d) => validate_new(name, d),
        }
    }
}

/// A partial update for any kind. The kind travels out of band (in the
/// request path), so the body is only the patch object itself.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SecretPatch {
    Credential(Patch<Credential>),
    Note(Patch<Note>),
    Binary(Patch<BinaryMetadata>),
    Card(Patch<Card>),
}

impl SecretPatch {
    pub fn kind(&self) -> SecretKind {
        match self {
            SecretPatch::Credential(_) => SecretKind::Credential,
            SecretPatch::Note(_) => SecretKind::Note,
            SecretPatch::Binary(_) => SecretKind::Binary,
            SecretPatch::Card(_) => SecretKind::Card,
        }
    }

    /// Decode a patch body for a kind named elsewhere.
    pub fn from_value(kind: SecretKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            SecretKind::Credential => SecretPatch::Credential(serde_json::from_value(value)?),
            SecretKind::Note => SecretPatch::Note(serde_json::from_value(value)?),
            SecretKind::Binary => SecretPatch::Binary(serde_json::from_value(value)?),
            SecretKind::Card => SecretPatch::Card(serde_json::from_value(value)?),
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            SecretPatch::Credential(p) => p.validate(),
            SecretPatch::Note(p) => p.validate(),
            SecretPatch::Binary(p) => p.validate(),
            SecretPatch::Card(p) => p.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn owner() -> Owner {
        Owner::new(Uuid::nil())
    }

    #[test]
    fn test_record_wire_shape() {
        let record = SecretRecord::Note(Secret {
            id: RecordId::new(7),
            owner: owner(),
            name: "wifi".into(),
            data: Note {
                body: "hunter2".into(),
            },
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "kind": "note",
                "secret": {
                    "id": 7,
                    "owner": "00000000-0000-0000-0000-000000000000",
                    "name": "wifi",
                    "body": "hunter2",
                }
            })
        );

        let back: SecretRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.kind(), SecretKind::Note);
        assert_eq!(back.id(), RecordId::new(7));
    }

    #[test]
    fn test_secret_data_is_tagged_by_kind() {
        let data: SecretData = serde_json::from_value(json!({
            "kind": "credential",
            "login": "alice",
            "website": "example.com",
        }))
        .unwrap();
        assert_eq!(data.kind(), SecretKind::Credential);
        assert!(data.validate("mail").is_ok());
        assert_eq!(
            data.validate(""),
            Err(ValidationError::missing("name"))
        );
    }

    #[test]
    fn test_patch_from_value_keeps_absent_fields_unset() {
        let patch =
            SecretPatch::from_value(SecretKind::Card, json!({ "cvv": "999" })).unwrap();
        let SecretPatch::Card(patch) = patch else {
            panic!("expected card patch");
        };
        assert_eq!(patch.name, None);
        assert_eq!(patch.data.cvv.as_deref(), Some("999"));
        assert_eq!(patch.data.number, None);
    }

    #[test]
    fn test_patch_validation_checks_present_fields_only() {
        let patch = SecretPatch::from_value(SecretKind::Card, json!({ "cvv": "12" })).unwrap();
        assert_eq!(patch.validate().unwrap_err().field(), "cvv");

        let patch = SecretPatch::from_value(SecretKind::Credential, json!({ "name": "" })).unwrap();
        assert_eq!(patch.validate(), Err(ValidationError::missing("name")));

        let patch = SecretPatch::from_value(SecretKind::Note, json!({})).unwrap();
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in SecretKind::ALL {
            assert_eq!(kind.as_str().parse::<SecretKind>().unwrap(), kind);
        }
        assert!("folder".parse::<SecretKind>().is_err());
    }
}
