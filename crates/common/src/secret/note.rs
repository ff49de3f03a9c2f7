use serde::{Deserialize, Serialize};

use super::{Kind, Secret, SecretKind, SecretRecord};
use crate::validation::ValidationError;

/// Free-form text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub body: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Kind for Note {
    const KIND: SecretKind = SecretKind::Note;
    type Patch = NotePatch;

    // an empty body is a legitimate note
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn validate_patch(_patch: &NotePatch) -> Result<(), ValidationError> {
        Ok(())
    }

    fn into_record(secret: Secret<Self>) -> SecretRecord {
        SecretRecord::Note(secret)
    }
}
