use serde::{Deserialize, Serialize};

use super::{Kind, Secret, SecretKind, SecretRecord};
use crate::validation::{self, ValidationError};

/// A login for some website or service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Kind for Credential {
    const KIND: SecretKind = SecretKind::Credential;
    type Patch = CredentialPatch;

    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("login", &self.login)
    }

    fn validate_patch(patch: &CredentialPatch) -> Result<(), ValidationError> {
        validation::required_if_present("login", patch.login.as_ref())
    }

    fn into_record(secret: Secret<Self>) -> SecretRecord {
        SecretRecord::Credential(secret)
    }
}
