use serde::{Deserialize, Serialize};

use super::{Kind, Secret, SecretKind, SecretRecord};
use crate::validation::{self, ValidationError};

/// Metadata for an opaque file. The content is stored apart from this record,
/// keyed by the record id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMetadata {
    pub filename: String,
    /// Size in bytes as declared by the uploader.
    pub size: u64,
    #[serde(default)]
    pub notes: String,
}

/// Content and declared size are fixed at upload time; only descriptive
/// fields can be patched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Kind for BinaryMetadata {
    const KIND: SecretKind = SecretKind::Binary;
    type Patch = BinaryPatch;

    fn validate(&self) -> Result<(), ValidationError> {
        validation::required("filename", &self.filename)?;
        if i64::try_from(self.size).is_err() {
            return Err(ValidationError::malformed("size", "too large"));
        }
        Ok(())
    }

    fn validate_patch(patch: &BinaryPatch) -> Result<(), ValidationError> {
        validation::required_if_present("filename", patch.filename.as_ref())
    }

    fn into_record(secret: Secret<Self>) -> SecretRecord {
        SecretRecord::Binary(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::validate_new;

    #[test]
    fn test_size_must_fit_storage() {
        let mut meta = BinaryMetadata {
            filename: "disk.img".into(),
            size: i64::MAX as u64,
            notes: String::new(),
        };
        assert!(validate_new("disk", &meta).is_ok());

        meta.size = i64::MAX as u64 + 1;
        let err = validate_new("disk", &meta).unwrap_err();
        assert_eq!(err.field(), "size");
    }
}
