use serde::{Deserialize, Serialize};

use super::{Kind, Secret, SecretKind, SecretRecord};
use crate::validation::{self, ValidationError};

/// A payment card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub number: String,
    /// `MM/YY`
    pub expiration: String,
    pub cvv: String,
    pub holder: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Kind for Card {
    const KIND: SecretKind = SecretKind::Card;
    type Patch = CardPatch;

    fn validate(&self) -> Result<(), ValidationError> {
        validation::card_number("number", &self.number)?;
        validation::expiration("expiration", &self.expiration)?;
        validation::cvv("cvv", &self.cvv)?;
        validation::required("holder", &self.holder)
    }

    fn validate_patch(patch: &CardPatch) -> Result<(), ValidationError> {
        if let Some(number) = &patch.number {
            validation::card_number("number", number)?;
        }
        if let Some(expiration) = &patch.expiration {
            validation::expiration("expiration", expiration)?;
        }
        if let Some(cvv) = &patch.cvv {
            validation::cvv("cvv", cvv)?;
        }
        validation::required_if_present("holder", patch.holder.as_ref())
    }

    fn into_record(secret: Secret<Self>) -> SecretRecord {
        SecretRecord::Card(secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::{validate_new, Patch};

    fn card() -> Card {
        Card {
            number: "4111111111111111".into(),
            expiration: "09/27".into(),
            cvv: "123".into(),
            holder: "Ada Lovelace".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_valid_card() {
        assert!(validate_new("visa", &card()).is_ok());
    }

    #[test]
    fn test_short_cvv_rejected() {
        let mut c = card();
        c.cvv = "12".into();
        let err = validate_new("visa", &c).unwrap_err();
        assert_eq!(err.field(), "cvv");
    }

    #[test]
    fn test_nonsense_month_accepted() {
        let mut c = card();
        c.expiration = "13/99".into();
        assert!(validate_new("visa", &c).is_ok());
    }

    #[test]
    fn test_missing_name_rejected() {
        let err = validate_new("", &card()).unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn test_patch_only_checks_present_fields() {
        let patch = Patch::<Card> {
            name: None,
            data: CardPatch {
                notes: Some("backup card".into()),
                ..Default::default()
            },
        };
        assert!(patch.validate().is_ok());

        let bad = Patch::<Card> {
            name: None,
            data: CardPatch {
                cvv: Some("1".into()),
                ..Default::default()
            },
        };
        assert!(bad.validate().is_err());
    }
}
