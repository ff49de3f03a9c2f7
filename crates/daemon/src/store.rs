//! The vault: one repository per kind plus the blob store, behind a
//! kind-dispatching surface the API handlers call.

use std::sync::Arc;

use common::prelude::{
    BinaryMetadata, CancelSignal, Card, Credential, Note, Owner, RecordId, SecretData, SecretKind,
    SecretPatch, SecretRecord,
};

use crate::aggregate::{self, KindSources};
use crate::blobs::BlobStore;
use crate::database::Database;
use crate::error::VaultError;
use crate::repository::{KindListing, Repository};

#[derive(Clone)]
pub struct SecretStore {
    db: Database,
    blobs: BlobStore,
    credentials: Repository<Credential>,
    notes: Repository<Note>,
    binaries: Repository<BinaryMetadata>,
    cards: Repository<Card>,
    sources: KindSources,
}

impl SecretStore {
    pub fn new(db: Database, blobs: BlobStore) -> Self {
        let credentials = Repository::new(db.clone());
        let notes = Repository::new(db.clone());
        let binaries = Repository::new(db.clone());
        let cards = Repository::new(db.clone());

        let sources: KindSources = Arc::new(vec![
            Arc::new(credentials.clone()) as Arc<dyn KindListing>,
            Arc::new(notes.clone()),
            Arc::new(binaries.clone()),
            Arc::new(cards.clone()),
        ]);

        Self {
            db,
            blobs,
            credentials,
            notes,
            binaries,
            cards,
            sources,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn binaries(&self) -> &Repository<BinaryMetadata> {
        &self.binaries
    }

    /// Create a credential, note or card. Binary records only come into
    /// being through an upload, so their content always exists.
    pub async fn create(
        &self,
        owner: &Owner,
        name: &str,
        data: &SecretData,
    ) -> Result<RecordId, VaultError> {
        match data {
            SecretData::Credential(d) => self.credentials.create(owner, name, d).await,
            SecretData::Note(d) => self.notes.create(owner, name, d).await,
            SecretData::Card(d) => self.cards.create(owner, name, d).await,
            SecretData::Binary(_) => Err(VaultError::invalid(
                "binary secrets are created by uploading their content",
            )),
        }
    }

    pub async fn get_all(
        &self,
        owner: &Owner,
        kind: SecretKind,
    ) -> Result<Vec<SecretRecord>, VaultError> {
        match kind {
            SecretKind::Credential => self.credentials.list(owner).await,
            SecretKind::Note => self.notes.list(owner).await,
            SecretKind::Binary => self.binaries.list(owner).await,
            SecretKind::Card => self.cards.list(owner).await,
        }
    }

    pub async fn update(
        &self,
        owner: &Owner,
        id: RecordId,
        patch: SecretPatch,
    ) -> Result<(), VaultError> {
        match patch {
            SecretPatch::Credential(p) => self.credentials.update(owner, id, p).await,
            SecretPatch::Note(p) => self.notes.update(owner, id, p).await,
            SecretPatch::Binary(p) => self.binaries.update(owner, id, p).await,
            SecretPatch::Card(p) => self.cards.update(owner, id, p).await,
        }
    }

    /// Removing a binary deletes its metadata first, then its content. A
    /// content removal failure is reported but the metadata stays deleted.
    pub async fn remove(
        &self,
        owner: &Owner,
        kind: SecretKind,
        id: RecordId,
    ) -> Result<(), VaultError> {
        match kind {
            SecretKind::Credential => self.credentials.remove(owner, id).await,
            SecretKind::Note => self.notes.remove(owner, id).await,
            SecretKind::Card => self.cards.remove(owner, id).await,
            SecretKind::Binary => {
                self.binaries.remove(owner, id).await?;
                if let Err(e) = self.blobs.remove(id).await {
                    tracing::error!(%owner, %id, error = %e, "metadata removed but blob removal failed");
                    return Err(e.into());
                }
                Ok(())
            }
        }
    }

    /// Every record the owner has, across all kinds.
    pub async fn list_all(
        &self,
        owner: Owner,
        cancel: CancelSignal,
    ) -> Result<Vec<SecretRecord>, VaultError> {
        aggregate::list_all(&self.sources, owner, cancel)
            .await
            .map_err(|_| VaultError::internal("listing was cancelled before all kinds answered"))
    }
}

#[cfg(test)]
mod tests {
    use common::prelude::{CredentialPatch, Secret};
    use common::secret::Patch;

    use super::*;
    use crate::error::ErrorKind;

    async fn setup() -> (SecretStore, Owner, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::in_memory().await.unwrap();
        let owner = db.insert_user("alice", "x").await.unwrap();
        let blobs = BlobStore::open(dir.path()).await.unwrap();
        (SecretStore::new(db, blobs), owner, dir)
    }

    #[tokio::test]
    async fn test_create_binary_directly_is_invalid() {
        let (store, owner, _dir) = setup().await;
        let data = SecretData::Binary(BinaryMetadata {
            filename: "a.bin".into(),
            size: 3,
            notes: String::new(),
        });
        let err = store.create(&owner, "file", &data).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn test_dispatch_by_kind() {
        let (store, owner, _dir) = setup().await;
        let id = store
            .create(
                &owner,
                "mail",
                &SecretData::Credential(Credential {
                    login: "alice".into(),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();

        let patch = SecretPatch::Credential(Patch {
            name: None,
            data: CredentialPatch {
                website: Some("mail.example".into()),
                ..Default::default()
            },
        });
        store.update(&owner, id, patch).await.unwrap();

        let records = store.get_all(&owner, SecretKind::Credential).await.unwrap();
        let SecretRecord::Credential(Secret { data, .. }) = &records[0] else {
            panic!("expected a credential");
        };
        assert_eq!(data.website, "mail.example");

        // the id belongs to the credential table, not the note table
        let err = store
            .remove(&owner, SecretKind::Note, id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        store
            .remove(&owner, SecretKind::Credential, id)
            .await
            .unwrap();
        assert!(store
            .get_all(&owner, SecretKind::Credential)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_binary_removes_blob() {
        let (store, owner, _dir) = setup().await;
        let meta = BinaryMetadata {
            filename: "a.bin".into(),
            size: 3,
            notes: String::new(),
        };
        let mut conn = store.database().acquire().await.unwrap();
        let id = store
            .binaries()
            .insert(&mut conn, &owner, "file", &meta)
            .await
            .unwrap();
        drop(conn);
        std::fs::write(store.blobs().path_for(id), b"abc").unwrap();

        store.remove(&owner, SecretKind::Binary, id).await.unwrap();
        assert!(!store.blobs().path_for(id).exists());
    }

    #[tokio::test]
    async fn test_failed_blob_removal_keeps_metadata_deleted() {
        let (store, owner, _dir) = setup().await;
        let meta = BinaryMetadata {
            filename: "a.bin".into(),
            size: 3,
            notes: String::new(),
        };
        let mut conn = store.database().acquire().await.unwrap();
        let id = store
            .binaries()
            .insert(&mut conn, &owner, "file", &meta)
            .await
            .unwrap();
        drop(conn);
        // a directory in the blob's place cannot be removed as a file
        std::fs::create_dir(store.blobs().path_for(id)).unwrap();

        let err = store
            .remove(&owner, SecretKind::Binary, id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(store
            .get_all(&owner, SecretKind::Binary)
            .await
            .unwrap()
            .is_empty());
    }
}
