mod support;

use common::prelude::{CancelSignal, RecordId, SecretKind, SecretRecord, CHUNK_SIZE};
use vault_daemon::http_server::api::v0::secrets::{ListKindRequest, RemoveRequest};
use vault_daemon::ErrorKind;

use support::vault;

fn content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_round_trip_across_chunk_boundaries() {
    let vault = vault().await;
    let remote = vault.serve().await;
    let client = vault.client_for(&remote, "alice").await;
    let dir = tempfile::tempdir().unwrap();

    for len in [0usize, 10, CHUNK_SIZE, 200_000] {
        let source = dir.path().join(format!("source-{}.bin", len));
        let data = content(len);
        std::fs::write(&source, &data).unwrap();

        let id = client
            .upload_file(&source, &format!("file {}", len), "", CancelSignal::never())
            .await
            .unwrap();

        let dest = dir.path().join(format!("dest-{}.bin", len));
        let summary = client
            .download_file(id, &dest, CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), data, "content for {} bytes", len);
        assert_eq!(summary.bytes, len as u64);
        assert_eq!(summary.chunks, len.div_ceil(CHUNK_SIZE) as u64);
    }

    let binaries = client
        .call(ListKindRequest {
            kind: SecretKind::Binary,
        })
        .await
        .unwrap()
        .secrets;
    assert_eq!(binaries.len(), 4);
    for record in binaries {
        let SecretRecord::Binary(secret) = record else {
            panic!("expected binary records");
        };
        let expected: u64 = secret.name.trim_start_matches("file ").parse().unwrap();
        assert_eq!(secret.data.size, expected);
        assert!(secret.data.filename.starts_with("source-"));
    }
}

#[tokio::test]
async fn test_missing_or_foreign_download_is_not_found() {
    let vault = vault().await;
    let remote = vault.serve().await;
    let alice = vault.client_for(&remote, "alice").await;
    let bob = vault.client_for(&remote, "bob").await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("secret.txt");
    std::fs::write(&source, b"for alice only").unwrap();
    let id = alice
        .upload_file(&source, "secret", "", CancelSignal::never())
        .await
        .unwrap();

    let dest = dir.path().join("stolen.txt");
    let err = bob
        .download_file(id, &dest, CancelSignal::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!dest.exists());

    let err = alice
        .download_file(RecordId::new(9999), &dest, CancelSignal::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_removed_binary_is_gone() {
    let vault = vault().await;
    let remote = vault.serve().await;
    let client = vault.client_for(&remote, "alice").await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("a.bin");
    std::fs::write(&source, content(1000)).unwrap();
    let id = client
        .upload_file(&source, "a", "", CancelSignal::never())
        .await
        .unwrap();
    assert!(vault.state.secrets().blobs().path_for(id).exists());

    client
        .call(RemoveRequest {
            kind: SecretKind::Binary,
            id,
        })
        .await
        .unwrap();
    assert!(!vault.state.secrets().blobs().path_for(id).exists());

    let err = client
        .download_file(id, &dir.path().join("b.bin"), CancelSignal::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_internal_detail_is_not_sent() {
    let vault = vault().await;
    let remote = vault.serve().await;
    let client = vault.client_for(&remote, "alice").await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("a.bin");
    std::fs::write(&source, b"abc").unwrap();
    let id = client
        .upload_file(&source, "a", "", CancelSignal::never())
        .await
        .unwrap();
    std::fs::remove_file(vault.state.secrets().blobs().path_for(id)).unwrap();

    let err = client
        .download_file(id, &dir.path().join("b.bin"), CancelSignal::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    let vault_daemon::http_server::api::client::ApiError::Status { message, .. } = err else {
        panic!("expected a status error");
    };
    assert_eq!(message, vault_daemon::error::INTERNAL_MESSAGE);
}

#[tokio::test]
async fn test_upload_with_invalid_metadata_creates_nothing() {
    let vault = vault().await;
    let remote = vault.serve().await;
    let client = vault.client_for(&remote, "alice").await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("a.bin");
    std::fs::write(&source, b"abc").unwrap();
    let err = client
        .upload_file(&source, "", "", CancelSignal::never())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);

    let binaries = client
        .call(ListKindRequest {
            kind: SecretKind::Binary,
        })
        .await
        .unwrap()
        .secrets;
    assert!(binaries.is_empty());
}

#[tokio::test]
async fn test_cancelled_upload_reports_cancelled() {
    let vault = vault().await;
    let remote = vault.serve().await;
    let client = vault.client_for(&remote, "alice").await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("big.bin");
    std::fs::write(&source, content(CHUNK_SIZE * 4)).unwrap();
    let (handle, signal) = common::cancel::pair();
    handle.cancel();

    let err = client
        .upload_file(&source, "big", "", signal)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        vault_daemon::http_server::api::client::ApiError::Cancelled(_)
    ));
}

#[tokio::test]
async fn test_fetch_all_merges_every_kind() {
    let vault = vault().await;
    let remote = vault.serve().await;
    let client = vault.client_for(&remote, "alice").await;
    let dir = tempfile::tempdir().unwrap();

    let source = dir.path().join("a.bin");
    std::fs::write(&source, b"abc").unwrap();
    client
        .upload_file(&source, "a", "", CancelSignal::never())
        .await
        .unwrap();
    client
        .call(vault_daemon::http_server::api::v0::secrets::CreateRequest {
            name: "diary".into(),
            data: common::prelude::SecretData::Note(common::prelude::Note {
                body: "hello".into(),
            }),
        })
        .await
        .unwrap();

    let mut kinds: Vec<_> = client
        .fetch_all(CancelSignal::never())
        .await
        .unwrap()
        .iter()
        .map(|r| r.kind())
        .collect();
    kinds.sort();
    assert_eq!(kinds, vec![SecretKind::Note, SecretKind::Binary]);
}
