//! End-to-end service scenarios over real collaborators: in-memory
//! repository and blob store, Argon2 hashing, JWT tokens.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use futures::stream;

use roomdrop_auth::{Argon2PasswordHasher, JwtTokenService};
use roomdrop_core::ShareError;
use roomdrop_core::config::AuthConfig;
use roomdrop_core::traits::ByteStream;
use roomdrop_entity::SharePolicy;
use roomdrop_repository::MemoryRoomRepository;
use roomdrop_service::FileShareService;
use roomdrop_storage::MemoryFileStore;

fn default_policy() -> SharePolicy {
    SharePolicy {
        default_room_ttl: Duration::from_secs(3600),
        default_token_ttl: Duration::from_secs(1800),
        max_files: 0,
        max_room_bytes: 0,
        max_room_lifespan: Duration::from_secs(86400),
        max_token_lifespan: Duration::from_secs(86400),
        upload_dir: "uploads".to_string(),
    }
}

fn service_with(policy: SharePolicy) -> (FileShareService, Arc<MemoryFileStore>) {
    let store = Arc::new(MemoryFileStore::new());
    let service = FileShareService::new(
        Arc::new(MemoryRoomRepository::new()),
        store.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(JwtTokenService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
        })),
        policy,
    );
    (service, store)
}

fn body(data: &'static [u8]) -> ByteStream {
    Box::pin(stream::once(async move { Ok(Bytes::from_static(data)) }))
}

async fn read_all(mut stream: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}

#[tokio::test]
async fn full_room_lifecycle() {
    let (svc, _) = service_with(default_policy());

    let (snapshot, t1) = svc
        .create_room("secret", Some(Duration::from_secs(60)))
        .await
        .unwrap();
    let id = snapshot.id;
    assert_eq!(snapshot.file_count, 0);
    assert_eq!(snapshot.token_count, 1);

    assert!(matches!(
        svc.auth_room(id, "wrong", None).await,
        Err(ShareError::InvalidPassword)
    ));

    let (t2, expires_at) = svc
        .auth_room(id, "secret", Some(Duration::from_secs(30)))
        .await
        .unwrap();
    let delta = (expires_at - Utc::now()).num_seconds();
    assert!((25..=30).contains(&delta), "unexpected token expiry {delta}");

    let file = svc.upload_file(id, &t1, "a.txt", body(b"hello")).await.unwrap();
    assert_eq!(file.size, 5);
    assert_eq!(file.name, "a.txt");

    // Any valid token may act, not just the uploader's.
    svc.delete_file(id, file.id, &t2).await.unwrap();
    assert!(matches!(
        svc.file(id, file.id, &t1).await,
        Err(ShareError::FileNotFound)
    ));
}

#[tokio::test]
async fn upload_download_round_trip_sanitizes_name() {
    let (svc, _) = service_with(default_policy());
    let (snapshot, token) = svc.create_room("pw", None).await.unwrap();

    let file = svc
        .upload_file(snapshot.id, &token, "../nested/report.pdf", body(b"content"))
        .await
        .unwrap();
    assert_eq!(file.name, "report.pdf");

    let (meta, stream) = svc
        .download_file(snapshot.id, file.id, &token)
        .await
        .unwrap();
    assert_eq!(meta.size, 7);
    assert_eq!(read_all(stream).await, b"content");
}

#[tokio::test]
async fn delete_room_cascades_to_blobs() {
    let (svc, store) = service_with(default_policy());
    let (snapshot, token) = svc.create_room("pw", None).await.unwrap();

    svc.upload_file(snapshot.id, &token, "a.txt", body(b"aaa"))
        .await
        .unwrap();
    svc.upload_file(snapshot.id, &token, "b.txt", body(b"bbb"))
        .await
        .unwrap();
    assert_eq!(store.len(), 2);

    svc.delete_room(snapshot.id, &token).await.unwrap();
    assert!(store.is_empty());
    assert!(matches!(
        svc.room(snapshot.id, &token).await,
        Err(ShareError::RoomNotFound)
    ));
}

#[tokio::test]
async fn delete_room_requires_membership() {
    let (svc, _) = service_with(default_policy());
    let (snapshot, _) = svc.create_room("pw", None).await.unwrap();

    // Non-holders cannot learn whether the room exists.
    assert!(matches!(
        svc.delete_room(snapshot.id, "not-a-member").await,
        Err(ShareError::RoomNotFound)
    ));
}

#[tokio::test]
async fn quota_failures_leave_no_orphan_blob() {
    let mut policy = default_policy();
    policy.max_room_bytes = 4;
    let (svc, store) = service_with(policy);
    let (snapshot, token) = svc.create_room("pw", None).await.unwrap();

    let err = svc
        .upload_file(snapshot.id, &token, "big.bin", body(b"too large"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShareError::RoomQuotaExceeded));
    assert!(store.is_empty());
}

#[tokio::test]
async fn file_count_quota_is_enforced() {
    let mut policy = default_policy();
    policy.max_files = 1;
    let (svc, _) = service_with(policy);
    let (snapshot, token) = svc.create_room("pw", None).await.unwrap();

    svc.upload_file(snapshot.id, &token, "a.txt", body(b"a"))
        .await
        .unwrap();
    assert!(matches!(
        svc.upload_file(snapshot.id, &token, "b.txt", body(b"b")).await,
        Err(ShareError::TooManyFiles)
    ));
}

#[tokio::test]
async fn lifespan_maxima_are_enforced() {
    let mut policy = default_policy();
    policy.max_room_lifespan = Duration::from_secs(60);
    policy.max_token_lifespan = Duration::from_secs(60);
    let (svc, _) = service_with(policy);

    assert!(matches!(
        svc.create_room("pw", Some(Duration::from_secs(120))).await,
        Err(ShareError::RoomLifespanTooLong)
    ));

    let (snapshot, _) = svc.create_room("pw", None).await.unwrap();
    assert!(matches!(
        svc.auth_room(snapshot.id, "pw", Some(Duration::from_secs(120)))
            .await,
        Err(ShareError::TokenLifespanTooLong)
    ));
}

#[tokio::test]
async fn empty_inputs_are_rejected() {
    let (svc, _) = service_with(default_policy());
    assert!(matches!(
        svc.create_room("   ", None).await,
        Err(ShareError::EmptyPassword)
    ));

    let (snapshot, token) = svc.create_room("pw", None).await.unwrap();
    assert!(matches!(
        svc.upload_file(snapshot.id, "", "a.txt", body(b"a")).await,
        Err(ShareError::EmptyToken)
    ));
    assert!(matches!(
        svc.upload_file(snapshot.id, &token, "  ", body(b"a")).await,
        Err(ShareError::EmptyFilename)
    ));
}

#[tokio::test]
async fn logout_keeps_room_alive() {
    let (svc, _) = service_with(default_policy());
    let (snapshot, token) = svc.create_room("pw", None).await.unwrap();

    svc.logout_room(snapshot.id, &token).await.unwrap();
    assert!(matches!(
        svc.logout_room(snapshot.id, &token).await,
        Err(ShareError::TokenNotFound)
    ));

    // Last logout does not delete the room; re-auth still works.
    let (t2, _) = svc.auth_room(snapshot.id, "pw", None).await.unwrap();
    svc.room(snapshot.id, &t2).await.unwrap();
}

#[tokio::test]
async fn cleanup_expired_sweeps_rooms_and_blobs() {
    let (svc, store) = service_with(default_policy());
    let (stale, token) = svc
        .create_room("pw", Some(Duration::from_secs(10)))
        .await
        .unwrap();
    svc.upload_file(stale.id, &token, "old.dat", body(b"old"))
        .await
        .unwrap();
    let (fresh, _) = svc
        .create_room("pw", Some(Duration::from_secs(3600)))
        .await
        .unwrap();

    let report = svc
        .cleanup_expired(Utc::now() + chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert!(report.error.is_none());
    assert!(report.removed.contains(&stale.id));
    assert!(!report.removed.contains(&fresh.id));
    assert!(store.is_empty());

    // A second sweep finds nothing.
    let again = svc
        .cleanup_expired(Utc::now() + chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert!(again.removed.is_empty());
}

#[tokio::test]
async fn check_room_access_validates_token_and_membership() {
    let (svc, _) = service_with(default_policy());
    let (snapshot, token) = svc.create_room("pw", None).await.unwrap();

    svc.check_room_access(snapshot.id, &token).await.unwrap();

    // A token minted for another room is a mismatch.
    let (other, other_token) = svc.create_room("pw", None).await.unwrap();
    assert!(matches!(
        svc.check_room_access(snapshot.id, &other_token).await,
        Err(ShareError::TokenRoomMismatch)
    ));
    svc.check_room_access(other.id, &other_token).await.unwrap();

    // A logged-out token no longer grants access even though the JWT
    // itself is still valid.
    svc.logout_room(snapshot.id, &token).await.unwrap();
    assert!(matches!(
        svc.check_room_access(snapshot.id, &token).await,
        Err(ShareError::RoomNotFound)
    ));
}
