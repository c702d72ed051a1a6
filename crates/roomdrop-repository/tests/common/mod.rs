//! Shared contract suite run against every repository backend.
//!
//! Each backend test file builds its repository and calls
//! [`run_contract_suite`]; the assertions here are identical regardless
//! of which backend is underneath.

use std::time::Duration;

use chrono::Utc;

use roomdrop_core::ShareError;
use roomdrop_core::types::{FileId, RoomId};
use roomdrop_entity::{Room, RoomFile, RoomRepository};

fn make_room(tokens: &[&str]) -> Room {
    let mut room = Room::new("argon2-hash", Duration::from_secs(300)).unwrap();
    for token in tokens {
        room.add_token(*token).unwrap();
    }
    room
}

fn make_file(name: &str) -> RoomFile {
    RoomFile::new(format!("/store/{name}"), name, 7, Utc::now()).unwrap()
}

/// Full behavioral contract for a [`RoomRepository`] implementation.
pub async fn run_contract_suite<R: RoomRepository>(repo: &R) {
    create_and_get(repo).await;
    duplicate_create_conflicts(repo).await;
    token_lookup_is_uniform(repo).await;
    token_lifecycle(repo).await;
    file_attach_requires_membership(repo).await;
    file_detach_returns_path(repo).await;
    delete_cascades_and_reports_paths(repo).await;
    expiry_sweep_removes_exactly_once(repo).await;
    snapshots_redact_tokens(repo).await;
}

async fn create_and_get<R: RoomRepository>(repo: &R) {
    let room = make_room(&["t1"]);
    let id = room.id();
    repo.create(&room).await.unwrap();

    let stored = repo.get(id).await.unwrap().expect("room should exist");
    assert_eq!(stored.id(), id);
    assert_eq!(stored.password_hash(), "argon2-hash");
    assert_eq!(stored.tokens_count(), 1);
    assert!(stored.has_token("t1"));

    let hash = repo.get_password_hash(id).await.unwrap();
    assert_eq!(hash.as_deref(), Some("argon2-hash"));
    assert!(
        repo.get_password_hash(RoomId::new())
            .await
            .unwrap()
            .is_none()
    );
}

async fn duplicate_create_conflicts<R: RoomRepository>(repo: &R) {
    let room = make_room(&["t1"]);
    repo.create(&room).await.unwrap();
    assert!(matches!(
        repo.create(&room).await,
        Err(ShareError::RoomAlreadyExists)
    ));
}

/// Wrong token on an existing room and any token on an absent room must
/// be indistinguishable to the caller.
async fn token_lookup_is_uniform<R: RoomRepository>(repo: &R) {
    let room = make_room(&["t1"]);
    let id = room.id();
    repo.create(&room).await.unwrap();

    assert!(repo.get_by_token(id, "t1").await.unwrap().is_some());
    assert!(repo.get_by_token(id, "wrong").await.unwrap().is_none());
    assert!(repo.get_by_token(id, "").await.unwrap().is_none());
    assert!(
        repo.get_by_token(RoomId::new(), "t1")
            .await
            .unwrap()
            .is_none()
    );
}

async fn token_lifecycle<R: RoomRepository>(repo: &R) {
    let room = make_room(&["t1"]);
    let id = room.id();
    repo.create(&room).await.unwrap();

    repo.add_token(id, "t2").await.unwrap();
    assert!(repo.get_by_token(id, "t2").await.unwrap().is_some());

    assert!(repo.remove_token(id, "t2").await.unwrap());
    assert!(!repo.remove_token(id, "t2").await.unwrap());
    assert!(repo.get_by_token(id, "t2").await.unwrap().is_none());

    // Removing the last token must not delete the room.
    assert!(repo.remove_token(id, "t1").await.unwrap());
    assert!(repo.get(id).await.unwrap().is_some());

    assert!(matches!(
        repo.add_token(RoomId::new(), "t9").await,
        Err(ShareError::RoomNotFound)
    ));
    assert!(!repo.remove_token(RoomId::new(), "t1").await.unwrap());
}

async fn file_attach_requires_membership<R: RoomRepository>(repo: &R) {
    let room = make_room(&["t1"]);
    let id = room.id();
    repo.create(&room).await.unwrap();

    let file = make_file("a.txt");
    assert!(!repo.add_file_by_token(id, "wrong", &file).await.unwrap());
    assert!(
        !repo
            .add_file_by_token(RoomId::new(), "t1", &file)
            .await
            .unwrap()
    );
    assert!(repo.add_file_by_token(id, "t1", &file).await.unwrap());

    let stored = repo.get(id).await.unwrap().unwrap();
    assert_eq!(stored.file_count(), 1);
    let got = stored.get_file(file.id).unwrap();
    assert_eq!(got.name, "a.txt");
    assert_eq!(got.size, 7);
}

async fn file_detach_returns_path<R: RoomRepository>(repo: &R) {
    let room = make_room(&["t1"]);
    let id = room.id();
    repo.create(&room).await.unwrap();

    let file = make_file("b.txt");
    repo.add_file_by_token(id, "t1", &file).await.unwrap();

    assert!(
        repo.delete_file_by_token(id, file.id, "wrong")
            .await
            .unwrap()
            .is_none()
    );

    let path = repo
        .delete_file_by_token(id, file.id, "t1")
        .await
        .unwrap()
        .expect("detach should report the path");
    assert_eq!(path, file.path);

    // Already detached.
    assert!(
        repo.delete_file_by_token(id, file.id, "t1")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.delete_file_by_token(id, FileId::new(), "t1")
            .await
            .unwrap()
            .is_none()
    );
}

async fn delete_cascades_and_reports_paths<R: RoomRepository>(repo: &R) {
    let mut room = make_room(&["t1"]);
    room.add_file(make_file("x.bin")).unwrap();
    room.add_file(make_file("y.bin")).unwrap();
    let id = room.id();
    repo.create(&room).await.unwrap();

    let mut paths = repo.delete(id).await.unwrap();
    paths.sort();
    assert_eq!(paths, vec!["/store/x.bin", "/store/y.bin"]);

    assert!(repo.get(id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete(id).await,
        Err(ShareError::RoomNotFound)
    ));
}

async fn expiry_sweep_removes_exactly_once<R: RoomRepository>(repo: &R) {
    let mut stale = make_room(&["t1"]);
    stale.add_file(make_file("old.dat")).unwrap();
    let stale_id = stale.id();
    let fresh = make_room(&["t2"]);
    let fresh_id = fresh.id();
    repo.create(&stale).await.unwrap();
    repo.create(&fresh).await.unwrap();

    // Before expiry the sweep leaves everything alone.
    let removed = repo.delete_expired(Utc::now()).await.unwrap();
    assert!(removed.iter().all(|c| c.room_id != stale_id));

    let later = Utc::now() + chrono::Duration::seconds(600);
    let removed = repo.delete_expired(later).await.unwrap();
    let entry = removed
        .iter()
        .find(|c| c.room_id == stale_id)
        .expect("stale room should be swept");
    assert_eq!(entry.paths, vec!["/store/old.dat"]);
    assert!(removed.iter().any(|c| c.room_id == fresh_id));

    assert!(repo.get(stale_id).await.unwrap().is_none());
    let again = repo.delete_expired(later).await.unwrap();
    assert!(again.iter().all(|c| c.room_id != stale_id));
}

async fn snapshots_redact_tokens<R: RoomRepository>(repo: &R) {
    let mut room = make_room(&["super-secret-token"]);
    room.add_file(make_file("s.txt")).unwrap();
    let id = room.id();
    repo.create(&room).await.unwrap();

    let snapshots = repo.list_snapshots().await.unwrap();
    let snap = snapshots
        .iter()
        .find(|s| s.id == id)
        .expect("snapshot should be listed");
    assert_eq!(snap.file_count, 1);
    assert_eq!(snap.token_count, 1);

    let json = serde_json::to_string(snap).unwrap();
    assert!(!json.contains("super-secret-token"));
    assert!(!json.contains("argon2-hash"));
}
