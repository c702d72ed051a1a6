//! Contract suite against the Redis backend.
//!
//! Requires a reachable server; set `ROOMDROP_TEST_REDIS_URL` to run,
//! otherwise the test is skipped. Keys are isolated under a per-run
//! prefix so parallel runs do not interfere.

mod common;

use roomdrop_core::config::repository::RedisConfig;
use roomdrop_repository::redis::RedisClient;
use roomdrop_repository::RedisRoomRepository;

#[tokio::test]
async fn redis_backend_satisfies_contract() {
    let Ok(url) = std::env::var("ROOMDROP_TEST_REDIS_URL") else {
        eprintln!("ROOMDROP_TEST_REDIS_URL not set; skipping redis contract test");
        return;
    };

    let config = RedisConfig {
        url,
        key_prefix: format!("roomdrop-test-{}", uuid::Uuid::new_v4()),
    };
    let client = RedisClient::connect(&config).await.unwrap();

    let repo = RedisRoomRepository::new(client);
    common::run_contract_suite(&repo).await;
}
