// Response cache behaviour through the client: hits, misses, expiry, and clearing.

mod common;

use std::time::Duration;

use chrono::Utc;
use common::*;
use osgithub::cache::CachedResponse;
use osgithub::{Expiry, PullRequestState};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_branches(server: &MockServer, owner_repo: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/branches", owner_repo)))
        .respond_with(ResponseTemplate::new(200).set_body_json(branches_json()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_pulls(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/repos/test/foo/pulls"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([pull_request_json(1, "open", "Open PR")])),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_repeated_call_is_served_from_cache() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_branches(&server, "test/foo", 1).await;

    let client = client(config(&server, &cache_dir));
    let repo = client.get_repo("test/foo").unwrap();

    let first = repo.get_branches().await.unwrap();
    let second = repo.get_branches().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(client.cache().unwrap().urls().unwrap().len(), 1);
}

#[tokio::test]
async fn test_disabled_cache_always_fetches() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_branches(&server, "test/foo", 3).await;

    let client = client(config(&server, &cache_dir).with_cache(false));
    assert!(client.cache().is_none());
    let repo = client.get_repo("test/foo").unwrap();

    for _ in 0..3 {
        repo.get_branches().await.unwrap();
    }
    assert!(!cache_dir.path().join("http_cache").exists());
}

#[tokio::test]
async fn test_zero_expiry_always_fetches() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_branches(&server, "test/foo", 2).await;

    let client = client(config(&server, &cache_dir).with_expire_after(Expiry::DO_NOT_CACHE));
    let repo = client.get_repo("test/foo").unwrap();

    repo.get_branches().await.unwrap();
    repo.get_branches().await.unwrap();
    assert!(client.cache().unwrap().urls().unwrap().is_empty());
}

/// Move every stored entry's expiry into the past.
fn expire_all_entries(client: &osgithub::GitHubClient) {
    let dir = client.cache().unwrap().dir();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let json = std::fs::read_to_string(&path).unwrap();
        let mut cached: CachedResponse = serde_json::from_str(&json).unwrap();
        cached.expires_at = Some(Utc::now() - chrono::Duration::minutes(1));
        std::fs::write(&path, serde_json::to_string(&cached).unwrap()).unwrap();
    }
}

#[tokio::test]
async fn test_expired_entry_is_refetched() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_branches(&server, "test/foo", 2).await;

    let client = client(config(&server, &cache_dir).with_expire_after(Duration::from_secs(3600)));
    let repo = client.get_repo("test/foo").unwrap();

    repo.get_branches().await.unwrap();
    repo.get_branches().await.unwrap();
    expire_all_entries(&client);
    repo.get_branches().await.unwrap();
    // Refetched entry is fresh again
    repo.get_branches().await.unwrap();
}

#[tokio::test]
async fn test_url_override_beats_default() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    // Never-expiring default, but pull requests are never cached
    mount_pulls(&server, 2).await;
    mount_branches(&server, "test/foo", 1).await;

    let client = client(
        config(&server, &cache_dir)
            .with_expire_after(Expiry::Never)
            .with_url_expiry("*/pulls", Expiry::DO_NOT_CACHE),
    );
    let repo = client.get_repo("test/foo").unwrap();

    for _ in 0..2 {
        repo.get_pull_requests(PullRequestState::Open).await.unwrap();
        repo.get_branches().await.unwrap();
    }
}

#[tokio::test]
async fn test_first_matching_override_wins() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_pulls(&server, 1).await;

    let client = client(
        config(&server, &cache_dir)
            .with_expire_after(Expiry::DO_NOT_CACHE)
            .with_url_expiry("*/pulls", Expiry::Never)
            .with_url_expiry("*/repos/*", Expiry::DO_NOT_CACHE),
    );
    let repo = client.get_repo("test/foo").unwrap();

    repo.get_pull_requests(PullRequestState::Open).await.unwrap();
    repo.get_pull_requests(PullRequestState::Open).await.unwrap();
}

#[tokio::test]
async fn test_store_is_shared_across_clients_with_same_name() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_branches(&server, "test/foo", 2).await;

    let first = client(config(&server, &cache_dir).with_cache_name("shared"));
    first.get_repo("test/foo").unwrap().get_branches().await.unwrap();

    let same_name = client(config(&server, &cache_dir).with_cache_name("shared"));
    same_name.get_repo("test/foo").unwrap().get_branches().await.unwrap();

    let other_name = client(config(&server, &cache_dir).with_cache_name("separate"));
    other_name.get_repo("test/foo").unwrap().get_branches().await.unwrap();
}

#[tokio::test]
async fn test_credentials_are_part_of_the_cache_key() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/test/foo/branches"))
        .and(header("authorization", "Bearer alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(branches_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/test/foo/branches"))
        .and(header("authorization", "Bearer bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let alice = client(config(&server, &cache_dir).with_token("alice"));
    let bob = client(config(&server, &cache_dir).with_token("bob"));

    for _ in 0..2 {
        assert_eq!(alice.get_repo("test/foo").unwrap().get_branches().await.unwrap().len(), 2);
        assert!(bob.get_repo("test/foo").unwrap().get_branches().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_failed_response_is_not_cached() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/test/foo/branches"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_branches(&server, "test/foo", 1).await;

    let client = client(config(&server, &cache_dir));
    let repo = client.get_repo("test/foo").unwrap();

    let err = repo.get_branches().await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(repo.get_branches().await.unwrap().len(), 2);
    // Third call is a cache hit
    assert_eq!(repo.get_branches().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_clear_cache_only_removes_this_repository() {
    let server = MockServer::start().await;
    let cache_dir = TempDir::new().unwrap();
    mount_branches(&server, "test/foo", 2).await;
    mount_branches(&server, "test/other", 1).await;

    let client = client(config(&server, &cache_dir));
    let foo = client.get_repo("test/foo").unwrap();
    let other = client.get_repo("test/other").unwrap();

    foo.get_branches().await.unwrap();
    other.get_branches().await.unwrap();
    assert_eq!(client.cache().unwrap().urls().unwrap().len(), 2);

    assert_eq!(client.get_repo("Test/Foo").unwrap().clear_cache().unwrap(), 1);
    let urls = client.cache().unwrap().urls().unwrap();
    assert_eq!(urls.len(), 1);
    assert!(urls[0].ends_with("/repos/test/other/branches"));

    // Cleared entry is fetched again, the other stays cached
    foo.get_branches().await.unwrap();
    other.get_branches().await.unwrap();
}
