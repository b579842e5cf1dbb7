// Shared fixtures for integration tests.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use osgithub::{ClientConfig, GitHubClient};
use serde_json::{Value, json};
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

pub const USER_AGENT: &str = "osgithub-tests";

pub const HTML_CONTENT: &str = r#"
    <html>
        <head><style type="text/css">body {margin: 0;}</style></head>
        <body><p>foo</p></body>
    </html>
"#;

/// Config pointed at the mock server, caching into `cache_dir`.
pub fn config(server: &MockServer, cache_dir: &TempDir) -> ClientConfig {
    ClientConfig::default()
        .with_user_agent(USER_AGENT)
        .with_base_url(Url::parse(&server.uri()).unwrap())
        .with_cache_dir(cache_dir.path())
}

pub fn client(config: ClientConfig) -> GitHubClient {
    GitHubClient::new(config).unwrap()
}

/// Base64 wrapped at 60 columns, as GitHub returns it.
pub fn github_base64(text: &str) -> String {
    let encoded = STANDARD.encode(text);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn file_json(path: &str, sha: &str, content: Option<&str>) -> Value {
    let name = path.rsplit('/').next().unwrap();
    let mut file = json!({
        "type": "file",
        "name": name,
        "path": path,
        "sha": sha,
        "size": 1234,
    });
    if let Some(content) = content {
        file["encoding"] = json!("base64");
        file["content"] = json!(github_base64(content));
    }
    file
}

pub fn branches_json() -> Value {
    json!([
        {
            "name": "main",
            "commit": {
                "sha": "1aaa11aa111aaa1aaa1aaa11a1a01a1aa2a11111",
                "url": "https://api.github.com/repos/test/foo/commits/1aaa11aa111aaa1aaa1aaa11a1a01a1aa2a11111"
            },
            "protected": true
        },
        {
            "name": "feature",
            "commit": {
                "sha": "2aaa11aa111aaa1aaa1aaa11a1a01a1aa2a11111",
                "url": "https://api.github.com/repos/test/foo/commits/2aaa11aa111aaa1aaa1aaa11a1a01a1aa2a11111"
            },
            "protected": false
        }
    ])
}

pub fn pull_request_json(number: u64, state: &str, title: &str) -> Value {
    json!({
        "url": format!("https://api.github.com/repos/test/foo/pulls/{}", number),
        "id": 1000 + number,
        "number": number,
        "state": state,
        "title": title,
        "user": {"login": "testuser", "id": 123},
        "body": "",
        "head": {"ref": format!("feature-{}", number), "sha": "abcd1234"},
        "base": {"ref": "main", "sha": "ef567890"},
        "created_at": "2021-08-16T04:11:31Z",
        "updated_at": null,
        "closed_at": null,
        "merged_at": null
    })
}

pub fn commits_json(date: &str) -> Value {
    json!([{"sha": "abcd1234", "commit": {"committer": {"name": "Test", "date": date}}}])
}
