// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for GitHub release fetching, against a mocked API.

use chrono::{TimeZone, Utc};
use khmod::core::process::ProcessBuilder;
use khmod::net::ReleaseQuery;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn release_json(tag: &str, published: &str, asset: &str, updated: &str, url: &str) -> serde_json::Value {
    json!({
        "tag_name": tag,
        "published_at": published,
        "assets": [{
            "name": asset,
            "updated_at": updated,
            "browser_download_url": url,
        }]
    })
}

#[tokio::test]
async fn test_up_to_date_asset_is_skipped() {
    let server = MockServer::start().await;
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("openkh");
    std::fs::create_dir_all(&destination).unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/OpenKH/OpenKh/releases/tags/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_json(
            "latest",
            "2026-01-10T00:00:00Z",
            "openkh.zip",
            "2026-01-10T00:00:00Z",
            &format!("{}/never-fetched", server.uri()),
        )))
        .mount(&server)
        .await;

    let result = ReleaseQuery::new(
        format!("{}/repos/OpenKH/OpenKh/releases/tags/latest", server.uri()),
        &destination,
    )
    .asset("openkh.zip")
    .last_downloaded(Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()))
    .fetch_latest()
    .await
    .unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_missing_asset_name_is_tolerated() {
    let server = MockServer::start().await;
    let temp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/x/y/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_json(
            "v1.0",
            "2026-01-10T00:00:00Z",
            "something-else.zip",
            "2026-01-10T00:00:00Z",
            "http://unused.invalid/",
        )))
        .mount(&server)
        .await;

    let result = ReleaseQuery::new(
        format!("{}/repos/x/y/releases/latest", server.uri()),
        temp.path().join("absent"),
    )
    .asset("expected.zip")
    .fetch_latest()
    .await
    .unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_api_failure_tolerated_when_installed() {
    let server = MockServer::start().await;
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("openkh");
    std::fs::create_dir_all(&destination).unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // previous install exists: the tool keeps working offline
    let result = ReleaseQuery::new(format!("{}/releases/latest", server.uri()), &destination)
        .asset("openkh.zip")
        .fetch_latest()
        .await
        .unwrap();
    assert_eq!(result, None);

    // first install cannot proceed without the download
    let err = ReleaseQuery::new(format!("{}/releases/latest", server.uri()), temp.path().join("absent"))
        .asset("openkh.zip")
        .fetch_latest()
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_newest_of_release_list_wins() {
    let server = MockServer::start().await;
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("randomizer");
    std::fs::create_dir_all(&destination).unwrap();

    let releases = json!([
        release_json(
            "v1.0",
            "2026-01-01T00:00:00Z",
            "app.zip",
            "2026-01-01T00:00:00Z",
            "http://unused.invalid/old"
        ),
        release_json(
            "v2.0",
            "2026-03-01T00:00:00Z",
            "app.zip",
            "2026-03-01T00:00:00Z",
            "http://unused.invalid/new"
        ),
    ]);
    Mock::given(method("GET"))
        .and(path("/repos/x/y/releases"))
        .respond_with(ResponseTemplate::new(200).set_body_json(releases))
        .mount(&server)
        .await;

    // downloaded after v2.0's asset date: nothing to do, proving the newest
    // release was the one compared against
    let result = ReleaseQuery::new(format!("{}/repos/x/y/releases", server.uri()), &destination)
        .asset("app.zip")
        .last_downloaded(Some(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()))
        .fetch_latest()
        .await
        .unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_download_extract_flatten_and_exclude() {
    if ProcessBuilder::which("7z").is_err() {
        return;
    }
    let server = MockServer::start().await;
    let temp = tempfile::tempdir().unwrap();

    // build a zip with one wrapping folder, a payload file, and a config
    // file the query excludes
    let payload = temp.path().join("payload/inner");
    std::fs::create_dir_all(&payload).unwrap();
    std::fs::write(payload.join("DBGHELP.dll"), b"loader").unwrap();
    std::fs::write(payload.join("LuaBackend.toml"), b"user config").unwrap();
    ProcessBuilder::which("7z")
        .unwrap()
        .arg("a")
        .arg("-tzip")
        .arg(temp.path().join("DBGHELP.zip").display().to_string())
        .arg("inner")
        .cwd(temp.path().join("payload"))
        .run()
        .await
        .expect("7z should pack the fixture");
    let archive = std::fs::read(temp.path().join("DBGHELP.zip")).unwrap();

    Mock::given(method("GET"))
        .and(path("/repos/x/y/releases/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(release_json(
            "v1.0",
            "2026-05-01T00:00:00Z",
            "DBGHELP.zip",
            "2026-05-01T00:00:00Z",
            &format!("{}/dl/DBGHELP.zip", server.uri()),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dl/DBGHELP.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(&server)
        .await;

    let destination = temp.path().join("luabackend");
    let result = ReleaseQuery::new(
        format!("{}/repos/x/y/releases/latest", server.uri()),
        &destination,
    )
    .asset("DBGHELP.zip")
    .extra_folder(true)
    .exclude("LuaBackend.toml")
    .fetch_latest()
    .await
    .unwrap();

    assert_eq!(
        result,
        Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(std::fs::read(destination.join("DBGHELP.dll")).unwrap(), b"loader");
    assert!(
        !destination.join("LuaBackend.toml").exists(),
        "excluded file must not land in the destination"
    );
}
