//! # Admin Dashboard Tests
//!
//! These tests verify search, pagination, statistics and deletion through the
//! HTTP API, using a temporary SQLite database and upload directory.
//!
//! ## Running the Tests
//!
//! ```bash
//! cargo test --test admin_test
//! ```

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

use scrap_market::constants::ALLOWED_EXTENSIONS;
use scrap_market::db::create_test_connection_in_temporary_file;
use scrap_market::uploads::UploadStore;
use scrap_market::{app, AppState};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    upload_guard: tempfile::TempDir,
    _db_guard: tempfile::TempDir,
}

impl TestServer {
    fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.upload_guard.path()).unwrap().count()
    }

    async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn delete_json(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .delete(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    /// Submit a listing built from default values with some fields replaced
    async fn submit(&self, overrides: &[(&str, &str)], photo_names: &[&str]) -> i64 {
        let mut form = Form::new();
        for (field, value) in BASE_FIELDS {
            let value = overrides
                .iter()
                .find(|(name, _)| *name == field)
                .map(|(_, v)| *v)
                .unwrap_or(value);
            form = form.text(field, value.to_string());
        }
        for name in photo_names {
            form = form.part(
                "fileInput",
                Part::bytes(b"image-bytes".to_vec()).file_name(name.to_string()),
            );
        }

        let body: Value = self
            .client
            .post(format!("{}/submit_listing", self.base_url))
            .multipart(form)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["success"], true, "submit failed: {}", body);
        body["submission_id"].as_i64().unwrap()
    }
}

const BASE_FIELDS: [(&str, &str); 8] = [
    ("materialType", "metal"),
    ("listingTitle", "Copper pipes"),
    ("listingDescription", "Offcuts from a plumbing job"),
    ("listingQuantity", "12 kg"),
    ("sellerName", "Ravi"),
    ("listingLocation", "Nagpur"),
    ("listingContact", "555-0199"),
    ("sellerEmail", "ravi@example.com"),
];

/// Helper to start the app on 127.0.0.1 with isolated storage
async fn start_server() -> TestServer {
    let (store, db_guard) = create_test_connection_in_temporary_file().await.unwrap();
    store.init_schema().await.unwrap();

    let upload_guard = tempfile::tempdir().unwrap();
    let allowed: Vec<String> = ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect();
    let uploads = UploadStore::new(upload_guard.path(), &allowed);

    let state = Arc::new(AppState::new(store, uploads));
    let router = app(state, 16 * 1024 * 1024);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        upload_guard,
        _db_guard: db_guard,
    }
}

fn ids(body: &Value) -> Vec<i64> {
    body["submissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_search_matches_location_case_insensitively() {
    let server = start_server().await;

    let pune = server.submit(&[("listingLocation", "Pune")], &[]).await;
    let _mumbai = server.submit(&[("listingLocation", "Mumbai")], &[]).await;
    let pune_east = server
        .submit(
            &[("listingLocation", "PUNE East"), ("materialType", "paper")],
            &[],
        )
        .await;

    let (status, body) = server.get_json("/admin/submissions?search=pUnE").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 2);
    assert_eq!(ids(&body), vec![pune_east, pune]);

    let (_, body) = server
        .get_json("/admin/submissions?search=pune&material=PAP")
        .await;
    assert_eq!(ids(&body), vec![pune_east]);

    let (_, body) = server.get_json("/admin/submissions?search=%25").await;
    assert_eq!(body["total"], 0);
    assert_eq!(ids(&body), Vec::<i64>::new());

    let (_, body) = server.get_json("/admin/submissions?search=%20%20").await;
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_search_finds_non_ascii_uppercase_location() {
    let server = start_server().await;

    let munich = server.submit(&[("listingLocation", "MÜNCHEN")], &[]).await;
    server.submit(&[("listingLocation", "Nagpur")], &[]).await;

    for term in ["MÜNCHEN", "mÜnchen", "ÜNCH"] {
        let (status, body) = server
            .get_json(&format!(
                "/admin/submissions?search={}",
                urlencoding::encode(term)
            ))
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["total"], 1, "term {}", term);
        assert_eq!(ids(&body), vec![munich], "term {}", term);
    }
}

#[tokio::test]
async fn test_listing_pagination() {
    let server = start_server().await;

    let first = server.submit(&[], &["a.png", "b.png"]).await;
    let second = server.submit(&[], &[]).await;
    let third = server.submit(&[], &[]).await;

    let (_, body) = server.get_json("/admin/submissions?limit=2&offset=0").await;
    assert_eq!(ids(&body), vec![third, second]);
    assert_eq!(body["total"], 3);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["has_more"], true);

    let (_, body) = server.get_json("/admin/submissions?limit=2&offset=2").await;
    assert_eq!(ids(&body), vec![first]);
    assert_eq!(body["has_more"], false);
    assert_eq!(body["submissions"][0]["photo_count"], 2);

    let (_, body) = server
        .get_json("/admin/submissions?limit=many&offset=later")
        .await;
    assert_eq!(body["limit"], 50);
    assert_eq!(body["offset"], 0);
    assert_eq!(ids(&body).len(), 3);
}

#[tokio::test]
async fn test_delete_removes_row_and_files() {
    let server = start_server().await;

    let keep = server.submit(&[], &["keep.png"]).await;
    let id = server
        .submit(&[("listingTitle", "Old batteries")], &["one.png", "two.jpg"])
        .await;
    assert_eq!(server.stored_file_count(), 3);

    let (status, body) = server
        .delete_json(&format!("/admin/submission/{}", id))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Submission \"Old batteries\" deleted successfully"
    );
    assert_eq!(server.stored_file_count(), 1);

    let (status, body) = server.get_json(&format!("/admin/submission/{}", id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, body) = server
        .delete_json(&format!("/admin/submission/{}", id))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = server.get_json(&format!("/admin/submission/{}", keep)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_delete_tolerates_missing_files() {
    let server = start_server().await;

    let id = server.submit(&[], &["gone.png"]).await;
    for entry in std::fs::read_dir(server.upload_guard.path()).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }

    let (status, body) = server
        .delete_json(&format!("/admin/submission/{}", id))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_dashboard_stats_without_submissions() {
    let server = start_server().await;

    let (status, body) = server.get_json("/admin/dashboard-stats").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["total_submissions"], 0);
    assert_eq!(body["stats"]["total_images"], 0);
    assert_eq!(body["stats"]["avg_photos"], 0.0);
    assert_eq!(body["recent_submissions"], serde_json::json!([]));
}

#[tokio::test]
async fn test_dashboard_stats() {
    let server = start_server().await;

    let long_description = "x".repeat(150);
    let first = server
        .submit(
            &[("listingDescription", long_description.as_str())],
            &["1.png", "2.png", "3.png", "4.png"],
        )
        .await;
    server.submit(&[], &[]).await;
    let last = server.submit(&[("materialType", "paper")], &[]).await;

    let (_, body) = server.get_json("/admin/dashboard-stats").await;
    let stats = &body["stats"];
    assert_eq!(stats["total_submissions"], 3);
    assert_eq!(stats["material_types"], 2);
    assert_eq!(stats["total_images"], 4);
    assert_eq!(stats["today_submissions"], 3);
    assert_eq!(stats["avg_photos"], 1.3);

    let recent = body["recent_submissions"].as_array().unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0]["id"], last);

    let oldest = &recent[2];
    assert_eq!(oldest["id"], first);
    assert_eq!(oldest["photos"].as_array().unwrap().len(), 3);
    let description = oldest["description"].as_str().unwrap();
    assert_eq!(description.len(), 103);
    assert!(description.ends_with("..."));
}
