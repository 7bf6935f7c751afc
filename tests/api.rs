// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end walkthrough of the HTTP API against a temporary database.

use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use serde_json::json;
use tempfile::tempdir;
use tokio::net::TcpStream;
use tokio::time::sleep;

use studytrack::config::Config;
use studytrack::server::serve;

async fn wait_for_server(bind: &str) {
    for _ in 0..1000 {
        if let Ok(stream) = TcpStream::connect(bind).await {
            drop(stream);
            return;
        }
        sleep(Duration::from_millis(10)).await;
    }
    panic!("server did not come up on {bind}");
}

#[tokio::test]
async fn test_api_walkthrough() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("study.sqlite3");
    let port = portpicker::pick_unused_port().expect("no free port");
    let bind = format!("127.0.0.1:{port}");
    let config = Config::parse(&format!(
        r#"
        bind = "{bind}"
        database = "{}"
        token_ttl_seconds = 3600

        [users]
        alice = "correct-horse"
        "#,
        db_path.display()
    ))
    .unwrap();

    tokio::spawn(async move {
        serve(config).await.unwrap();
    });
    wait_for_server(&bind).await;

    let base = format!("http://{bind}");
    let client = Client::new();

    // Requests without a token are rejected.
    let resp = client
        .get(format!("{base}/api/documents"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Wrong password.
    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "username": "alice", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Login.
    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "username": "alice", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    let auth = format!("Bearer {token}");

    let resp = client
        .get(format!("{base}/api/auth/me"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["username"], "alice");

    // Create a document.
    let resp = client
        .post(format!("{base}/api/documents"))
        .header("Authorization", &auth)
        .json(&json!({ "filename": "mitosis.pdf", "category": "Biology" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let document: Value = resp.json().await.unwrap();
    let document_id = document["id"].as_i64().unwrap();

    // Recategorize it.
    let resp = client
        .put(format!("{base}/api/documents/{document_id}/category"))
        .header("Authorization", &auth)
        .json(&json!({ "category": "Cell Biology" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let document: Value = resp.json().await.unwrap();
    assert_eq!(document["category"], "Cell Biology");

    // Recategorizing a missing document is a 404.
    let resp = client
        .put(format!("{base}/api/documents/999/category"))
        .header("Authorization", &auth)
        .json(&json!({ "category": "Physics" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Create a card; it is due immediately.
    let resp = client
        .post(format!("{base}/api/documents/{document_id}/cards"))
        .header("Authorization", &auth)
        .json(&json!({ "question": "What is mitosis?", "answer": "Cell division." }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let card: Value = resp.json().await.unwrap();
    let card_id = card["id"].as_i64().unwrap();
    assert_eq!(card["scheduling"]["repetitions"], 0);
    assert_eq!(card["scheduling"]["ease_factor"], 2.5);

    let resp = client
        .get(format!("{base}/api/cards/due"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let due: Vec<i64> = resp.json().await.unwrap();
    assert_eq!(due, vec![card_id]);

    // Out-of-range grade is rejected before anything changes.
    let resp = client
        .post(format!("{base}/api/cards/{card_id}/review"))
        .header("Authorization", &auth)
        .json(&json!({ "grade": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Grade 4: one repetition, one-day interval.
    let resp = client
        .post(format!("{base}/api/cards/{card_id}/review"))
        .header("Authorization", &auth)
        .json(&json!({ "grade": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let scheduling: Value = resp.json().await.unwrap();
    assert_eq!(scheduling["repetitions"], 1);
    assert_eq!(scheduling["interval_days"], 1);

    // Not due now, due three days out.
    let resp = client
        .get(format!("{base}/api/cards/due"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let due: Vec<i64> = resp.json().await.unwrap();
    assert!(due.is_empty());

    let future = chrono::Utc::now() + chrono::Duration::days(3);
    let resp = client
        .get(format!("{base}/api/cards/due"))
        .header("Authorization", &auth)
        .query(&[("now", future.to_rfc3339())])
        .send()
        .await
        .unwrap();
    let due: Vec<i64> = resp.json().await.unwrap();
    assert_eq!(due, vec![card_id]);

    // Grading an unknown card is a 404.
    let resp = client
        .post(format!("{base}/api/cards/9999/review"))
        .header("Authorization", &auth)
        .json(&json!({ "grade": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // Sessions: unknown document is a 404.
    let resp = client
        .post(format!("{base}/api/analytics/session/start"))
        .header("Authorization", &auth)
        .json(&json!({ "document_id": 9999, "activity_type": "quiz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .post(format!("{base}/api/analytics/session/start"))
        .header("Authorization", &auth)
        .json(&json!({ "document_id": document_id, "activity_type": "flashcards" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let session: Value = resp.json().await.unwrap();
    let session_id = session["id"].as_i64().unwrap();
    assert!(session["end_time"].is_null());

    // Ending twice returns identical state.
    let resp = client
        .post(format!("{base}/api/analytics/session/end"))
        .header("Authorization", &auth)
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap();
    let first: Value = resp.json().await.unwrap();
    assert!(!first["end_time"].is_null());
    let resp = client
        .post(format!("{base}/api/analytics/session/end"))
        .header("Authorization", &auth)
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .unwrap();
    let second: Value = resp.json().await.unwrap();
    assert_eq!(first["end_time"], second["end_time"]);
    assert_eq!(first["duration_seconds"], second["duration_seconds"]);

    // Stats: the session just recorded shows up as a one-day streak and a
    // seven-bucket history.
    let resp = client
        .get(format!("{base}/api/analytics/stats"))
        .header("Authorization", &auth)
        .query(&[("timezone_offset", 0)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let stats: Value = resp.json().await.unwrap();
    assert_eq!(stats["current_streak"], 1);
    assert_eq!(stats["activity_breakdown"]["flashcards"], 1);
    assert_eq!(stats["daily_history"].as_array().unwrap().len(), 7);

    // Chat log round trip.
    let resp = client
        .post(format!("{base}/api/documents/{document_id}/chat"))
        .header("Authorization", &auth)
        .json(&json!({ "role": "user", "content": "Summarize chapter 3." }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client
        .get(format!("{base}/api/documents/{document_id}/chat"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let log: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["role"], "user");

    // Deleting the document takes its cards, sessions, and chat with it.
    let resp = client
        .delete(format!("{base}/api/documents/{document_id}"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client
        .get(format!("{base}/api/documents"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    let documents: Vec<Value> = resp.json().await.unwrap();
    assert!(documents.is_empty());
    let future = chrono::Utc::now() + chrono::Duration::days(30);
    let resp = client
        .get(format!("{base}/api/cards/due"))
        .header("Authorization", &auth)
        .query(&[("now", future.to_rfc3339())])
        .send()
        .await
        .unwrap();
    let due: Vec<i64> = resp.json().await.unwrap();
    assert!(due.is_empty());

    // Logout invalidates the token.
    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = client
        .get(format!("{base}/api/auth/me"))
        .header("Authorization", &auth)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
