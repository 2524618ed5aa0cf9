#[macro_use]
extern crate time_test;

use rocket::http::{Header, Status};
use rocket::local::asynchronous::Client;
use rocket::tokio;
use serde_json::json;

use onboard_api::orm::testing::test_rocket;

async fn client() -> Client {
    Client::tracked(test_rocket()).await.unwrap()
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

async fn register(client: &Client, email: &str, role: &str) -> String {
    let response = client
        .post("/api/auth/register")
        .json(&json!({
            "name": email.split('@').next().unwrap(),
            "email": email,
            "password": "hunter22",
            "role": role
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Picks an active request type and the HR approver from the lookups.
async fn lookups(client: &Client, token: &str, approver_email: &str) -> (i64, i64) {
    let types = client
        .get("/api/requests/types")
        .header(bearer(token))
        .dispatch()
        .await;
    assert_eq!(types.status(), Status::Ok);
    let body: serde_json::Value = types.into_json().await.unwrap();
    let type_id = body["data"][0]["id"].as_i64().unwrap();

    let approvers = client
        .get("/api/requests/approvers")
        .header(bearer(token))
        .dispatch()
        .await;
    assert_eq!(approvers.status(), Status::Ok);
    let body: serde_json::Value = approvers.into_json().await.unwrap();
    let approver_id = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["email"] == approver_email)
        .and_then(|u| u["id"].as_i64())
        .unwrap();

    (type_id, approver_id)
}

async fn submit(client: &Client, token: &str, type_id: i64, responsible: i64) -> i64 {
    let response = client
        .post("/api/requests")
        .header(bearer(token))
        .json(&json!({
            "title": "New laptop",
            "description": "Dev machine",
            "request_type_id": type_id,
            "responsible_id": responsible
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: serde_json::Value = response.into_json().await.unwrap();
    assert!(body["data"]["code"].as_str().unwrap().starts_with("REQ-"));
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn full_lifecycle_with_audit_trail() {
    let client = client().await;
    time_test!("full_lifecycle_with_audit_trail");

    let hr = register(&client, "hr@example.com", "hr").await;
    let employee = register(&client, "emp@example.com", "employee").await;

    let (type_id, hr_id) = lookups(&client, &employee, "hr@example.com").await;
    let request_id = submit(&client, &employee, type_id, hr_id).await;

    // Requester edits while pending; the trail records the diff.
    let edited = client
        .put(format!("/api/requests/{}", request_id))
        .header(bearer(&employee))
        .json(&json!({"title": "Bigger laptop"}))
        .dispatch()
        .await;
    assert_eq!(edited.status(), Status::Ok);

    // The assigned approver resolves it with a comment.
    let approved = client
        .patch(format!("/api/requests/{}/status", request_id))
        .header(bearer(&hr))
        .json(&json!({"status": "approved", "comment": "Budget confirmed"}))
        .dispatch()
        .await;
    assert_eq!(approved.status(), Status::Ok);
    let body: serde_json::Value = approved.into_json().await.unwrap();
    assert_eq!(body["data"]["status"], "approved");

    let detail = client
        .get(format!("/api/requests/{}", request_id))
        .header(bearer(&employee))
        .dispatch()
        .await;
    assert_eq!(detail.status(), Status::Ok);
    let body: serde_json::Value = detail.into_json().await.unwrap();
    assert_eq!(body["data"]["requester"]["email"], "emp@example.com");
    assert_eq!(body["data"]["responsible"]["email"], "hr@example.com");

    // Newest first: approved, edit, create.
    let history = body["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["action"], "approved");
    assert_eq!(history[0]["comment"], "Budget confirmed");
    assert_eq!(history[1]["action"], "edit");
    assert!(
        history[1]["comment"]
            .as_str()
            .unwrap()
            .contains("'New laptop' -> 'Bigger laptop'")
    );
    assert_eq!(history[2]["action"], "create");
    assert!(history[2]["prior_status"].is_null());

    // Terminal state freezes the request.
    let frozen = client
        .patch(format!("/api/requests/{}/status", request_id))
        .header(bearer(&hr))
        .json(&json!({"status": "rejected"}))
        .dispatch()
        .await;
    assert_eq!(frozen.status(), Status::BadRequest);

    let late_edit = client
        .put(format!("/api/requests/{}", request_id))
        .header(bearer(&employee))
        .json(&json!({"title": "Too late"}))
        .dispatch()
        .await;
    assert_eq!(late_edit.status(), Status::BadRequest);
}

#[tokio::test]
async fn create_rejects_non_approver_responsible() {
    let client = client().await;
    let employee = register(&client, "emp@example.com", "employee").await;
    let (type_id, _) = lookups(&client, &employee, "admin@example.com").await;

    // Grab our own id from the profile and use it as responsible.
    let profile = client
        .get("/api/auth/profile")
        .header(bearer(&employee))
        .dispatch()
        .await;
    let body: serde_json::Value = profile.into_json().await.unwrap();
    let own_id = body["data"]["id"].as_i64().unwrap();

    let response = client
        .post("/api/requests")
        .header(bearer(&employee))
        .json(&json!({
            "title": "Self approved",
            "description": "Nope",
            "request_type_id": type_id,
            "responsible_id": own_id
        }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[tokio::test]
async fn visibility_and_scoping_rules() {
    let client = client().await;
    time_test!("visibility_and_scoping_rules");

    let hr = register(&client, "hr@example.com", "hr").await;
    let employee = register(&client, "emp@example.com", "employee").await;
    let outsider = register(&client, "outsider@example.com", "employee").await;

    let (type_id, hr_id) = lookups(&client, &employee, "hr@example.com").await;
    let request_id = submit(&client, &employee, type_id, hr_id).await;

    // An unrelated employee cannot see the detail.
    let denied = client
        .get(format!("/api/requests/{}", request_id))
        .header(bearer(&outsider))
        .dispatch()
        .await;
    assert_eq!(denied.status(), Status::Forbidden);

    // Nor may they resolve it.
    let denied = client
        .patch(format!("/api/requests/{}/status", request_id))
        .header(bearer(&outsider))
        .json(&json!({"status": "approved"}))
        .dispatch()
        .await;
    assert_eq!(denied.status(), Status::Forbidden);

    // Role-scoped listings.
    let mine = client
        .get("/api/requests")
        .header(bearer(&employee))
        .dispatch()
        .await;
    let body: serde_json::Value = mine.into_json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 1);
    assert!(!body["data"][0]["type_name"].as_str().unwrap().is_empty());

    let theirs = client
        .get("/api/requests")
        .header(bearer(&outsider))
        .dispatch()
        .await;
    let body: serde_json::Value = theirs.into_json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 0);

    let assigned = client
        .get("/api/requests")
        .header(bearer(&hr))
        .dispatch()
        .await;
    let body: serde_json::Value = assigned.into_json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 1);

    let stats = client
        .get("/api/requests/stats")
        .header(bearer(&hr))
        .dispatch()
        .await;
    let body: serde_json::Value = stats.into_json().await.unwrap();
    assert_eq!(body["data"]["pending"], 1);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn edit_is_requester_only() {
    let client = client().await;

    let hr = register(&client, "hr@example.com", "hr").await;
    let employee = register(&client, "emp@example.com", "employee").await;
    let (type_id, hr_id) = lookups(&client, &employee, "hr@example.com").await;
    let request_id = submit(&client, &employee, type_id, hr_id).await;

    let response = client
        .put(format!("/api/requests/{}", request_id))
        .header(bearer(&hr))
        .json(&json!({"title": "Hijacked"}))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
}
