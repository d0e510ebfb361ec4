use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{api_path, TestApp};

pub const CLIENT_PASSWORD: &str = "client-password-123";

/// A client account created through the admin API and logged in
pub struct TestClient {
    pub id: Uuid,
    pub email: String,
    pub company_id: Uuid,
    pub token: String,
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["access_token"]
        .as_str()
        .expect("Expected access_token in login response")
        .to_string()
}

pub async fn create_company(app: &TestApp, name: &str) -> Uuid {
    let response = app
        .client()
        .post(&api_path("/admin/companies"))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({ "name": name, "description": "Test company" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    Uuid::parse_str(body["id"].as_str().expect("Expected company id")).expect("Invalid UUID")
}

pub async fn create_client(app: &TestApp, company_id: Uuid, email: &str) -> TestClient {
    let response = app
        .client()
        .post(&api_path("/admin/users"))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({
            "email": email,
            "full_name": "Client User",
            "company_id": company_id,
            "password": CLIENT_PASSWORD,
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let id = Uuid::parse_str(body["id"].as_str().expect("Expected user id")).expect("Invalid UUID");
    let token = login(app.client(), email, CLIENT_PASSWORD).await;

    TestClient {
        id,
        email: email.to_string(),
        company_id,
        token,
    }
}
