//! Authentication and role checks.
//!
//! Run with: `cargo test -p vantage-api --test auth_test`

mod helpers;

use helpers::auth::{bearer, create_client, create_company, login, CLIENT_PASSWORD};
use helpers::{api_path, setup_test_app, ADMIN_EMAIL};
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/health")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({ "status": "healthy", "service": "vantage" }));
}

#[tokio::test]
async fn test_admin_login_and_me() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/auth/login"))
        .json(&json!({ "email": "ADMIN@vantage.test", "password": helpers::ADMIN_PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "admin");
    assert_eq!(body["company"]["name"], "Administration");
    assert!(body["user"].get("password_hash").is_none());

    let me = app
        .client()
        .get(&api_path("/auth/me"))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    me.assert_status_ok();
    let me: Value = me.json();
    assert_eq!(me["email"], ADMIN_EMAIL);
    assert!(!me["last_login"].is_null());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = setup_test_app().await;

    for (email, password) in [
        (ADMIN_EMAIL, "wrong-password"),
        ("nobody@vantage.test", "whatever-password"),
    ] {
        let response = app
            .client()
            .post(&api_path("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .await;
        assert_eq!(response.status_code(), 401);
        let body: Value = response.json();
        assert_eq!(body["error"], "Incorrect email or password");
    }
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/client/reports")).await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .get(&api_path("/client/reports"))
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .client()
        .get(&api_path("/client/reports"))
        .add_header("Authorization", "Basic YWRtaW46YWRtaW4=")
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_client_cannot_use_admin_routes() {
    let app = setup_test_app().await;
    let company_id = create_company(&app, "Acme").await;
    let client = create_client(&app, company_id, "alice@acme.test").await;

    for path in ["/admin/dashboard", "/admin/companies", "/admin/users", "/admin/reports"] {
        let response = app
            .client()
            .get(&api_path(path))
            .add_header("Authorization", bearer(&client.token))
            .await;
        assert_eq!(response.status_code(), 403, "{}", path);
    }

    let me = app
        .client()
        .get(&api_path("/auth/me"))
        .add_header("Authorization", bearer(&client.token))
        .await;
    me.assert_status_ok();
    let me: Value = me.json();
    assert_eq!(me["role"], "client");
    assert_eq!(me["company_id"], company_id.to_string());
}

#[tokio::test]
async fn test_create_user_rules() {
    let app = setup_test_app().await;
    let company_id = create_company(&app, "Acme").await;
    create_client(&app, company_id, "alice@acme.test").await;

    // Emails are stored lowercased, so a case variant is a duplicate
    let duplicate = app
        .client()
        .post(&api_path("/admin/users"))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({
            "email": "Alice@Acme.test",
            "full_name": "Alice Again",
            "company_id": company_id,
            "password": CLIENT_PASSWORD,
        }))
        .await;
    assert_eq!(duplicate.status_code(), 400);

    let unknown_company = app
        .client()
        .post(&api_path("/admin/users"))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({
            "email": "bob@nowhere.test",
            "full_name": "Bob",
            "company_id": uuid::Uuid::new_v4(),
            "password": CLIENT_PASSWORD,
        }))
        .await;
    assert_eq!(unknown_company.status_code(), 404);

    let short_password = app
        .client()
        .post(&api_path("/admin/users"))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({
            "email": "carol@acme.test",
            "full_name": "Carol",
            "company_id": company_id,
            "password": "short",
        }))
        .await;
    assert_eq!(short_password.status_code(), 400);

    // Mixed-case login resolves to the stored account
    login(app.client(), "ALICE@acme.test", CLIENT_PASSWORD).await;
}

#[tokio::test]
async fn test_logout_is_logged() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/auth/logout"))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    response.assert_status_ok();

    let logs = app
        .client()
        .get(&api_path("/admin/activity-logs"))
        .add_query_param("activity_type", "logout")
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    logs.assert_status_ok();
    let logs: Vec<Value> = logs.json();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["user_email"], ADMIN_EMAIL);
}
