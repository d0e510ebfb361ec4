//! Company administration, dashboard and activity log.
//!
//! Run with: `cargo test -p vantage-api --test company_admin_test`

mod helpers;

use helpers::auth::{bearer, create_client, create_company};
use helpers::fixtures::upload_bundle;
use helpers::{api_path, setup_test_app};
use serde_json::{json, Value};

#[tokio::test]
async fn test_duplicate_company_name_rejected() {
    let app = setup_test_app().await;
    create_company(&app, "Acme").await;

    let response = app
        .client()
        .post(&api_path("/admin/companies"))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({ "name": "Acme" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let empty = app
        .client()
        .post(&api_path("/admin/companies"))
        .add_header("Authorization", bearer(&app.admin_token))
        .json(&json!({ "name": "" }))
        .await;
    assert_eq!(empty.status_code(), 400);
}

#[tokio::test]
async fn test_delete_company_cascades() {
    let app = setup_test_app().await;
    let acme = create_company(&app, "Acme").await;
    let alice = create_client(&app, acme, "alice@acme.test").await;
    upload_bundle(&app, acme, "Q1 Review", false).await;
    assert!(app.upload_root().join("Acme/Q1 Review/main.html").is_file());

    let response = app
        .client()
        .delete(&api_path(&format!("/admin/companies/{}", acme)))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["company_id"], acme.to_string());
    assert_eq!(body["users_deleted"], 1);
    assert_eq!(body["reports_deleted"], 1);
    assert_eq!(body["message"], "Company Acme deleted");

    assert!(!app.upload_root().join("Acme/Q1 Review").exists());

    // The deleted user's JWT no longer resolves
    let me = app
        .client()
        .get(&api_path("/auth/me"))
        .add_header("Authorization", bearer(&alice.token))
        .await;
    assert_eq!(me.status_code(), 401);

    let again = app
        .client()
        .delete(&api_path(&format!("/admin/companies/{}", acme)))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    assert_eq!(again.status_code(), 404);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = setup_test_app().await;
    let acme = create_company(&app, "Acme").await;
    create_client(&app, acme, "alice@acme.test").await;
    upload_bundle(&app, acme, "Q1 Review", false).await;

    let response = app
        .client()
        .get(&api_path("/admin/dashboard"))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    response.assert_status_ok();
    let stats: Value = response.json();

    // Administration + Acme; admin + alice
    assert_eq!(stats["total_companies"], 2);
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["total_reports"], 1);
    let recent = stats["recent_activities"].as_array().unwrap();
    assert!(!recent.is_empty() && recent.len() <= 10);
    assert_eq!(recent[0]["activity_type"], "report_upload");
}

#[tokio::test]
async fn test_activity_log_filters() {
    let app = setup_test_app().await;
    let acme = create_company(&app, "Acme").await;
    let alice = create_client(&app, acme, "alice@acme.test").await;

    let response = app
        .client()
        .get(&api_path("/admin/activity-logs"))
        .add_query_param("user_id", alice.id)
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    response.assert_status_ok();
    let logs: Vec<Value> = response.json();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["activity_type"], "login");

    let limited = app
        .client()
        .get(&api_path("/admin/activity-logs"))
        .add_query_param("limit", 2)
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    let limited: Vec<Value> = limited.json();
    assert_eq!(limited.len(), 2);
    // Newest first
    let timestamp = |entry: &Value| {
        chrono::DateTime::parse_from_rfc3339(entry["timestamp"].as_str().unwrap()).unwrap()
    };
    assert!(timestamp(&limited[0]) >= timestamp(&limited[1]));
}
