//! Secure viewing: capability tokens, HTML rewriting, assets, counters and downloads.
//!
//! Run with: `cargo test -p vantage-api --test report_viewing_test`

mod helpers;

use helpers::auth::{bearer, create_client, create_company, TestClient};
use helpers::fixtures::{build_zip, upload, upload_bundle, MAIN_HTML};
use helpers::{api_path, setup_test_app, TestApp};
use serde_json::Value;
use uuid::Uuid;

struct Scenario {
    app: TestApp,
    client: TestClient,
    report_id: Uuid,
}

async fn scenario(allow_download: bool) -> Scenario {
    let app = setup_test_app().await;
    let company_id = create_company(&app, "Acme").await;
    let client = create_client(&app, company_id, "alice@acme.test").await;
    let report_id = upload_bundle(&app, company_id, "Q1 Review", allow_download).await;
    Scenario {
        app,
        client,
        report_id,
    }
}

fn report_path(report_id: Uuid, rest: &str) -> String {
    api_path(&format!("/client/reports/{}{}", report_id, rest))
}

async fn secure_token(app: &TestApp, token: &str, report_id: Uuid) -> Value {
    let response = app
        .client()
        .get(&report_path(report_id, "/secure-token"))
        .add_header("Authorization", bearer(token))
        .await;
    response.assert_status_ok();
    response.json()
}

async fn admin_report(app: &TestApp, report_id: Uuid) -> Value {
    let response = app
        .client()
        .get(&api_path("/admin/reports"))
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    response.assert_status_ok();
    let reports: Vec<Value> = response.json();
    reports
        .into_iter()
        .find(|r| r["id"] == report_id.to_string())
        .expect("report listed")
}

#[tokio::test]
async fn test_view_with_capability_token_rewrites_links() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;

    let grant = secure_token(&app, &client.token, report_id).await;
    let token = grant["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 43);
    assert_eq!(grant["expires_in"], 1800);
    assert_eq!(grant["allow_download"], false);

    let response = app
        .client()
        .get(&report_path(report_id, "/view"))
        .add_query_param("token", &token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/html; charset=utf-8");
    assert_eq!(response.header("content-security-policy"), "frame-ancestors 'self'");
    assert_eq!(response.header("x-frame-options"), "SAMEORIGIN");
    assert_eq!(
        response.header("cache-control"),
        "no-cache, no-store, must-revalidate"
    );

    let html = response.text();
    assert!(html.contains(&format!(r#"href="assets/style.css?token={}""#, token)));
    assert!(html.contains(&format!(r#"src="chart.png?token={}""#, token)));
    assert!(html.contains(r#"href="https://example.com/""#));
    assert!(html.contains(r##"href="#top""##));
}

#[tokio::test]
async fn test_view_requires_token_or_bearer() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;

    let anonymous = app.client().get(&report_path(report_id, "/view")).await;
    assert_eq!(anonymous.status_code(), 401);

    let bogus = app
        .client()
        .get(&report_path(report_id, "/view"))
        .add_query_param("token", "definitely-not-issued")
        .await;
    assert_eq!(bogus.status_code(), 401);

    // Bearer works too, and without a token the page is served as stored
    let with_bearer = app
        .client()
        .get(&report_path(report_id, "/view"))
        .add_header("Authorization", bearer(&client.token))
        .await;
    with_bearer.assert_status_ok();
    assert_eq!(with_bearer.text(), MAIN_HTML);
}

#[tokio::test]
async fn test_rejected_token_is_not_written_into_links() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;

    // A stale token next to a valid bearer: the bearer wins, and the page
    // must not send the dead token on to its assets
    let response = app
        .client()
        .get(&report_path(report_id, "/view"))
        .add_query_param("token", "expired-or-never-issued")
        .add_header("Authorization", bearer(&client.token))
        .await;
    response.assert_status_ok();
    let html = response.text();
    assert!(!html.contains("token="));
    assert_eq!(html, MAIN_HTML);
}

#[tokio::test]
async fn test_token_is_bound_to_its_report() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;
    let other_report = upload_bundle(&app, client.company_id, "Q2 Review", false).await;

    let grant = secure_token(&app, &client.token, report_id).await;
    let token = grant["token"].as_str().unwrap();

    let response = app
        .client()
        .get(&report_path(other_report, "/view"))
        .add_query_param("token", token)
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_assets_served_with_token() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;
    let grant = secure_token(&app, &client.token, report_id).await;
    let token = grant["token"].as_str().unwrap();

    // Relative `assets/style.css` from the view page
    let css = app
        .client()
        .get(&report_path(report_id, "/assets/style.css"))
        .add_query_param("token", token)
        .await;
    css.assert_status_ok();
    assert_eq!(css.header("content-type"), "text/css; charset=utf-8");
    assert_eq!(css.text(), "body { color: #333; }");

    // Catch-all route for `chart.png`
    let png = app
        .client()
        .get(&report_path(report_id, "/chart.png"))
        .add_query_param("token", token)
        .await;
    png.assert_status_ok();
    assert_eq!(png.header("content-type"), "image/png");
    assert_eq!(png.as_bytes().as_ref(), b"\x89PNG fake image");
}

#[tokio::test]
async fn test_assets_link_prefers_nested_file() {
    let app = setup_test_app().await;
    let company_id = create_company(&app, "Acme").await;
    let client = create_client(&app, company_id, "alice@acme.test").await;

    let bundle = build_zip(&[
        ("main.html", br#"<html><body><img src="assets/logo.png"></body></html>"#),
        ("assets/logo.png", b"nested logo"),
        ("logo.png", b"root logo"),
    ]);
    let response = upload(&app, company_id, "Branding", false, vec![("bundle.zip", bundle)]).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let report_id = Uuid::parse_str(body["report_id"].as_str().unwrap()).unwrap();

    let grant = secure_token(&app, &client.token, report_id).await;
    let token = grant["token"].as_str().unwrap();

    let nested = app
        .client()
        .get(&report_path(report_id, "/assets/logo.png"))
        .add_query_param("token", token)
        .await;
    nested.assert_status_ok();
    assert_eq!(nested.as_bytes().as_ref(), b"nested logo");

    let root = app
        .client()
        .get(&report_path(report_id, "/logo.png"))
        .add_query_param("token", token)
        .await;
    root.assert_status_ok();
    assert_eq!(root.as_bytes().as_ref(), b"root logo");
}

#[tokio::test]
async fn test_asset_containment() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;
    let grant = secure_token(&app, &client.token, report_id).await;
    let token = grant["token"].as_str().unwrap();

    for escape in ["/assets/..%2F..%2F..%2Fetc%2Fpasswd", "/..%2F..%2Fsecret.txt"] {
        let response = app
            .client()
            .get(&report_path(report_id, escape))
            .add_query_param("token", token)
            .await;
        assert_eq!(response.status_code(), 403, "{}", escape);
    }

    let missing = app
        .client()
        .get(&report_path(report_id, "/assets/missing.png"))
        .add_query_param("token", token)
        .await;
    assert_eq!(missing.status_code(), 404);
}

#[tokio::test]
async fn test_view_counts() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;

    // Metadata fetch by a client counts, by an admin does not
    app.client()
        .get(&report_path(report_id, ""))
        .add_header("Authorization", bearer(&client.token))
        .await
        .assert_status_ok();
    app.client()
        .get(&report_path(report_id, ""))
        .add_header("Authorization", bearer(&app.admin_token))
        .await
        .assert_status_ok();
    assert_eq!(admin_report(&app, report_id).await["view_count"], 1);

    // Two concurrent entry-page views both land
    let first = app
        .client()
        .get(&report_path(report_id, "/view"))
        .add_header("Authorization", bearer(&client.token));
    let second = app
        .client()
        .get(&report_path(report_id, "/view"))
        .add_header("Authorization", bearer(&client.token));
    let (first, second) = tokio::join!(first, second);
    first.assert_status_ok();
    second.assert_status_ok();

    assert_eq!(admin_report(&app, report_id).await["view_count"], 3);

    let logs = app
        .client()
        .get(&api_path("/admin/activity-logs"))
        .add_query_param("activity_type", "report_view")
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    let logs: Vec<Value> = logs.json();
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|l| l["metadata"]["report_id"] == report_id.to_string()));
}

#[tokio::test]
async fn test_download_disabled_for_clients() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(false).await;
    let main_file = admin_report(&app, report_id).await["main_file"]
        .as_str()
        .unwrap()
        .to_string();

    let denied = app
        .client()
        .get(&report_path(report_id, "/download"))
        .add_query_param("file_path", &main_file)
        .add_header("Authorization", bearer(&client.token))
        .await;
    assert_eq!(denied.status_code(), 403);

    // Administrators may always download
    let allowed = app
        .client()
        .get(&report_path(report_id, "/download"))
        .add_query_param("file_path", &main_file)
        .add_header("Authorization", bearer(&app.admin_token))
        .await;
    allowed.assert_status_ok();
    assert_eq!(
        allowed.header("content-disposition"),
        "attachment; filename=\"main.html\"; filename*=UTF-8''main.html"
    );
    assert_eq!(allowed.text(), MAIN_HTML);
    assert_eq!(admin_report(&app, report_id).await["download_count"], 1);
}

#[tokio::test]
async fn test_download_only_recorded_files() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(true).await;

    let ok = app
        .client()
        .get(&report_path(report_id, "/download"))
        .add_query_param("file_path", "Acme/Q1 Review/chart.png")
        .add_header("Authorization", bearer(&client.token))
        .await;
    ok.assert_status_ok();
    assert_eq!(ok.header("content-type"), "image/png");

    for path in ["Acme/Q1 Review/other.png", "../../etc/passwd"] {
        let response = app
            .client()
            .get(&report_path(report_id, "/download"))
            .add_query_param("file_path", path)
            .add_header("Authorization", bearer(&client.token))
            .await;
        assert_eq!(response.status_code(), 403, "{:?}", path);
    }

    // Downloads need a bearer; a capability token is not enough
    let grant = secure_token(&app, &client.token, report_id).await;
    let anonymous = app
        .client()
        .get(&report_path(report_id, "/download"))
        .add_query_param("file_path", "Acme/Q1 Review/chart.png")
        .add_query_param("token", grant["token"].as_str().unwrap())
        .await;
    assert_eq!(anonymous.status_code(), 401);
}

#[tokio::test]
async fn test_download_defaults_to_entry_point() {
    let Scenario {
        app,
        client,
        report_id,
    } = scenario(true).await;

    let response = app
        .client()
        .get(&report_path(report_id, "/download"))
        .add_header("Authorization", bearer(&client.token))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"main.html\"; filename*=UTF-8''main.html"
    );
    assert_eq!(response.text(), MAIN_HTML);

    // A blank file_path means the same thing
    let blank = app
        .client()
        .get(&report_path(report_id, "/download"))
        .add_query_param("file_path", "")
        .add_header("Authorization", bearer(&client.token))
        .await;
    blank.assert_status_ok();
    assert_eq!(blank.text(), MAIN_HTML);

    assert_eq!(admin_report(&app, report_id).await["download_count"], 2);
}
