use std::io::{Cursor, Write};

use axum_test::multipart::{MultipartForm, Part};
use serde_json::Value;
use uuid::Uuid;
use zip::write::{FileOptions, ZipWriter};

use super::auth::bearer;
use super::{api_path, TestApp};

pub const MAIN_HTML: &str = r##"<html><head><link href="assets/style.css" rel="stylesheet"></head>
<body><img src="chart.png"><a href="https://example.com/">ext</a><a href="#top">top</a></body></html>"##;

pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        for (name, data) in entries {
            zip.start_file(*name, FileOptions::default())
                .expect("Failed to start zip entry");
            zip.write_all(data).expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish zip");
    }
    buffer
}

/// Zip bundle with an entry page, a stylesheet, an image and macOS junk
pub fn report_bundle() -> Vec<u8> {
    build_zip(&[
        ("main.html", MAIN_HTML.as_bytes()),
        ("assets/style.css", b"body { color: #333; }"),
        ("chart.png", b"\x89PNG fake image"),
        ("__MACOSX/._main.html", b"resource fork"),
    ])
}

/// Upload files as a report; returns the raw response for status assertions
pub async fn upload(
    app: &TestApp,
    company_id: Uuid,
    title: &str,
    allow_download: bool,
    files: Vec<(&str, Vec<u8>)>,
) -> axum_test::TestResponse {
    let mut form = MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("description", "Quarterly numbers")
        .add_text("company_id", company_id.to_string())
        .add_text("allow_download", allow_download.to_string())
        .add_text("notify_users", "false");
    for (name, data) in files {
        form = form.add_part("files", Part::bytes(data).file_name(name.to_string()));
    }

    app.client()
        .post(&api_path("/admin/reports/upload"))
        .add_header("Authorization", bearer(&app.admin_token))
        .multipart(form)
        .await
}

/// Upload the standard bundle and return the new report id
pub async fn upload_bundle(app: &TestApp, company_id: Uuid, title: &str, allow_download: bool) -> Uuid {
    let response = upload(
        app,
        company_id,
        title,
        allow_download,
        vec![("bundle.zip", report_bundle())],
    )
    .await;
    response.assert_status_ok();

    let body: Value = response.json();
    Uuid::parse_str(body["report_id"].as_str().expect("Expected report_id")).expect("Invalid UUID")
}
