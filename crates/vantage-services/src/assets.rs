//! Report visibility, viewing capabilities and file serving.
//!
//! Every read goes through the same sequence: load the report, apply the
//! access policy, resolve the file inside the report's directory, and
//! rewrite HTML when the request carries a capability token.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use vantage_core::models::{ActivityType, Caller, NewActivity, Report};
use vantage_core::AppError;
use vantage_db::Stores;
use vantage_storage::{is_html, ByteStream, ReportStorage, ResolvedAsset};

use crate::activity::ActivityLogger;
use crate::capability::CapabilityStore;
use crate::policy;
use crate::rewrite::rewrite;

/// Where a request came from, for the activity log
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SecureViewToken {
    pub token: String,
    pub expires_in: u64,
    pub allow_download: bool,
}

pub enum AssetBody {
    /// Fully read (and possibly rewritten) content
    Full(Bytes),
    /// File streamed from disk with its size
    Stream(ByteStream, u64),
}

pub struct ServedAsset {
    pub content_type: &'static str,
    pub body: AssetBody,
    /// Attachment name for downloads
    pub filename: Option<String>,
}

#[derive(Clone)]
pub struct AssetService {
    stores: Stores,
    storage: Arc<ReportStorage>,
    capabilities: Arc<dyn CapabilityStore>,
    activity: ActivityLogger,
}

impl AssetService {
    pub fn new(
        stores: Stores,
        storage: Arc<ReportStorage>,
        capabilities: Arc<dyn CapabilityStore>,
        activity: ActivityLogger,
    ) -> Self {
        Self {
            stores,
            storage,
            capabilities,
            activity,
        }
    }

    /// The report, if `caller` may see it. Missing and foreign reports are
    /// both `NotFound`.
    pub async fn visible_report(&self, caller: &Caller, report_id: Uuid) -> Result<Report, AppError> {
        let report = self
            .stores
            .reports
            .find_report(report_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;
        policy::authorize_view(caller, &report)?;
        Ok(report)
    }

    /// Published reports visible to the caller, newest first
    pub async fn list_for_caller(&self, caller: &Caller) -> Result<Vec<Report>, AppError> {
        let company = if caller.is_admin() {
            None
        } else {
            Some(caller.company_id)
        };
        self.stores.reports.list_reports(company, true).await
    }

    /// Report metadata. Counts as a view when the caller is a client.
    #[tracing::instrument(skip(self, caller, context), fields(user_id = %caller.user_id))]
    pub async fn report_metadata(
        &self,
        caller: &Caller,
        report_id: Uuid,
        context: &ClientContext,
    ) -> Result<Report, AppError> {
        let mut report = self.visible_report(caller, report_id).await?;

        if !caller.is_admin() && self.stores.reports.increment_view_count(report.id).await? {
            report.view_count += 1;
            self.record_access(caller, &report, ActivityType::ReportView, context, None)
                .await;
        }

        Ok(report)
    }

    /// Mint a viewing capability for the report
    pub async fn secure_view_token(
        &self,
        caller: &Caller,
        report_id: Uuid,
    ) -> Result<SecureViewToken, AppError> {
        let report = self.visible_report(caller, report_id).await?;
        let grant = self.capabilities.issue(caller.user_id, report.id).await;

        Ok(SecureViewToken {
            token: grant.token,
            expires_in: grant.expires_in_seconds,
            allow_download: policy::effective_allow_download(caller, &report),
        })
    }

    /// Resolve a capability token into the caller it was minted for.
    /// Inactive or deleted users yield `None`.
    pub async fn caller_from_capability(
        &self,
        token: &str,
        report_id: Uuid,
    ) -> Result<Option<Caller>, AppError> {
        let Some(user_id) = self.capabilities.validate(token, report_id).await else {
            return Ok(None);
        };

        let caller = self
            .stores
            .users
            .find_user(user_id)
            .await?
            .filter(|u| u.active)
            .map(|u| Caller::from(&u));
        Ok(caller)
    }

    /// Serve the report's entry point and count the view
    #[tracing::instrument(skip(self, caller, token, context), fields(user_id = %caller.user_id))]
    pub async fn view_entry(
        &self,
        caller: &Caller,
        report_id: Uuid,
        token: Option<&str>,
        context: &ClientContext,
    ) -> Result<ServedAsset, AppError> {
        let report = self.visible_report(caller, report_id).await?;
        if report.main_file.is_empty() {
            return Err(AppError::NotFound("Report has no entry point".to_string()));
        }

        let resolved = self.storage.resolve_stored(&report.main_file).await?;
        let served = self.serve(resolved, token).await?;

        if self.stores.reports.increment_view_count(report.id).await? {
            self.record_access(caller, &report, ActivityType::ReportView, context, None)
                .await;
        }

        Ok(served)
    }

    /// Serve a file requested relative to the entry point's directory
    pub async fn asset(
        &self,
        caller: &Caller,
        report_id: Uuid,
        path: &str,
        token: Option<&str>,
    ) -> Result<ServedAsset, AppError> {
        let report = self.visible_report(caller, report_id).await?;
        let resolved = self.storage.resolve_asset(&report.main_file, path).await?;

        tracing::debug!(
            report_id = %report.id,
            path = %path,
            size_bytes = resolved.size,
            "Serving report asset"
        );

        self.serve(resolved, token).await
    }

    /// Serve one of the report's recorded files as an attachment. Without an
    /// explicit path the entry point is served.
    #[tracing::instrument(skip(self, caller, context), fields(user_id = %caller.user_id))]
    pub async fn download(
        &self,
        caller: &Caller,
        report_id: Uuid,
        file_path: Option<&str>,
        context: &ClientContext,
    ) -> Result<ServedAsset, AppError> {
        let report = self.visible_report(caller, report_id).await?;
        policy::authorize_download(caller, &report)?;
        let file_path = match file_path {
            Some(path) => {
                policy::authorize_file(&report, path)?;
                path
            }
            None if report.main_file.is_empty() => {
                return Err(AppError::NotFound("Report has no entry point".to_string()));
            }
            None => report.main_file.as_str(),
        };

        let resolved = self.storage.resolve_stored(file_path).await?;
        let filename = file_path
            .rsplit('/')
            .next()
            .unwrap_or(file_path)
            .to_string();
        let stream = self.storage.open_stream(&resolved).await?;

        if self.stores.reports.increment_download_count(report.id).await? {
            self.record_access(
                caller,
                &report,
                ActivityType::ReportDownload,
                context,
                Some(file_path),
            )
            .await;
        }

        Ok(ServedAsset {
            content_type: resolved.content_type,
            body: AssetBody::Stream(stream, resolved.size),
            filename: Some(filename),
        })
    }

    async fn serve(
        &self,
        resolved: ResolvedAsset,
        token: Option<&str>,
    ) -> Result<ServedAsset, AppError> {
        let body = match token {
            Some(token) if is_html(&resolved.path) => {
                let raw = self.storage.read(&resolved).await?;
                let html = String::from_utf8_lossy(&raw);
                AssetBody::Full(Bytes::from(rewrite(&html, token)))
            }
            _ => AssetBody::Stream(self.storage.open_stream(&resolved).await?, resolved.size),
        };

        Ok(ServedAsset {
            content_type: resolved.content_type,
            body,
            filename: None,
        })
    }

    async fn record_access(
        &self,
        caller: &Caller,
        report: &Report,
        activity_type: ActivityType,
        context: &ClientContext,
        file_path: Option<&str>,
    ) {
        let verb = match activity_type {
            ActivityType::ReportDownload => "Downloaded",
            _ => "Viewed",
        };
        let mut metadata = serde_json::json!({ "report_id": report.id });
        if let Some(path) = file_path {
            metadata["file_path"] = serde_json::Value::from(path);
        }

        self.activity
            .record(
                NewActivity::new(activity_type, format!("{} report: {}", verb, report.title))
                    .by(caller.user_id, caller.email.clone())
                    .client(context.ip_address.clone(), context.user_agent.clone())
                    .metadata(metadata),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::InMemoryCapabilityStore;
    use chrono::Utc;
    use futures::StreamExt;
    use std::time::Duration;
    use tempfile::TempDir;
    use vantage_core::models::{ActivityFilter, Company, ReportStatus, User, UserRole};
    use vantage_storage::UploadItem;

    struct Fixture {
        _dir: TempDir,
        stores: Stores,
        service: AssetService,
        report: Report,
        client: Caller,
        outsider: Caller,
    }

    fn user(company_id: Uuid, role: UserRole, email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: "Test User".to_string(),
            company_id,
            role,
            active: true,
            password_hash: "hash".to_string(),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn fixture(allow_download: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let stores = Stores::in_memory();
        let storage = Arc::new(ReportStorage::new(dir.path().join("uploads")).await.unwrap());

        let acme = stores
            .companies
            .insert_company(Company::new("Acme".to_string(), None))
            .await
            .unwrap();
        let other = stores
            .companies
            .insert_company(Company::new("Other".to_string(), None))
            .await
            .unwrap();
        let client = stores
            .users
            .insert_user(user(acme.id, UserRole::Client, "client@acme.test"))
            .await
            .unwrap();
        let outsider = stores
            .users
            .insert_user(user(other.id, UserRole::Client, "client@other.test"))
            .await
            .unwrap();

        let outcome = storage
            .ingest(
                "Acme",
                "Q3",
                vec![
                    UploadItem::new("main.html", r#"<img src="chart.png"><a href="https://x.test">"#),
                    UploadItem::new("chart.png", vec![1u8, 2, 3]),
                ],
                &["html".to_string(), "png".to_string()],
            )
            .await
            .unwrap();

        let now = Utc::now();
        let report = stores
            .reports
            .insert_report(Report {
                id: Uuid::new_v4(),
                title: "Q3".to_string(),
                description: None,
                company_id: acme.id,
                status: ReportStatus::Published,
                tags: vec![],
                main_file: outcome.entry_point,
                supporting_files: outcome.supporting_files,
                file_size: outcome.total_size as i64,
                view_count: 0,
                download_count: 0,
                allow_download,
                uploaded_by: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let service = AssetService::new(
            stores.clone(),
            storage,
            Arc::new(InMemoryCapabilityStore::new(Duration::from_secs(1800))),
            ActivityLogger::new(stores.activities.clone()),
        );

        Fixture {
            _dir: dir,
            stores,
            service,
            report,
            client: Caller::from(&client),
            outsider: Caller::from(&outsider),
        }
    }

    async fn collect(body: AssetBody) -> Vec<u8> {
        match body {
            AssetBody::Full(bytes) => bytes.to_vec(),
            AssetBody::Stream(mut stream, _) => {
                let mut out = Vec::new();
                while let Some(chunk) = stream.next().await {
                    out.extend_from_slice(&chunk.unwrap());
                }
                out
            }
        }
    }

    #[tokio::test]
    async fn test_cross_tenant_is_not_found() {
        let f = fixture(true).await;
        let foreign = f.service.visible_report(&f.outsider, f.report.id).await;
        let missing = f.service.visible_report(&f.client, Uuid::new_v4()).await;
        assert!(matches!(foreign, Err(AppError::NotFound(_))));
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_capability_round_trip() {
        let f = fixture(false).await;
        let grant = f.service.secure_view_token(&f.client, f.report.id).await.unwrap();
        assert_eq!(grant.expires_in, 1800);
        assert!(!grant.allow_download);

        let caller = f
            .service
            .caller_from_capability(&grant.token, f.report.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(caller.user_id, f.client.user_id);

        assert!(f
            .service
            .caller_from_capability(&grant.token, Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_view_rewrites_links_and_counts() {
        let f = fixture(false).await;
        let served = f
            .service
            .view_entry(&f.client, f.report.id, Some("tok"), &ClientContext::default())
            .await
            .unwrap();
        assert_eq!(served.content_type, "text/html; charset=utf-8");

        let html = String::from_utf8(collect(served.body).await).unwrap();
        assert!(html.contains(r#"src="chart.png?token=tok""#));
        assert!(html.contains(r#"href="https://x.test""#));

        let report = f.stores.reports.find_report(f.report.id).await.unwrap().unwrap();
        assert_eq!(report.view_count, 1);

        let logs = f
            .stores
            .activities
            .list_activities(&ActivityFilter::default())
            .await
            .unwrap();
        assert_eq!(logs[0].activity_type, ActivityType::ReportView);
    }

    #[tokio::test]
    async fn test_concurrent_views_each_count() {
        let f = fixture(false).await;
        let ctx_a = ClientContext::default();
        let ctx_b = ClientContext::default();
        let (a, b) = tokio::join!(
            f.service
                .view_entry(&f.client, f.report.id, None, &ctx_a),
            f.service
                .view_entry(&f.client, f.report.id, None, &ctx_b),
        );
        assert!(a.is_ok() && b.is_ok());

        let report = f.stores.reports.find_report(f.report.id).await.unwrap().unwrap();
        assert_eq!(report.view_count, 2);
    }

    #[tokio::test]
    async fn test_asset_resolution() {
        let f = fixture(false).await;
        let served = f
            .service
            .asset(&f.client, f.report.id, "chart.png", Some("tok"))
            .await
            .unwrap();
        assert_eq!(served.content_type, "image/png");
        assert_eq!(collect(served.body).await, vec![1, 2, 3]);

        let escape = f
            .service
            .asset(&f.client, f.report.id, "../../etc/passwd", None)
            .await;
        assert!(matches!(escape, Err(AppError::Forbidden(_))));

        let missing = f.service.asset(&f.client, f.report.id, "nope.png", None).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_metadata_counts_client_views_only() {
        let f = fixture(false).await;
        let admin = Caller {
            user_id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
            company_id: Uuid::new_v4(),
        };

        let seen = f
            .service
            .report_metadata(&f.client, f.report.id, &ClientContext::default())
            .await
            .unwrap();
        assert_eq!(seen.view_count, 1);

        let seen = f
            .service
            .report_metadata(&admin, f.report.id, &ClientContext::default())
            .await
            .unwrap();
        assert_eq!(seen.view_count, 1);
    }

    #[tokio::test]
    async fn test_download_rules() {
        let locked = fixture(false).await;
        let entry = locked.report.main_file.clone();
        let denied = locked
            .service
            .download(
                &locked.client,
                locked.report.id,
                Some(entry.as_str()),
                &ClientContext::default(),
            )
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let open = fixture(true).await;
        let chart = open.report.supporting_files[0].clone();
        let served = open
            .service
            .download(
                &open.client,
                open.report.id,
                Some(chart.as_str()),
                &ClientContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(served.filename.as_deref(), Some("chart.png"));

        let stranger = open
            .service
            .download(
                &open.client,
                open.report.id,
                Some("Acme/Q3/../../secret.txt"),
                &ClientContext::default(),
            )
            .await;
        assert!(matches!(stranger, Err(AppError::Forbidden(_))));

        let report = open.stores.reports.find_report(open.report.id).await.unwrap().unwrap();
        assert_eq!(report.download_count, 1);
    }

    #[tokio::test]
    async fn test_download_defaults_to_entry_point() {
        let f = fixture(true).await;
        let served = f
            .service
            .download(&f.client, f.report.id, None, &ClientContext::default())
            .await
            .unwrap();
        assert_eq!(served.filename.as_deref(), Some("main.html"));
        assert_eq!(served.content_type, "text/html; charset=utf-8");

        let logs = f
            .stores
            .activities
            .list_activities(&ActivityFilter::default())
            .await
            .unwrap();
        assert_eq!(logs[0].activity_type, ActivityType::ReportDownload);
        assert_eq!(logs[0].metadata["file_path"], f.report.main_file.as_str());
    }

    #[tokio::test]
    async fn test_download_without_entry_point_is_not_found() {
        let f = fixture(true).await;
        let mut empty = f.report.clone();
        empty.id = Uuid::new_v4();
        empty.main_file = String::new();
        empty.supporting_files = vec![];
        f.stores.reports.insert_report(empty.clone()).await.unwrap();

        let result = f
            .service
            .download(&f.client, empty.id, None, &ClientContext::default())
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
