//! Upload notifications over SMTP.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use vantage_core::Config;

/// Someone to tell about a new report
#[derive(Debug, Clone)]
pub struct Recipient {
    pub email: String,
    pub full_name: String,
}

/// A newly published report
#[derive(Debug, Clone)]
pub struct ReportNotice {
    pub report_title: String,
    pub company_name: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one email per recipient and return how many were sent.
    /// Failures are logged, never returned.
    async fn notify_new_report(&self, recipients: &[Recipient], notice: &ReportNotice) -> usize;
}

/// Used when notifications are disabled or SMTP is not configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify_new_report(&self, recipients: &[Recipient], _notice: &ReportNotice) -> usize {
        if !recipients.is_empty() {
            tracing::debug!(
                recipients = recipients.len(),
                "Email notifications disabled, skipping"
            );
        }
        0
    }
}

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    portal_url: Option<String>,
}

impl SmtpNotifier {
    /// Returns `None` if notifications are disabled or SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.email_notifications_enabled() {
            tracing::debug!("Email notifications disabled (EMAIL_NOTIFICATIONS_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host()?;
        let from: Mailbox = match config.smtp_from()?.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid SMTP_FROM, email notifications disabled");
                return None;
            }
        };
        let port = config.smtp_port().unwrap_or(587);
        let credentials = match (config.smtp_user(), config.smtp_password()) {
            (Some(u), Some(p)) => Some(Credentials::new(u.to_string(), p.to_string())),
            _ => None,
        };

        let mailer = if config.smtp_tls() {
            let b = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(b) => b.port(port),
                Err(e) => {
                    tracing::warn!(host = %host, error = %e, "Failed to configure SMTP relay");
                    return None;
                }
            };
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Email notifier initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Email notifier initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
            portal_url: config.portal_url().map(str::to_string),
        })
    }

    fn compose(&self, recipient: &Recipient, notice: &ReportNotice) -> Result<Message, String> {
        let to: Mailbox = recipient
            .email
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(format!("New report available: {}", notice.report_title))
            .header(ContentType::TEXT_PLAIN)
            .body(report_body(recipient, notice, self.portal_url.as_deref()))
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_new_report(&self, recipients: &[Recipient], notice: &ReportNotice) -> usize {
        let mut sent = 0;
        for recipient in recipients {
            let result = match self.compose(recipient, notice) {
                Ok(message) => self.mailer.send(message).await.map_err(|e| e.to_string()),
                Err(e) => Err(e),
            };
            match result {
                Ok(_) => sent += 1,
                Err(e) => tracing::warn!(
                    recipient = %recipient.email,
                    error = %e,
                    "Failed to send report notification"
                ),
            }
        }
        tracing::info!(sent, total = recipients.len(), "Report notifications sent");
        sent
    }
}

fn report_body(recipient: &Recipient, notice: &ReportNotice, portal_url: Option<&str>) -> String {
    let mut body = format!(
        "Hello {},\n\nA new report has been published for {}:\n\n    {}\n",
        recipient.full_name, notice.company_name, notice.report_title
    );
    if let Some(url) = portal_url {
        body.push_str(&format!(
            "\nSign in to view it: {}/login\n",
            url.trim_end_matches('/')
        ));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient() -> Recipient {
        Recipient {
            email: "viewer@acme.test".to_string(),
            full_name: "Ada Viewer".to_string(),
        }
    }

    fn notice() -> ReportNotice {
        ReportNotice {
            report_title: "Q3 Results".to_string(),
            company_name: "Acme".to_string(),
        }
    }

    #[tokio::test]
    async fn test_noop_sends_nothing() {
        assert_eq!(NoopNotifier.notify_new_report(&[recipient()], &notice()).await, 0);
    }

    #[test]
    fn test_body_mentions_report_and_portal() {
        let body = report_body(&recipient(), &notice(), Some("https://portal.acme.test/"));
        assert!(body.starts_with("Hello Ada Viewer,"));
        assert!(body.contains("Q3 Results"));
        assert!(body.contains("for Acme"));
        assert!(body.contains("https://portal.acme.test/login"));

        let body = report_body(&recipient(), &notice(), None);
        assert!(!body.contains("login"));
    }
}
