//! Viewing capability tokens.
//!
//! A capability is an opaque random token bound to one (user, report) pair
//! for a fixed lifetime. It lets the browser fetch a report's entry page and
//! every sub-resource without a bearer header. Tokens live only in process
//! memory and are lost on restart.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

/// Random bytes per token (43 characters once encoded)
const TOKEN_BYTES: usize = 32;

/// A freshly minted capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityGrant {
    pub token: String,
    pub expires_in_seconds: u64,
}

#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// Mint a token granting `user_id` access to `report_id`
    async fn issue(&self, user_id: Uuid, report_id: Uuid) -> CapabilityGrant;

    /// The user a token was minted for, if it is known, bound to `report_id`
    /// and unexpired. Expired tokens are purged when presented.
    async fn validate(&self, token: &str, report_id: Uuid) -> Option<Uuid>;

    /// Number of tokens currently held
    async fn len(&self) -> usize;
}

#[derive(Debug, Clone)]
struct CapabilityEntry {
    user_id: Uuid,
    report_id: Uuid,
    expires_at: Instant,
}

/// Process-local capability table
pub struct InMemoryCapabilityStore {
    entries: RwLock<HashMap<String, CapabilityEntry>>,
    ttl: Duration,
}

impl InMemoryCapabilityStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn generate_token() -> String {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[async_trait]
impl CapabilityStore for InMemoryCapabilityStore {
    async fn issue(&self, user_id: Uuid, report_id: Uuid) -> CapabilityGrant {
        let token = Self::generate_token();
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            token.clone(),
            CapabilityEntry {
                user_id,
                report_id,
                expires_at: now + self.ttl,
            },
        );

        tracing::debug!(user_id = %user_id, report_id = %report_id, active = entries.len(), "Capability issued");

        CapabilityGrant {
            token,
            expires_in_seconds: self.ttl.as_secs(),
        }
    }

    async fn validate(&self, token: &str, report_id: Uuid) -> Option<Uuid> {
        let entry = self.entries.read().await.get(token).cloned()?;

        if entry.expires_at <= Instant::now() {
            self.entries.write().await.remove(token);
            tracing::debug!(report_id = %entry.report_id, "Capability expired");
            return None;
        }

        if entry.report_id != report_id {
            tracing::debug!(
                bound_to = %entry.report_id,
                requested = %report_id,
                "Capability presented for another report"
            );
            return None;
        }

        Some(entry.user_id)
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
