//! Audit trail for authentication and catalog mutations.
//!
//! Events go to the `audit` tracing target so they can be routed apart from
//! application logs.
//!
//! ```ignore
//! use axum_helpers::audit::{AuditEvent, AuditOutcome, extract_ip_from_headers};
//!
//! AuditEvent::new(Some(user.user_id), "product.delete", Some(format!("product:{}", id)), AuditOutcome::Success)
//!     .with_ip(extract_ip_from_headers(&headers))
//!     .log();
//! ```

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    /// Rejected input or bad credentials
    Failure,
    Denied,
}

#[derive(Debug, Serialize)]
pub struct AuditEvent {
    /// Acting user, if known
    pub user_id: Option<Uuid>,
    /// Dotted action name, e.g. `auth.login` or `product.update`
    pub action: String,
    /// `kind:id` of the affected record
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        user_id: Option<Uuid>,
        action: impl Into<String>,
        resource: Option<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            user_id,
            action: action.into(),
            resource,
            outcome,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Attach request metadata taken from `headers`.
    pub fn with_request(self, headers: &HeaderMap) -> Self {
        self.with_ip(extract_ip_from_headers(headers))
            .with_user_agent(extract_user_agent(headers))
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn log(self) {
        let user_id = self.user_id.map(|id| id.to_string());
        let details = self.details.as_ref().map(|d| d.to_string());

        match self.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "audit",
                user_id,
                action = %self.action,
                resource = self.resource,
                outcome = ?self.outcome,
                ip = self.ip_address,
                user_agent = self.user_agent,
                timestamp = %self.timestamp,
                details,
                "audit event"
            ),
            AuditOutcome::Failure | AuditOutcome::Denied => tracing::warn!(
                target: "audit",
                user_id,
                action = %self.action,
                resource = self.resource,
                outcome = ?self.outcome,
                ip = self.ip_address,
                user_agent = self.user_agent,
                timestamp = %self.timestamp,
                details,
                "audit event"
            ),
        }
    }
}

/// First address of `X-Forwarded-For`, falling back to `X-Real-IP`.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
