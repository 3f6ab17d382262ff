//! Admin reporting endpoints
//!
//! The backend answers 403 for non-admin tokens; that surfaces as an
//! ordinary client error and does not touch the session.

use crate::error::Result;
use crate::http::{ApiClient, ApiRequest};
use crate::models::{
    ActivityDay, Analytics, Application, ApplicationFilter, CacheInvalidation, CacheStatsReport,
    CacheWarmup, MetricsReport, NotificationSummary, RegisterRequest, User,
};
use serde_json::json;

/// `/admin/*` calls
pub struct AdminApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AdminApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Aggregate analytics across all students
    pub async fn analytics(&self) -> Result<Analytics> {
        self.client.get("/admin/analytics").await
    }

    /// All student accounts
    pub async fn students(&self) -> Result<Vec<User>> {
        self.client.get("/admin/students").await
    }

    /// Applications across all students
    pub async fn applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let request = ApiRequest::get("/admin/applications").queries(filter.to_query());
        self.client.execute(request).await
    }

    /// Platform-wide daily activity
    pub async fn activity(&self) -> Result<Vec<ActivityDay>> {
        self.client.get("/admin/activity").await
    }

    /// Daily activity of one user
    pub async fn user_activity(&self, user_id: i64) -> Result<Vec<ActivityDay>> {
        self.client
            .get(&format!("/admin/users/{user_id}/activity"))
            .await
    }

    /// Applications with no update for `days` (backend default: 7)
    ///
    /// Admins see every stale application, students only their own.
    pub async fn stale_applications(&self, days: Option<u32>) -> Result<Vec<Application>> {
        let request = with_days(ApiRequest::get("/notifications/stale"), days);
        self.client.execute(request).await
    }

    /// Send reminder emails for stale applications now
    pub async fn trigger_notifications(&self, days: Option<u32>) -> Result<NotificationSummary> {
        let request = with_days(ApiRequest::post("/admin/notifications/trigger"), days);
        self.client.execute(request).await
    }

    /// Create an account as an admin
    ///
    /// The backend makes it an admin account unless `request.role` says
    /// otherwise; no admin code is needed.
    pub async fn register_admin(&self, request: &RegisterRequest) -> Result<User> {
        self.client.post("/admin/register", request).await
    }

    /// Anonymized metrics over the last `days` (backend default: 30)
    pub async fn metrics(&self, days: Option<u32>) -> Result<MetricsReport> {
        let request = with_days(ApiRequest::get("/admin/metrics"), days);
        self.client.execute(request).await
    }

    pub async fn cache_stats(&self) -> Result<CacheStatsReport> {
        self.client.get("/admin/cache-stats").await
    }

    /// Drop cached entries whose keys match `pattern`
    pub async fn invalidate_cache(&self, pattern: &str) -> Result<CacheInvalidation> {
        self.client
            .post("/admin/cache-invalidate", &json!({ "pattern": pattern }))
            .await
    }

    pub async fn warm_cache(&self) -> Result<CacheWarmup> {
        self.client
            .execute(ApiRequest::post("/admin/cache-warm"))
            .await
    }
}

fn with_days(request: ApiRequest, days: Option<u32>) -> ApiRequest {
    match days {
        Some(days) => request.query("days", days.to_string()),
        None => request,
    }
}
