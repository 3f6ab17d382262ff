//! Wire types exchanged with the job tracker backend
//!
//! Field names follow the backend's JSON exactly (`company_name`,
//! `application_date`, ...). Response types are lenient where the backend
//! may omit fields.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Users & Auth
// ============================================================================

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Admin,
}

/// A user as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check if the user has the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Credentials for `/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Body for `/auth/register` and `/admin/register`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Only read by `/admin/register`; self-registration derives the role
    /// from `admin_code`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_code: Option<String>,
}

// ============================================================================
// Applications
// ============================================================================

/// Where an application currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Waiting,
    Rejected,
    NextStage,
    Ignored,
}

impl ApplicationStatus {
    /// Backend spelling of the status
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Waiting => "waiting",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::NextStage => "next_stage",
            ApplicationStatus::Ignored => "ignored",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "waiting" => Ok(ApplicationStatus::Waiting),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "next_stage" => Ok(ApplicationStatus::NextStage),
            "ignored" => Ok(ApplicationStatus::Ignored),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

/// A job application with its recorded stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    #[serde(default)]
    pub job_url: Option<String>,
    pub application_date: NaiveDate,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub screening: Option<StageRecord>,
    #[serde(default)]
    pub interview: Option<StageRecord>,
}

/// Body for creating an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    pub application_date: NaiveDate,
}

/// Partial update of an application; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
}

impl ApplicationUpdate {
    /// Check if the update carries no changes
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.job_url.is_none()
            && self.application_date.is_none()
            && self.status.is_none()
    }
}

/// Admin filter for `/admin/applications`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationFilter {
    pub company: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub days_stale: Option<u32>,
}

impl ApplicationFilter {
    /// Render as query parameters, skipping unset fields
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(company) = &self.company {
            query.push(("company".to_string(), company.clone()));
        }
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.to_string()));
        }
        if let Some(days) = self.days_stale {
            query.push(("days_stale".to_string(), days.to_string()));
        }
        query
    }
}

// ============================================================================
// Screening & Interview Stages
// ============================================================================

/// Which recorded stage an upload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Screening,
    Interview,
}

impl Stage {
    /// Path segment and multipart field prefix
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Screening => "screening",
            Stage::Interview => "interview",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a screening or interview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageResult {
    Passed,
    Failed,
}

impl StageResult {
    /// Backend spelling of the result
    pub fn as_str(self) -> &'static str {
        match self {
            StageResult::Passed => "passed",
            StageResult::Failed => "failed",
        }
    }
}

impl FromStr for StageResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passed" | "pass" => Ok(StageResult::Passed),
            "failed" | "fail" => Ok(StageResult::Failed),
            other => Err(format!("unknown stage result '{other}'")),
        }
    }
}

/// A screening or interview record
///
/// The backend names the date field after the stage, so both spellings are
/// accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: i64,
    pub application_id: i64,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default, alias = "screening_date", alias = "interview_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub result: Option<StageResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Activity & Analytics
// ============================================================================

/// Per-day activity counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: String,
    #[serde(default)]
    pub applications_count: i64,
    #[serde(default)]
    pub screenings_count: i64,
    #[serde(default)]
    pub interviews_count: i64,
    #[serde(default)]
    pub total_activity: i64,
}

/// Aggregate analytics served by `/admin/analytics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analytics {
    pub total_students: i64,
    pub total_applications: i64,
    pub status_breakdown: HashMap<String, i64>,
    pub company_stats: Vec<CompanyStats>,
    pub popular_job_urls: Vec<JobUrlStats>,
    pub stale_applications: Vec<Application>,
    pub screening_stats: StageStats,
    pub interview_stats: StageStats,
    pub daily_stats: Vec<DailyStat>,
    pub success_rate: SuccessRateStats,
    pub response_times: ResponseTimeStats,
    pub top_performing_students: Vec<StudentPerformance>,
}

/// Outcome counters for one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageStats {
    #[serde(alias = "total_screenings", alias = "total_interviews")]
    pub total: i64,
    pub passed: i64,
    pub failed: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyStats {
    pub company: String,
    pub application_count: i64,
    pub unique_students: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobUrlStats {
    pub job_url: String,
    pub application_count: i64,
    pub unique_students: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyStat {
    pub date: String,
    pub applications_count: i64,
    pub screenings_count: i64,
    pub interviews_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessRateStats {
    pub overall_success_rate: f64,
    pub screening_to_interview_rate: f64,
    pub interview_success_rate: f64,
    pub applications_with_urls: i64,
    pub applications_without_urls: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTimeStats {
    pub avg_days_to_screening: f64,
    pub avg_days_to_interview: f64,
    pub fastest_screening_days: i64,
    pub slowest_screening_days: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentPerformance {
    pub student_email: String,
    pub student_name: String,
    pub total_applications: i64,
    pub screenings_passed: i64,
    pub interviews_passed: i64,
    pub success_rate: f64,
}

// ============================================================================
// Maintenance
// ============================================================================

/// Outcome of a manual stale-application notification run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSummary {
    pub message: String,
    pub processed_users: u64,
    pub total_stale_applications: u64,
}

/// Anonymized metrics served by `/admin/metrics`
///
/// The metrics document itself is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsReport {
    pub metrics: serde_json::Value,
    pub cached: bool,
    pub generation_time_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    pub total_keys: u64,
    pub expired_keys: u64,
    pub memory_usage_mb: f64,
    pub hit_ratio: f64,
    pub average_retrieval_time_ms: f64,
}

/// Cache statistics plus the cleanup done while collecting them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStatsReport {
    pub cache_stats: CacheStats,
    pub cleanup_performed: bool,
    pub entries_cleaned: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheInvalidation {
    pub invalidated_count: u64,
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheWarmup {
    pub success: bool,
    pub warming_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn application_json() -> serde_json::Value {
        json!({
            "id": 7,
            "user_id": 3,
            "company_name": "Acme",
            "job_url": "https://acme.example/jobs/1",
            "application_date": "2024-03-01",
            "status": "next_stage",
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-02T10:00:00Z",
            "screening": {
                "id": 1,
                "application_id": 7,
                "file_path": "uploads/abc.mp3",
                "screening_date": "2024-03-05",
                "result": "passed",
                "created_at": "2024-03-05T10:00:00Z",
                "updated_at": "2024-03-05T10:00:00Z"
            },
            "interview": null
        })
    }

    #[test]
    fn test_application_decode() {
        let app: Application = serde_json::from_value(application_json()).unwrap();
        assert_eq!(app.company_name, "Acme");
        assert_eq!(app.status, ApplicationStatus::NextStage);
        let screening = app.screening.unwrap();
        assert_eq!(screening.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(screening.result, Some(StageResult::Passed));
        assert!(app.interview.is_none());
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let update = ApplicationUpdate {
            status: Some(ApplicationStatus::Rejected),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"status": "rejected"})
        );
        assert!(ApplicationUpdate::default().is_empty());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "next-stage".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::NextStage
        );
        assert_eq!(
            "Waiting".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Waiting
        );
        assert!("hired".parse::<ApplicationStatus>().is_err());
        assert_eq!("pass".parse::<StageResult>().unwrap(), StageResult::Passed);
    }

    #[test]
    fn test_filter_to_query() {
        let filter = ApplicationFilter {
            company: Some("Acme".to_string()),
            status: Some(ApplicationStatus::Waiting),
            days_stale: None,
        };
        assert_eq!(
            filter.to_query(),
            vec![
                ("company".to_string(), "Acme".to_string()),
                ("status".to_string(), "waiting".to_string()),
            ]
        );
    }

    #[test]
    fn test_analytics_partial_payload() {
        let analytics: Analytics = serde_json::from_value(json!({
            "total_students": 12,
            "total_applications": 40,
            "status_breakdown": {"waiting": 30, "rejected": 10},
            "screening_stats": {"total_screenings": 8, "passed": 5, "failed": 2, "pending": 1}
        }))
        .unwrap();

        assert_eq!(analytics.total_students, 12);
        assert_eq!(analytics.status_breakdown.get("waiting"), Some(&30));
        assert_eq!(analytics.screening_stats.total, 8);
        assert_eq!(analytics.interview_stats, StageStats::default());
        assert!(analytics.daily_stats.is_empty());
    }

    #[test]
    fn test_user_helpers() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "email": "ada@example.edu",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "role": "admin",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert!(user.is_admin());
    }
}
