//! Application endpoints

use crate::error::{Error, Result, ResultExt};
use crate::http::{ApiClient, ApiRequest};
use crate::models::{
    ActivityDay, Application, ApplicationUpdate, NewApplication, Stage, StageRecord, StageResult,
};
use crate::upload::{Recording, StageUpload};
use chrono::NaiveDate;
use std::path::Path;
use tracing::debug;
use url::Url;

/// `/applications/*` calls for the logged-in user
pub struct ApplicationsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ApplicationsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// All applications of the current user, newest first
    pub async fn list(&self) -> Result<Vec<Application>> {
        self.client.get("/applications").await
    }

    /// A single application with its stages
    pub async fn get(&self, id: i64) -> Result<Application> {
        self.client.get(&format!("/applications/{id}")).await
    }

    pub async fn create(&self, application: &NewApplication) -> Result<Application> {
        self.client.post("/applications", application).await
    }

    /// Apply a partial update
    pub async fn update(&self, id: i64, changes: &ApplicationUpdate) -> Result<Application> {
        self.client
            .put(&format!("/applications/{id}"), changes)
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&format!("/applications/{id}")).await
    }

    /// Attach a screening recording
    pub async fn upload_screening(
        &self,
        id: i64,
        recording: Recording,
        date: Option<NaiveDate>,
        result: Option<StageResult>,
    ) -> Result<StageRecord> {
        self.upload(id, Stage::Screening, recording, date, result)
            .await
    }

    /// Attach an interview recording
    pub async fn upload_interview(
        &self,
        id: i64,
        recording: Recording,
        date: Option<NaiveDate>,
        result: Option<StageResult>,
    ) -> Result<StageRecord> {
        self.upload(id, Stage::Interview, recording, date, result)
            .await
    }

    /// Upload a recording for `stage`
    pub async fn upload(
        &self,
        id: i64,
        stage: Stage,
        recording: Recording,
        date: Option<NaiveDate>,
        result: Option<StageResult>,
    ) -> Result<StageRecord> {
        let mut upload = StageUpload::new(stage, recording);
        if let Some(date) = date {
            upload = upload.date(date);
        }
        if let Some(result) = result {
            upload = upload.result(result);
        }

        let request = ApiRequest::post(format!("/applications/{id}/{stage}")).upload(upload);
        self.client.execute(request).await
    }

    /// Daily activity counters for the current user
    pub async fn activity(&self) -> Result<Vec<ActivityDay>> {
        self.client.get("/applications/activity").await
    }

    /// Fetch a stored recording and write it to `dest`, returning its size
    ///
    /// `file_name` is the `file_path` of a stage record. Students may only
    /// fetch their own recordings; the backend answers 403 otherwise.
    pub async fn download_recording(
        &self,
        file_name: &str,
        dest: impl AsRef<Path>,
    ) -> Result<u64> {
        let file_name = recording_name(file_name)?;
        let dest = dest.as_ref();

        let data = self
            .client
            .execute_bytes(ApiRequest::get(format!("/files/{file_name}")))
            .await?;

        tokio::fs::write(dest, &data)
            .await
            .with_context(|| format!("Failed to write recording to {}", dest.display()))?;
        debug!(file = file_name, dest = %dest.display(), bytes = data.len(), "Recording saved");

        Ok(data.len() as u64)
    }

    /// Shareable link that carries the current token in its query string
    ///
    /// For players that cannot send an `Authorization` header. The link stops
    /// working once the token expires.
    pub async fn download_link(&self, file_name: &str) -> Result<Url> {
        let file_name = recording_name(file_name)?;
        let token = self.client.session().token().await.ok_or(Error::NotLoggedIn)?;

        let mut url = self.client.build_url(&format!("/download/{file_name}"))?;
        url.query_pairs_mut().append_pair("token", &token);
        Ok(url)
    }
}

/// Stored recordings are flat names inside the upload directory
fn recording_name(file_name: &str) -> Result<&str> {
    let trimmed = file_name.trim();
    if trimmed.is_empty()
        || trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(Error::InvalidFileName {
            name: file_name.to_string(),
        });
    }
    Ok(trimmed)
}
