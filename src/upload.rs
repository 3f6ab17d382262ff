//! Recording uploads
//!
//! Screening and interview recordings are sent as multipart forms. Files are
//! checked locally before any network call: known audio/video extension,
//! audio or video MIME type, non-empty and within the size limit.
//!
//! The file content is held as shared `Bytes`, so the form can be rebuilt for
//! every attempt of a retried upload without copying.

use crate::error::{Error, Result};
use crate::models::{Stage, StageResult};
use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// Extensions the backend accepts for recordings
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "m4a", "aac", // audio
    "mp4", "webm", "mov", "avi", "mkv", // video
];

/// A validated recording ready to upload
#[derive(Debug, Clone)]
pub struct Recording {
    file_name: String,
    mime_type: String,
    data: Bytes,
}

impl Recording {
    /// Validate in-memory content
    pub fn from_bytes(
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
        max_bytes: u64,
    ) -> Result<Self> {
        let file_name = file_name.into();
        let data = data.into();

        let mime_type = validate_file_name(&file_name)?;
        validate_size(data.len() as u64, max_bytes)?;

        Ok(Self {
            file_name,
            mime_type,
            data,
        })
    }

    /// Read and validate a file from disk
    ///
    /// The size limit is checked against file metadata before reading.
    pub async fn from_path(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::upload(format!("Invalid file name: {}", path.display())))?
            .to_string();
        validate_file_name(&file_name)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        validate_size(metadata.len(), max_bytes)?;

        let data = tokio::fs::read(path).await?;
        Self::from_bytes(file_name, data, max_bytes)
    }

    /// Original file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Detected MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a validated recording
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Multipart body for a stage upload
#[derive(Debug, Clone)]
pub struct StageUpload {
    stage: Stage,
    recording: Recording,
    date: Option<NaiveDate>,
    result: Option<StageResult>,
}

impl StageUpload {
    /// Upload `recording` for `stage`
    pub fn new(stage: Stage, recording: Recording) -> Self {
        Self {
            stage,
            recording,
            date: None,
            result: None,
        }
    }

    /// Date the stage took place
    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Outcome of the stage
    #[must_use]
    pub fn result(mut self, result: StageResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Stage this upload belongs to
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The recording being uploaded
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Text fields sent next to the file
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(date) = self.date {
            fields.push((
                format!("{}_date", self.stage),
                date.format("%Y-%m-%d").to_string(),
            ));
        }
        if let Some(result) = self.result {
            fields.push((
                format!("{}_status", self.stage),
                result.as_str().to_string(),
            ));
        }
        fields
    }

    /// Build a fresh multipart form
    pub fn to_form(&self) -> Result<Form> {
        let part = Part::stream(self.recording.data.clone())
            .file_name(self.recording.file_name.clone())
            .mime_str(&self.recording.mime_type)?;

        let form = self
            .fields()
            .into_iter()
            .fold(Form::new().part("file", part), |form, (name, value)| {
                form.text(name, value)
            });

        Ok(form)
    }
}

/// Check extension and MIME type, returning the MIME type
fn validate_file_name(file_name: &str) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| Error::upload(format!("'{file_name}' has no file extension")))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(Error::upload(format!(
            "'.{extension}' files are not accepted (allowed: {})",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    let mime = mime_guess::from_ext(&extension)
        .first()
        .ok_or_else(|| Error::upload(format!("Unknown media type for '.{extension}'")))?;

    if !matches!(mime.type_().as_str(), "audio" | "video") {
        return Err(Error::upload(format!(
            "'{file_name}' is {mime}, expected an audio or video recording"
        )));
    }

    Ok(mime.essence_str().to_string())
}

fn validate_size(len: u64, max_bytes: u64) -> Result<()> {
    if len == 0 {
        return Err(Error::upload("Recording is empty"));
    }
    if len > max_bytes {
        return Err(Error::upload(format!(
            "Recording is {len} bytes, limit is {max_bytes} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const LIMIT: u64 = 1024;

    #[test_case("call.mp3", "audio/mpeg")]
    #[test_case("CALL.WAV", "audio")]
    #[test_case("interview.mp4", "video/mp4")]
    #[test_case("clip.webm", "webm")]
    #[test_case("screen.mov", "video/quicktime")]
    fn test_accepts_recordings(name: &str, expected_mime: &str) {
        let recording = Recording::from_bytes(name, vec![1u8; 16], LIMIT).unwrap();
        assert!(recording.mime_type().contains(expected_mime));
        assert_eq!(recording.file_name(), name);
        assert_eq!(recording.len(), 16);
    }

    #[test_case("notes.txt")]
    #[test_case("resume.pdf")]
    #[test_case("archive.mp3.zip")]
    #[test_case("noextension")]
    fn test_rejects_non_recordings(name: &str) {
        let result = Recording::from_bytes(name, vec![1u8; 16], LIMIT);
        assert!(matches!(result, Err(Error::Upload { .. })));
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert!(Recording::from_bytes("a.mp3", Vec::<u8>::new(), LIMIT).is_err());
        assert!(Recording::from_bytes("a.mp3", vec![0u8; 1025], LIMIT).is_err());
        assert!(Recording::from_bytes("a.mp3", vec![0u8; 1024], LIMIT).is_ok());
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screening.m4a");
        std::fs::write(&path, b"fake audio").unwrap();

        let recording = Recording::from_path(&path, LIMIT).await.unwrap();
        assert_eq!(recording.file_name(), "screening.m4a");
        assert_eq!(recording.len(), 10);

        let small_limit = Recording::from_path(&path, 4).await;
        assert!(matches!(small_limit, Err(Error::Upload { .. })));
    }

    #[tokio::test]
    async fn test_from_missing_path() {
        let result = Recording::from_path("/nonexistent/dir/call.mp3", LIMIT).await;
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_stage_fields() {
        let recording = Recording::from_bytes("call.mp3", vec![1u8; 4], LIMIT).unwrap();
        let upload = StageUpload::new(Stage::Interview, recording)
            .date(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap())
            .result(StageResult::Failed);

        assert_eq!(
            upload.fields(),
            vec![
                ("interview_date".to_string(), "2024-05-17".to_string()),
                ("interview_status".to_string(), "failed".to_string()),
            ]
        );
        assert!(upload.to_form().is_ok());
        // the form can be rebuilt for a retry
        assert!(upload.to_form().is_ok());
    }

    #[test]
    fn test_stage_fields_empty() {
        let recording = Recording::from_bytes("call.ogg", vec![1u8; 4], LIMIT).unwrap();
        let upload = StageUpload::new(Stage::Screening, recording);
        assert!(upload.fields().is_empty());
        assert_eq!(upload.stage(), Stage::Screening);
    }
}
