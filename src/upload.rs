//! Upload validation and storage.
//!
//! Every upload is written as `<signature>_<sanitized name>` inside the
//! upload directory, where the signature is 16 hex characters derived from
//! the name, the clock and a process-wide counter. Two requests uploading the
//! same file name therefore never overwrite each other.
//!
//! Files are kept after analysis unless a `RetentionPolicy` says otherwise.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

const ALLOWED_EXTENSION: &str = "pdf";
const FALLBACK_STEM: &str = "upload";
const FALLBACK_NAME: &str = "upload.pdf";

static UPLOAD_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Form fields as received, before anything touches the disk.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub standard: Option<String>,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// A form that passed validation.
#[derive(Debug)]
pub struct ValidUpload {
    pub standard: String,
    pub original_filename: String,
    pub data: Vec<u8>,
}

pub fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ALLOWED_EXTENSION))
}

impl UploadForm {
    /// Checks run in order: standard, file present, extension.
    pub fn validate(self) -> Result<ValidUpload, ValidationError> {
        let standard = self.standard.as_deref().map(str::trim).unwrap_or_default();
        if standard.is_empty() {
            return Err(ValidationError::MissingStandard);
        }

        let filename = match self.filename {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ValidationError::MissingFile),
        };

        if !has_allowed_extension(&filename) {
            return Err(ValidationError::InvalidFileType);
        }

        Ok(ValidUpload {
            standard: standard.to_string(),
            original_filename: filename,
            data: self.data,
        })
    }
}

fn clean_part(part: &str) -> String {
    let flattened = part.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Reduces a client supplied name to ASCII letters, digits, `_`, `.` and `-`.
/// Path separators become underscores so no directory component survives.
/// The stem and the extension are cleaned apart, so an extension is never
/// lost even when nothing of the stem is left.
pub fn sanitize_filename(filename: &str) -> String {
    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (clean_part(stem), clean_part(ext)),
        None => (clean_part(filename), String::new()),
    };

    match (stem.is_empty(), extension.is_empty()) {
        (true, true) => FALLBACK_NAME.to_string(),
        (true, false) => format!("{FALLBACK_STEM}.{extension}"),
        (false, true) => stem,
        (false, false) => format!("{stem}.{extension}"),
    }
}

fn upload_signature(filename: &str) -> String {
    let count = UPLOAD_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(count.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}

#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Succeeded,
    Failed,
}

/// Decides what happens to an uploaded file once its analysis finished.
pub trait RetentionPolicy: Send + Sync {
    fn after_analysis(&self, upload: &StoredUpload, outcome: AnalysisOutcome);
}

pub struct KeepUploads;

impl RetentionPolicy for KeepUploads {
    fn after_analysis(&self, upload: &StoredUpload, outcome: AnalysisOutcome) {
        tracing::debug!(path = %upload.path.display(), ?outcome, "upload retained");
    }
}

pub struct DeleteUploads;

impl RetentionPolicy for DeleteUploads {
    fn after_analysis(&self, upload: &StoredUpload, outcome: AnalysisOutcome) {
        match std::fs::remove_file(&upload.path) {
            Ok(()) => tracing::debug!(path = %upload.path.display(), ?outcome, "upload removed"),
            Err(e) => tracing::warn!(path = %upload.path.display(), error = %e, "failed to remove upload"),
        }
    }
}

pub struct UploadStore {
    dir: PathBuf,
    retention: Box<dyn RetentionPolicy>,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, retention: Box<dyn RetentionPolicy>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(UploadStore { dir, retention })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn persist(&self, upload: &ValidUpload) -> std::io::Result<StoredUpload> {
        let filename = sanitize_filename(&upload.original_filename);
        let path = self
            .dir
            .join(format!("{}_{}", upload_signature(&filename), filename));
        tokio::fs::write(&path, &upload.data).await?;
        tracing::info!(path = %path.display(), bytes = upload.data.len(), "upload stored");
        Ok(StoredUpload { filename, path })
    }

    pub fn finish(&self, upload: &StoredUpload, outcome: AnalysisOutcome) {
        self.retention.after_analysis(upload, outcome);
    }
}
