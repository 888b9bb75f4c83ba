//! Uploaded application forms
//!
//! PDFs only, size-capped, stored flat under the upload directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    config::UploadConfig,
    utils::{AppError, AppResult},
};

const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl FileStore {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_bytes: config.max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validate and persist a PDF, returning the stored file name
    pub async fn store(
        &self,
        original_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<String> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {} MB limit",
                self.max_bytes / (1024 * 1024)
            )));
        }
        if content_type != Some(PDF_CONTENT_TYPE) || !bytes.starts_with(PDF_MAGIC) {
            return Err(AppError::bad_request("Only PDF files are allowed"));
        }

        let name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(original_name.unwrap_or("form.pdf"))
        );

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create upload directory {:?}", self.dir))?;
        tokio::fs::write(self.dir.join(&name), bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", name))?;

        debug!(file = %name, bytes = bytes.len(), "Stored uploaded form");
        Ok(name)
    }

    /// Best-effort delete of a stored file
    pub async fn remove(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.dir.join(sanitize_filename(name))).await {
            warn!(file = %name, error = %e, "Failed to remove uploaded file");
        }
    }
}

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_start_matches('.') {
        "" => "form.pdf".to_string(),
        rest => rest.to_string(),
    }
}
