// SPDX-License-Identifier: MIT

//! Media upload handoff.
//!
//! Uploaded avatar/cover files are written to local disk under a uuid name
//! and handed back as a public URL; the rest of the system only ever sees
//! the URL.

use crate::error::AppError;
use std::path::{Path, PathBuf};

/// Stores uploaded media files and yields their public URLs.
#[derive(Debug, Clone)]
pub struct MediaStore {
    upload_dir: PathBuf,
    public_base_url: String,
}

impl MediaStore {
    pub fn new(upload_dir: &str, public_base_url: &str) -> Self {
        Self {
            upload_dir: PathBuf::from(upload_dir),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory served statically under `/uploads`.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Persist one uploaded file and return the URL it will be served at.
    /// The original file name contributes only its extension.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Upload dir unavailable: {}", e)))?;
        tokio::fs::write(self.upload_dir.join(&file_name), bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Upload write failed: {}", e)))?;

        Ok(format!("{}/uploads/{}", self.public_base_url, file_name))
    }
}
