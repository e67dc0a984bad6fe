use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;

/// Multipart field carrying the image.
pub const FIELD_NAME: &str = "image";

/// Public URL prefix the uploads directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check both the file extension and the declared content type.
    ///
    /// Returns the lowercased extension to reuse in the stored name.
    pub fn validate(
        &self,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, ApiError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| ALLOWED_TYPES.contains(&e.as_str()))
            .ok_or(ApiError::UnsupportedMediaType)?;

        let subtype = content_type
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .and_then(|ct| ct.strip_prefix("image/").map(str::to_string))
            .ok_or(ApiError::UnsupportedMediaType)?;

        if !ALLOWED_TYPES.contains(&subtype.as_str()) {
            return Err(ApiError::UnsupportedMediaType);
        }

        Ok(extension)
    }

    pub fn check_size(&self, len: usize) -> Result<(), ApiError> {
        if len > self.max_bytes {
            return Err(ApiError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Validate and write the image, returning its public path.
    pub async fn store(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, ApiError> {
        let extension = self.validate(file_name, content_type)?;
        self.check_size(bytes.len())?;

        let stored_name = generate_file_name(&extension);
        tokio::fs::write(self.dir.join(&stored_name), bytes).await?;

        Ok(format!("{}/{}", PUBLIC_PREFIX, stored_name))
    }
}

/// `<unix millis>-<random>.<ext>`
pub fn generate_file_name(extension: &str) -> String {
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}
