//! Multipart upload policies and file storage.
//!
//! Each upload category carries its own size limit and extension/MIME
//! allow-lists; routes accepting uploads override the default body limit
//! with `DefaultBodyLimit::max(policy.max_bytes)`.

use crate::errors::AppError;
use axum::extract::multipart::Field;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Size, type and storage policy for one upload category.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    /// Subdirectory under the configured upload root
    pub category: &'static str,
    /// Maximum accepted file size in bytes
    pub max_bytes: usize,
    /// Accepted file extensions, lowercase, without the dot
    pub extensions: &'static [&'static str],
    /// Accepted MIME types as declared in the multipart part header
    pub mime_types: &'static [&'static str],
}

impl UploadPolicy {
    /// Check a client-supplied file name and declared MIME type against the
    /// allow-lists.
    pub fn permits(&self, file_name: &str, content_type: Option<&str>) -> Result<(), AppError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.extensions.contains(&extension.as_str()) {
            return Err(AppError::BadRequest(format!(
                "{} uploads accept {} files only",
                self.category,
                self.extensions.join(", ")
            )));
        }

        // Drop any parameter the client appended (e.g. "; charset=binary")
        let mime = content_type
            .unwrap_or_default()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !self.mime_types.contains(&mime.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Content type {:?} is not allowed for {} uploads",
                mime, self.category
            )));
        }

        Ok(())
    }
}

/// Identity/registration documents ("papiers"): PDF or image, 5 MB per file.
pub const DOCUMENT_UPLOAD: UploadPolicy = UploadPolicy {
    category: "papiers",
    max_bytes: 5 * 1024 * 1024,
    extensions: &["pdf", "jpg", "jpeg", "png"],
    mime_types: &["application/pdf", "image/jpeg", "image/png"],
};

/// Payment proof images/PDFs: 10 MB.
pub const PAYMENT_PROOF_UPLOAD: UploadPolicy = UploadPolicy {
    category: "payments",
    max_bytes: 10 * 1024 * 1024,
    extensions: &["pdf", "jpg", "jpeg", "png"],
    mime_types: &["application/pdf", "image/jpeg", "image/png"],
};

/// Product photos and videos: 50 MB.
pub const PRODUCT_MEDIA_UPLOAD: UploadPolicy = UploadPolicy {
    category: "products",
    max_bytes: 50 * 1024 * 1024,
    extensions: &["jpg", "jpeg", "png", "webp", "mp4", "webm"],
    mime_types: &[
        "image/jpeg",
        "image/png",
        "image/webp",
        "video/mp4",
        "video/webm",
    ],
};

/// A file persisted to the upload directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Name supplied by the client (sanitized)
    pub original_name: String,
    /// Unique name on disk
    pub stored_name: String,
    /// Full path of the stored file
    pub path: PathBuf,
    /// File size in bytes
    pub size: usize,
}

/// Strip path separators and control characters from a client-supplied name.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Persist one multipart field to `dir` under the given policy.
///
/// The field's file name and declared MIME type must pass the policy's
/// allow-lists before any byte is read. The stored name is prefixed with a
/// fresh UUID so concurrent uploads of the same file name never collide.
///
/// # Example
/// ```ignore
/// use axum::extract::Multipart;
/// use axum_helpers::uploads::{save_field, PAYMENT_PROOF_UPLOAD};
///
/// async fn upload(mut multipart: Multipart) -> Result<(), AppError> {
///     while let Some(field) = multipart.next_field().await? {
///         let stored = save_field(field, &upload_dir, &PAYMENT_PROOF_UPLOAD).await?;
///         tracing::info!("stored {} ({} bytes)", stored.stored_name, stored.size);
///     }
///     Ok(())
/// }
/// ```
pub async fn save_field(
    field: Field<'_>,
    dir: &Path,
    policy: &UploadPolicy,
) -> Result<StoredFile, AppError> {
    let original_name = sanitize_file_name(field.file_name().unwrap_or("file"));
    let content_type = field.content_type().map(str::to_owned);
    policy.permits(&original_name, content_type.as_deref())?;

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    if data.len() > policy.max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "{} uploads are limited to {} bytes (got {})",
            policy.category,
            policy.max_bytes,
            data.len()
        )));
    }

    let target_dir = dir.join(policy.category);
    tokio::fs::create_dir_all(&target_dir).await?;

    let stored_name = format!("{}_{}", Uuid::new_v4(), original_name);
    let path = target_dir.join(&stored_name);
    let size = data.len();

    tokio::fs::write(&path, &data).await?;

    Ok(StoredFile {
        original_name,
        stored_name,
        path,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_path_traversal_attempts() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_file_name("facture mars.pdf"), "facturemars.pdf");
        assert_eq!(sanitize_file_name("///"), "file");
    }

    #[test]
    fn policies_are_ordered_by_size() {
        assert!(DOCUMENT_UPLOAD.max_bytes < PAYMENT_PROOF_UPLOAD.max_bytes);
        assert!(PAYMENT_PROOF_UPLOAD.max_bytes < PRODUCT_MEDIA_UPLOAD.max_bytes);
    }

    #[test]
    fn document_policy_rejects_executables() {
        assert!(DOCUMENT_UPLOAD
            .permits("malware.exe", Some("application/x-msdownload"))
            .is_err());
    }

    #[test]
    fn both_extension_and_mime_must_match() {
        // Good extension, bad declared type
        assert!(DOCUMENT_UPLOAD
            .permits("facture.pdf", Some("application/x-msdownload"))
            .is_err());
        // Good declared type, bad extension
        assert!(DOCUMENT_UPLOAD
            .permits("script.sh", Some("application/pdf"))
            .is_err());
        // Missing declared type
        assert!(DOCUMENT_UPLOAD.permits("facture.pdf", None).is_err());
        // No extension at all
        assert!(DOCUMENT_UPLOAD
            .permits("facture", Some("application/pdf"))
            .is_err());
    }

    #[test]
    fn allowed_uploads_pass_the_policy() {
        assert!(DOCUMENT_UPLOAD
            .permits("facture.pdf", Some("application/pdf"))
            .is_ok());
        // Case-insensitive extension, MIME parameters ignored
        assert!(PAYMENT_PROOF_UPLOAD
            .permits("PREUVE.JPG", Some("image/jpeg; charset=binary"))
            .is_ok());
        assert!(PRODUCT_MEDIA_UPLOAD
            .permits("demo.mp4", Some("video/mp4"))
            .is_ok());
        // Video stays out of the document policy
        assert!(DOCUMENT_UPLOAD.permits("demo.mp4", Some("video/mp4")).is_err());
    }
}
