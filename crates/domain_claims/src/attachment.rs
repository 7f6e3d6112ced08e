//! Supporting-document validation and storage naming
//!
//! Every upload passes through [`AttachmentPolicy::prepare`] before a single
//! byte reaches storage. The rules run in order and the first failure wins:
//!
//! 1. Size: anything above the limit (5 MiB by default) is rejected; a file of
//!    exactly the limit is accepted.
//! 2. Extension: case-insensitive allow-list of pdf, docx, xlsx, png, jpeg and
//!    jpg. A missing extension is rejected.
//!
//! On success the policy picks a collision-resistant storage name that keeps
//! the original extension and the public path clients use to fetch the file.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Largest accepted upload in bytes
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Extensions accepted for supporting documents
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "docx", "xlsx", "png", "jpeg", "jpg"];

/// URL prefix under which stored attachments are served
pub const DEFAULT_PUBLIC_PREFIX: &str = "/images";

/// Form field the attachment errors are reported against
pub const ATTACHMENT_FIELD: &str = "attachment";

/// Reasons an upload is refused
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("File size exceeds limit: {size} bytes is larger than {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Unsupported file type '{extension}'. Only PDF, DOCX, XLSX, PNG, JPEG, JPG files are allowed")]
    UnsupportedType { extension: String },
}

/// A stored supporting document, as referenced from a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as uploaded, kept for display
    pub original_file_name: String,
    /// Generated name the bytes are stored under
    pub storage_name: String,
    /// Public relative path, e.g. `/images/<uuid>.pdf`
    pub url: String,
}

/// Upload constraints and naming rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub public_prefix: String,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_ATTACHMENT_BYTES,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
        }
    }
}

impl AttachmentPolicy {
    /// Sets the maximum accepted size
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Sets the public URL prefix
    pub fn public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }

    /// Applies the size and type rules, returning the validated extension
    pub fn check(&self, file_name: &str, size: u64) -> Result<String, AttachmentError> {
        if size > self.max_bytes {
            return Err(AttachmentError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let extension = extension_of(file_name).unwrap_or_default();
        let lowered = extension.to_ascii_lowercase();
        if lowered.is_empty() || !self.allowed_extensions.iter().any(|e| *e == lowered) {
            return Err(AttachmentError::UnsupportedType {
                extension: extension.to_string(),
            });
        }

        Ok(extension.to_string())
    }

    /// Validates an upload and decides where it will live
    pub fn prepare(&self, file_name: &str, size: u64) -> Result<Attachment, AttachmentError> {
        let extension = self.check(file_name, size)?;
        let storage_name = format!("{}.{}", Uuid::new_v4(), extension);
        let url = format!("{}/{}", self.public_prefix.trim_end_matches('/'), storage_name);

        Ok(Attachment {
            original_file_name: file_name.to_string(),
            storage_name,
            url,
        })
    }
}

/// Extension after the last dot of the final path segment
///
/// Browsers on some platforms send a full client path as the file name, so
/// both separators are stripped first.
fn extension_of(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(file_name);
    base.rsplit_once('.').map(|(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_limit_is_accepted() {
        let policy = AttachmentPolicy::default();
        assert!(policy.check("timesheet.pdf", MAX_ATTACHMENT_BYTES).is_ok());
    }

    #[test]
    fn test_one_byte_over_limit_is_rejected() {
        let policy = AttachmentPolicy::default();
        assert_eq!(
            policy.check("timesheet.pdf", MAX_ATTACHMENT_BYTES + 1),
            Err(AttachmentError::TooLarge {
                size: MAX_ATTACHMENT_BYTES + 1,
                limit: MAX_ATTACHMENT_BYTES,
            })
        );
    }

    #[test]
    fn test_size_rule_wins_over_type_rule() {
        let policy = AttachmentPolicy::default();
        let err = policy.check("virus.exe", MAX_ATTACHMENT_BYTES * 2).unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { .. }));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let policy = AttachmentPolicy::default();
        assert_eq!(policy.check("SCAN.JPG", 10).unwrap(), "JPG");
        assert_eq!(policy.check("report.Docx", 10).unwrap(), "Docx");
    }

    #[test]
    fn test_missing_extension_is_rejected() {
        let policy = AttachmentPolicy::default();
        assert!(matches!(
            policy.check("README", 10),
            Err(AttachmentError::UnsupportedType { .. })
        ));
        assert!(matches!(
            policy.check("trailing.", 10),
            Err(AttachmentError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_client_path_is_ignored() {
        assert_eq!(extension_of("C:\\Users\\me\\hours.xlsx"), Some("xlsx"));
        assert_eq!(extension_of("dir.v2/notes"), None);
    }

    #[test]
    fn test_prepare_generates_fresh_names() {
        let policy = AttachmentPolicy::default();
        let first = policy.prepare("hours.png", 100).unwrap();
        let second = policy.prepare("hours.png", 100).unwrap();

        assert_eq!(first.original_file_name, "hours.png");
        assert_ne!(first.storage_name, second.storage_name);
        assert!(first.storage_name.ends_with(".png"));
        assert_eq!(first.url, format!("/images/{}", first.storage_name));
    }

    #[test]
    fn test_public_prefix_trailing_slash() {
        let policy = AttachmentPolicy::default().public_prefix("/uploads/");
        let attachment = policy.prepare("a.pdf", 1).unwrap();
        assert!(attachment.url.starts_with("/uploads/"));
        assert!(!attachment.url.contains("//"));
    }
}
