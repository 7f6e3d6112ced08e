//! Local filesystem storage for supporting documents
//!
//! Files land directly under the upload root using their generated storage
//! name; the same directory is served read-only under the public prefix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use core_kernel::{DomainPort, PortError};
use domain_claims::{Attachment, AttachmentStorage};

/// Stores attachments as plain files below a root directory
#[derive(Debug, Clone)]
pub struct LocalAttachmentStorage {
    root: PathBuf,
}

impl LocalAttachmentStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, attachment: &Attachment) -> Result<PathBuf, PortError> {
        let name = attachment.storage_name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(PortError::validation_field(
                format!("Invalid storage name '{name}'"),
                "attachment",
            ));
        }
        Ok(self.root.join(name))
    }
}

impl DomainPort for LocalAttachmentStorage {}

#[async_trait]
impl AttachmentStorage for LocalAttachmentStorage {
    async fn store(&self, attachment: &Attachment, bytes: &[u8]) -> Result<(), PortError> {
        let path = self.path_for(attachment)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PortError::internal_with_source("Failed to create upload directory", e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PortError::internal_with_source("Failed to write attachment", e))?;

        info!(file = %path.display(), size = bytes.len(), "Stored attachment");
        Ok(())
    }

    async fn remove(&self, attachment: &Attachment) -> Result<(), PortError> {
        let path = self.path_for(attachment)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(file = %path.display(), "Removed attachment");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::internal_with_source("Failed to remove attachment", e)),
        }
    }
}
