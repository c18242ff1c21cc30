//! Invoice document storage configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Configuration for generated invoice documents.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentsConfig {
    /// Directory where generated invoice documents are written
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// URL path prefix under which stored documents are served
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

impl DocumentsConfig {
    /// Validate document storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.storage_dir.trim().is_empty() {
            return Err(ValidationError::EmptyStorageDir);
        }
        Ok(())
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            public_path: default_public_path(),
        }
    }
}

fn default_storage_dir() -> String {
    "var/invoices".to_string()
}

fn default_public_path() -> String {
    "/invoices".to_string()
}
