//! Storage configuration types.

use claimdesk_shared::StorageSettings;
use std::path::PathBuf;

/// `storage.root` value selecting the in-process provider.
pub const MEMORY_ROOT: &str = "memory://";

/// Where attachment bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// Local filesystem
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory, lost on restart
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum upload size in bytes.
    pub max_file_size: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
    /// Base URL under which stored keys are publicly served, if any.
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Default max file size: 10 MiB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::default_mime_types(),
            public_base_url: None,
        }
    }

    /// Build from the application settings.
    ///
    /// A root of `memory://` selects the in-process provider, anything else
    /// is a local directory.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Self {
        let provider = if settings.root == MEMORY_ROOT {
            StorageProvider::Memory
        } else {
            StorageProvider::local_fs(&settings.root)
        };

        Self::new(provider)
            .with_max_file_size(settings.max_file_size)
            .with_allowed_mime_types(settings.allowed_mime_types.clone())
            .with_public_base_url(settings.public_base_url.clone())
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set allowed MIME types. An empty list keeps the defaults.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        if !types.is_empty() {
            self.allowed_mime_types = types
                .iter()
                .map(|t| normalize_mime_type(t))
                .collect();
        }
        self
    }

    /// Set the public base URL for stored files.
    #[must_use]
    pub fn with_public_base_url(mut self, url: Option<String>) -> Self {
        self.public_base_url = url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    /// Default allowed MIME types for claim uploads.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec![
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "image/gif".to_string(),
            "image/webp".to_string(),
            "image/heic".to_string(),
            "image/heif".to_string(),
        ]
    }

    /// Check if a MIME type is allowed.
    ///
    /// Only `image/*` types can ever be allowed, whatever the configured list says.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        let mime_type = normalize_mime_type(mime_type);
        mime_type.starts_with("image/") && self.allowed_mime_types.iter().any(|t| *t == mime_type)
    }
}

/// Lower-cases a MIME type and strips parameters (`image/PNG; q=1` -> `image/png`).
#[must_use]
pub fn normalize_mime_type(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
