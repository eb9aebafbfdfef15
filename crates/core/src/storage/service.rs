//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use tracing::warn;
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Prefix for client uploads.
const UPLOAD_PREFIX: &str = "uploads";
/// Prefix for materialized signatures.
const SIGNATURE_PREFIX: &str = "signatures";
/// Staging directory under a local root. Files are written here and renamed
/// into place on close, so readers never observe a partial object.
const STAGING_DIR: &str = ".partial";

/// Metadata about an object written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage key.
    pub key: String,
    /// Object size in bytes.
    pub size_bytes: u64,
}

/// Storage service for claim attachments.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::LocalFs { root } => {
                let staging = root.join(STAGING_DIR);
                let builder = services::Fs::default()
                    .root(
                        root.to_str()
                            .ok_or_else(|| StorageError::configuration("invalid path"))?,
                    )
                    .atomic_write_dir(
                        staging
                            .to_str()
                            .ok_or_else(|| StorageError::configuration("invalid path"))?,
                    );
                Operator::new(builder).map(|b| b.finish())
            }
            StorageProvider::Memory => {
                Operator::new(services::Memory::default()).map(|b| b.finish())
            }
        };

        operator.map_err(|e| StorageError::configuration(e.to_string()))
    }

    /// Generate a collision-resistant key for a client upload.
    ///
    /// Format: `uploads/{unix_millis}-{random}.{ext}`. The extension comes from
    /// the original filename when it has a sane one, otherwise from the MIME type.
    #[must_use]
    pub fn generate_upload_key(
        original_name: Option<&str>,
        mime_type: &str,
        now: DateTime<Utc>,
    ) -> String {
        let extension = original_name
            .and_then(file_extension)
            .or_else(|| extension_for_mime_type(mime_type).map(str::to_string))
            .unwrap_or_else(|| "bin".to_string());
        let random = Uuid::new_v4().simple().to_string();

        format!(
            "{UPLOAD_PREFIX}/{}-{}.{extension}",
            now.timestamp_millis(),
            &random[..8]
        )
    }

    /// Key under which a signature image with the given digest is materialized.
    #[must_use]
    pub fn signature_key(digest_hex: &str, extension: &str) -> String {
        format!("{SIGNATURE_PREFIX}/{digest_hex}.{extension}")
    }

    /// Write an object.
    ///
    /// The writer is aborted on every failure path so a half-written object
    /// is never left behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the write fails.
    pub async fn write(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let size_bytes = u64::try_from(data.len()).unwrap_or(u64::MAX);

        let mut writer = self
            .operator
            .writer_with(key)
            .content_type(content_type)
            .await
            .map_err(|e| StorageError::from_provider("write", key, &e))?;

        let written = match writer.write(data).await {
            Ok(()) => writer.close().await.map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(abort_err) = writer.abort().await {
                warn!(key = %key, error = %abort_err, "Failed to abort storage write");
            }
            return Err(StorageError::from_provider("write", key, &e));
        }

        Ok(StoredObject {
            key: key.to_string(),
            size_bytes,
        })
    }

    /// Read a whole object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be read.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        validate_key(key)?;
        let buffer = self
            .operator
            .read(key)
            .await
            .map_err(|e| StorageError::from_provider("read", key, &e))?;
        Ok(buffer.to_bytes())
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to stat storage object");
                false
            }
        }
    }

    /// Public URL for a key, when a public base URL is configured.
    #[must_use]
    pub fn public_url(&self, key: &str) -> Option<String> {
        self.config
            .public_base_url
            .as_ref()
            .map(|base| format!("{base}/{key}"))
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Keys of all files stored under a prefix.
    #[cfg(test)]
    pub(crate) async fn list_keys(&self, prefix: &str) -> Vec<String> {
        match self.operator.list_with(prefix).recursive(true).await {
            Ok(entries) => entries
                .into_iter()
                .filter(|e| e.metadata().is_file())
                .map(|e| e.path().to_string())
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => panic!("listing {prefix} failed: {e}"),
        }
    }
}

/// Reject keys that could escape the storage root.
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.ends_with('/')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Lower-cased extension of a filename, restricted to short ASCII alphanumerics.
fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    ext.chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then(|| ext.to_ascii_lowercase())
}

/// Conventional extension for the image types accepted by the gateway.
fn extension_for_mime_type(mime_type: &str) -> Option<&'static str> {
    match super::config::normalize_mime_type(mime_type).as_str() {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/heif" => Some("heif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn memory_storage() -> StorageService {
        StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
            .expect("should create service")
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("boarding-pass.JPG"), Some("jpg".to_string()));
        assert_eq!(file_extension("scan.final.png"), Some("png".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension(".hidden"), None);
        assert_eq!(file_extension("evil.p/ng"), None);
    }

    #[test]
    fn test_generate_upload_key() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let key = StorageService::generate_upload_key(Some("ticket.jpeg"), "image/jpeg", now);

        assert!(key.starts_with(&format!("uploads/{}-", now.timestamp_millis())));
        assert!(key.ends_with(".jpeg"));
        validate_key(&key).expect("generated keys are valid");
    }

    #[test]
    fn test_generate_upload_key_falls_back_to_mime_type() {
        let now = Utc::now();
        let key = StorageService::generate_upload_key(None, "image/png", now);
        assert!(key.ends_with(".png"));

        let key = StorageService::generate_upload_key(Some("blob"), "image/x-unknown", now);
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_upload_keys_do_not_collide() {
        let now = Utc::now();
        let a = StorageService::generate_upload_key(Some("a.png"), "image/png", now);
        let b = StorageService::generate_upload_key(Some("a.png"), "image/png", now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("uploads/1-abc.png").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("uploads/../secret").is_err());
        assert!(validate_key("uploads//x").is_err());
        assert!(validate_key("uploads/").is_err());
    }

    #[test]
    fn test_public_url() {
        let config = StorageConfig::new(StorageProvider::Memory)
            .with_public_base_url(Some("https://files.example.com".to_string()));
        let service = StorageService::from_config(config).unwrap();
        assert_eq!(
            service.public_url("uploads/1-a.png").as_deref(),
            Some("https://files.example.com/uploads/1-a.png")
        );
        assert_eq!(memory_storage().public_url("uploads/1-a.png"), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let storage = memory_storage();
        let stored = storage
            .write("uploads/1-a.png", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .unwrap();

        assert_eq!(stored.size_bytes, 9);
        assert!(storage.exists("uploads/1-a.png").await);
        assert_eq!(
            storage.read("uploads/1-a.png").await.unwrap(),
            Bytes::from_static(b"png-bytes")
        );
        assert_eq!(storage.list_keys("uploads/").await, vec!["uploads/1-a.png"]);
    }

    #[tokio::test]
    async fn test_read_missing_object() {
        let storage = memory_storage();
        let err = storage.read("uploads/missing.png").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
        assert!(!storage.exists("uploads/missing.png").await);
    }

    #[tokio::test]
    async fn test_write_rejects_invalid_key() {
        let storage = memory_storage();
        let err = storage
            .write("../outside.png", Bytes::new(), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
