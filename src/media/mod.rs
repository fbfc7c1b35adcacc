//! Media ingestion: turns an uploaded image or an image URL into the URL stored on a row.

pub mod cloudinary;
pub mod local;

pub use cloudinary::CloudinaryStore;
pub use local::LocalStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::MediaConfig;

/// Raw file part received from a form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
}

/// Where a row's image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Upload(ImageUpload),
    Url(String),
}

/// Bytes that passed size and content checks.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl ValidatedImage {
    pub fn extension(&self) -> &'static str {
        match self.mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Empty file")]
    Empty,
    #[error("File too large. Maximum size is {max} bytes.")]
    TooLarge { max: usize },
    #[error("File content does not match an allowed image type.")]
    UnsupportedType,
    #[error("upload provider error: {0}")]
    Provider(String),
    #[error("failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// True when the caller sent a bad file, as opposed to a storage failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            MediaError::Empty | MediaError::TooLarge { .. } | MediaError::UnsupportedType
        )
    }
}

/// Object storage for images. Returns the canonical public URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, image: ValidatedImage) -> Result<String, MediaError>;

    fn name(&self) -> &'static str;
}

fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

pub fn validate_image(upload: ImageUpload, max_bytes: usize) -> Result<ValidatedImage, MediaError> {
    if upload.bytes.is_empty() {
        return Err(MediaError::Empty);
    }
    if upload.bytes.len() > max_bytes {
        return Err(MediaError::TooLarge { max: max_bytes });
    }
    let mime_type = sniff_mime_type(&upload.bytes).ok_or(MediaError::UnsupportedType)?;
    Ok(ValidatedImage {
        bytes: upload.bytes,
        mime_type,
    })
}

/// Resolves image sources against the configured store.
#[derive(Clone)]
pub struct MediaIngest {
    store: Arc<dyn MediaStore>,
    max_upload_bytes: usize,
}

impl MediaIngest {
    pub fn new(store: Arc<dyn MediaStore>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            max_upload_bytes,
        }
    }

    /// Cloudinary when credentials are configured, local disk otherwise.
    pub fn from_config(config: &MediaConfig) -> Self {
        let store: Arc<dyn MediaStore> = match &config.cloudinary {
            Some(cloudinary) => Arc::new(CloudinaryStore::new(cloudinary.clone(), &config.folder)),
            None => Arc::new(LocalStore::new(&config.upload_dir, &config.folder)),
        };
        tracing::info!(provider = store.name(), folder = %config.folder, "media store configured");
        Self::new(store, config.max_upload_bytes)
    }

    /// `None` when no image was supplied (missing or blank URL).
    pub async fn resolve(&self, source: Option<ImageSource>) -> Result<Option<String>, MediaError> {
        match source {
            None => Ok(None),
            Some(ImageSource::Url(url)) => {
                let url = url.trim();
                Ok((!url.is_empty()).then(|| url.to_string()))
            }
            Some(ImageSource::Upload(upload)) => {
                let filename = upload.filename.clone().unwrap_or_default();
                let image = validate_image(upload, self.max_upload_bytes)?;
                let size = image.bytes.len();
                let url = self.store.store(image).await?;
                tracing::info!(
                    provider = self.store.name(),
                    filename = %filename,
                    size,
                    url = %url,
                    "image uploaded"
                );
                Ok(Some(url))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    /// Records stored images and hands out predictable URLs.
    #[derive(Default)]
    pub struct RecordingStore {
        pub stored: Mutex<Vec<ValidatedImage>>,
        pub fail: bool,
    }

    #[async_trait]
    impl MediaStore for RecordingStore {
        async fn store(&self, image: ValidatedImage) -> Result<String, MediaError> {
            if self.fail {
                return Err(MediaError::Provider("provider offline".to_string()));
            }
            let mut stored = self.stored.lock().unwrap();
            let url = format!("https://cdn.test/portfolio/{}.{}", stored.len() + 1, image.extension());
            stored.push(image);
            Ok(url)
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn upload(bytes: &[u8]) -> ImageSource {
        ImageSource::Upload(ImageUpload {
            bytes: bytes.to_vec(),
            filename: Some("cover.png".to_string()),
        })
    }

    #[test]
    fn test_sniff_recognizes_allowed_formats() {
        assert_eq!(sniff_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime_type(PNG_BYTES), Some("image/png"));
        assert_eq!(sniff_mime_type(b"GIF89a"), Some("image/gif"));
        assert_eq!(sniff_mime_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime_type(b"%PDF-1.7"), None);
    }

    #[test]
    fn test_validate_rejects_empty_and_oversized() {
        let empty = ImageUpload {
            bytes: vec![],
            filename: None,
        };
        assert!(matches!(validate_image(empty, 10), Err(MediaError::Empty)));

        let big = ImageUpload {
            bytes: PNG_BYTES.to_vec(),
            filename: None,
        };
        assert!(matches!(
            validate_image(big, 4),
            Err(MediaError::TooLarge { max: 4 })
        ));
    }

    #[tokio::test]
    async fn test_resolve_passes_urls_through() {
        let ingest = MediaIngest::new(Arc::new(RecordingStore::default()), 1024);
        let url = ingest
            .resolve(Some(ImageSource::Url(" https://img.test/a.png ".to_string())))
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://img.test/a.png"));
        assert_eq!(
            ingest.resolve(Some(ImageSource::Url("  ".to_string()))).await.unwrap(),
            None
        );
        assert_eq!(ingest.resolve(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_uploads_bytes_to_store() {
        let store = Arc::new(RecordingStore::default());
        let ingest = MediaIngest::new(store.clone(), 1024);
        let url = ingest.resolve(Some(upload(PNG_BYTES))).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.test/portfolio/1.png"));
        assert_eq!(store.stored.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_surfaces_provider_failure() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..Default::default()
        });
        let ingest = MediaIngest::new(store, 1024);
        let err = ingest.resolve(Some(upload(PNG_BYTES))).await.unwrap_err();
        assert!(!err.is_rejection());
    }
}
