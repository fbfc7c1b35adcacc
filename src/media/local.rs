use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use super::{MediaError, MediaStore, ValidatedImage};

/// URL prefix under which the router serves the upload directory.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Writes images under `<root>/<folder>/` with random file names.
pub struct LocalStore {
    root: PathBuf,
    folder: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, folder: &str) -> Self {
        Self {
            root: root.into(),
            folder: folder.trim_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalStore {
    async fn store(&self, image: ValidatedImage) -> Result<String, MediaError> {
        let dir = self.root.join(&self.folder);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!("Failed to create upload directory: {}", e);
            e
        })?;

        let filename = format!("{}.{}", Uuid::new_v4(), image.extension());
        tokio::fs::write(dir.join(&filename), &image.bytes)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write upload file: {}", e);
                e
            })?;

        Ok(format!("{}/{}/{}", PUBLIC_PREFIX, self.folder, filename))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tests::PNG_BYTES;

    #[tokio::test]
    async fn test_store_writes_file_and_returns_public_url() {
        let root = std::env::temp_dir().join(format!("portfolio-cms-test-{}", Uuid::new_v4()));
        let store = LocalStore::new(&root, "/portfolio/");
        let url = store
            .store(ValidatedImage {
                bytes: PNG_BYTES.to_vec(),
                mime_type: "image/png",
            })
            .await
            .unwrap();

        assert!(url.starts_with("/uploads/portfolio/"));
        assert!(url.ends_with(".png"));
        let filename = url.rsplit('/').next().unwrap();
        let written = std::fs::read(root.join("portfolio").join(filename)).unwrap();
        assert_eq!(written, PNG_BYTES);

        std::fs::remove_dir_all(&root).ok();
    }
}
