use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// Where normalized upload bytes live. The production store is a plain
/// directory served statically under `/images`; the trait keeps handlers
/// testable without touching the real disk layout.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn put(&self, filename: &str, body: Bytes) -> anyhow::Result<()>;

    /// Returns `false` when the asset was already absent. Absence is not
    /// an error: the DB row and the file are deleted independently.
    async fn delete(&self, filename: &str) -> anyhow::Result<bool>;
}

/// Rejects anything that could escape the asset directory. Generated
/// filenames always pass; this guards the delete path, whose filename
/// comes from the client.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[derive(Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub async fn new(root: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(root)
            .await
            .with_context(|| format!("create upload dir {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, filename: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(is_safe_filename(filename), "unsafe filename {filename:?}");
        Ok(self.root.join(filename))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, filename: &str, body: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(filename)?;
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write asset {}", path.display()))?;
        Ok(())
    }

    async fn delete(&self, filename: &str) -> anyhow::Result<bool> {
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("delete asset {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_filename_rules() {
        assert!(is_safe_filename("20250101120000_a1b2c3_lunch.jpg"));
        assert!(is_safe_filename("plain-name_1.webp"));
        assert!(!is_safe_filename(""));
        assert!(!is_safe_filename(".."));
        assert!(!is_safe_filename(".hidden"));
        assert!(!is_safe_filename("a/b.jpg"));
        assert!(!is_safe_filename("a\\b.jpg"));
    }

    #[tokio::test]
    async fn put_then_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();

        store
            .put("x.jpg", Bytes::from_static(b"jpeg bytes"))
            .await
            .unwrap();
        assert_eq!(std::fs::read(dir.path().join("x.jpg")).unwrap(), b"jpeg bytes");

        assert!(store.delete("x.jpg").await.unwrap());
        // second delete: already absent, still not an error
        assert!(!store.delete("x.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn unsafe_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path()).await.unwrap();
        assert!(store.put("../escape.jpg", Bytes::new()).await.is_err());
        assert!(store.delete("../escape.jpg").await.is_err());
    }
}
