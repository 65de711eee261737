use std::path::{Component, Path, PathBuf};

use bytes::Bytes;

use crate::error::StoreError;

use super::ByteStore;

/// Stores every entry as a file directly under `root`.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Joins only the plain components of `name`, so root, prefix, `.` and
    /// `..` components can never move the path outside of `root`.
    fn path(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(
            Path::new(name)
                .components()
                .filter(|component| matches!(component, Component::Normal(_))),
        );
        path
    }
}

#[async_trait::async_trait]
impl ByteStore for DirectoryStore {
    async fn read(&self, name: &str) -> Result<Bytes, StoreError> {
        let path = self.path(name);
        tracing::debug!(?path, "reading file");

        let content = tokio::fs::read(&path).await?;
        Ok(content.into())
    }

    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StoreError> {
        let path = self.path(name);
        tracing::debug!(?path, len = content.len(), "writing file");

        tokio::fs::write(&path, content).await.map_err(Into::into)
    }
}

#[cfg(test)]
impl DirectoryStore {
    /// Fresh, empty directory under the system temp dir.
    pub fn temporary() -> Self {
        let root = std::env::temp_dir().join(format!("server-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&root).unwrap();

        Self::new(root)
    }
}
