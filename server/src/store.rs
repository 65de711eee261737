pub mod fs;

use bytes::Bytes;

use crate::error::StoreError;

/// Flat byte store keyed by file name.
#[async_trait::async_trait]
pub trait ByteStore {
    async fn read(&self, name: &str) -> Result<Bytes, StoreError>;
    /// Creates the entry, or truncates and overwrites an existing one.
    async fn write(&self, name: &str, content: &[u8]) -> Result<(), StoreError>;
}
