pub mod local_backend;

pub use local_backend::LocalBackend;

use packrat_types::error::Result;

/// Key/value persistence consumed by the object store.
///
/// Keys are `/`-separated relative paths. Implementations must be safe for
/// concurrent callers, and concurrent `put`s of the same key must each leave
/// a complete value behind — the object store relies on this to make
/// content-addressed writes idempotent under racing workers.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, data: &[u8]) -> Result<()>;
    fn exists(&self, key: &str) -> Result<bool>;
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
