pub mod format;
mod stats;

pub use format::ObjectType;
pub use stats::{StatsSnapshot, StoreStats};

use std::io::Read;

use packrat_types::error::{PackratError, Result};
use packrat_types::object_id::ObjectId;

use crate::storage::StorageBackend;
use crate::tree::Tree;

use format::{pack_object, unpack_object_expect};

/// Content-addressed, deduplicating client over a [`StorageBackend`].
///
/// Identifiers are derived from the object bytes, so two workers racing to
/// store identical content agree on the storage key, and the backend's
/// whole-value put semantics keep the stored object intact. Writing is
/// therefore idempotent; a repeated write of known content is skipped and
/// counted as deduplicated.
pub struct ObjectStore {
    backend: Box<dyn StorageBackend>,
    stats: StoreStats,
}

impl ObjectStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            stats: StoreStats::default(),
        }
    }

    /// Store a typed payload, returning its content-derived identifier.
    pub fn put_object(&self, obj_type: ObjectType, payload: &[u8]) -> Result<ObjectId> {
        let packed = pack_object(obj_type, payload);
        let id = ObjectId::compute(obj_type.object_kind(), &packed);
        let key = id.storage_key();
        if self.backend.exists(&key)? {
            self.stats.add_deduplicated();
            return Ok(id);
        }
        self.backend.put(&key, &packed)?;
        self.stats.add_bytes_written(packed.len() as u64);
        match obj_type {
            ObjectType::Tree => self.stats.add_tree_written(),
            ObjectType::FileData | ObjectType::HashCache => self.stats.add_blob_written(),
        }
        Ok(id)
    }

    /// Fetch a typed payload by identifier.
    pub fn get_object(&self, obj_type: ObjectType, id: &ObjectId) -> Result<Vec<u8>> {
        let data = self
            .backend
            .get(&id.storage_key())?
            .ok_or(PackratError::ObjectNotFound(*id))?;
        Ok(unpack_object_expect(&data, obj_type)?.to_vec())
    }

    pub fn write_blob(&self, data: &[u8]) -> Result<ObjectId> {
        self.put_object(ObjectType::FileData, data)
    }

    /// Buffer a source byte stream and store it as a blob. The bytes read
    /// from the source are counted even when the resulting object
    /// deduplicates away.
    pub fn write_blob_stream(&self, reader: &mut dyn Read, size_hint: u64) -> Result<ObjectId> {
        let mut data = Vec::with_capacity(usize::try_from(size_hint).unwrap_or(0));
        reader.read_to_end(&mut data)?;
        self.stats.add_bytes_read(data.len() as u64);
        self.write_blob(&data)
    }

    pub fn read_blob(&self, id: &ObjectId) -> Result<Vec<u8>> {
        self.get_object(ObjectType::FileData, id)
    }

    pub fn write_tree(&self, tree: &Tree) -> Result<ObjectId> {
        let encoded = rmp_serde::to_vec(tree)?;
        self.put_object(ObjectType::Tree, &encoded)
    }

    pub fn read_tree(&self, id: &ObjectId) -> Result<Tree> {
        let payload = self.get_object(ObjectType::Tree, id)?;
        Ok(rmp_serde::from_slice(&payload)?)
    }

    /// Point-in-time copy of the store counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &StoreStats {
        &self.stats
    }
}
