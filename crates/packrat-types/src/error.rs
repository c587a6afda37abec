use thiserror::Error;

use crate::object_id::ObjectId;

pub type Result<T> = std::result::Result<T, PackratError>;

#[derive(Debug, Error)]
pub enum PackratError {
    #[error("unsupported source entry: {0}")]
    UnsupportedEntry(String),

    #[error("source not found: '{0}'")]
    SourceNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid object format: {0}")]
    InvalidFormat(String),

    #[error("unknown object type tag: {0}")]
    UnknownObjectType(u8),

    #[error("object not found in store: {0}")]
    ObjectNotFound(ObjectId),

    #[error("serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("upload cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}
