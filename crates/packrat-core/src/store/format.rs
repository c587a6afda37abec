use packrat_types::error::{PackratError, Result};
use packrat_types::object_id::ObjectKind;

/// Object type tags for the store envelope format.
///
/// Wire format: `[1-byte type tag][payload]`. Identifiers are computed over
/// the enveloped bytes, so payloads of different types never alias to one
/// identifier even when their raw bytes coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectType {
    FileData = 0,
    Tree = 1,
    HashCache = 2,
}

impl ObjectType {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(Self::FileData),
            1 => Ok(Self::Tree),
            2 => Ok(Self::HashCache),
            _ => Err(PackratError::UnknownObjectType(v)),
        }
    }

    /// The identifier kind produced for payloads of this type.
    pub fn object_kind(self) -> ObjectKind {
        match self {
            ObjectType::Tree => ObjectKind::Tree,
            ObjectType::FileData | ObjectType::HashCache => ObjectKind::Blob,
        }
    }
}

/// Wrap a payload in its typed envelope.
pub fn pack_object(obj_type: ObjectType, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(obj_type as u8);
    out.extend_from_slice(payload);
    out
}

/// Split an enveloped object into its type and payload.
pub fn unpack_object(data: &[u8]) -> Result<(ObjectType, &[u8])> {
    let (&tag, payload) = data
        .split_first()
        .ok_or_else(|| PackratError::InvalidFormat("empty object".into()))?;
    Ok((ObjectType::from_u8(tag)?, payload))
}

/// Unpack an object, ensuring its type tag matches.
pub fn unpack_object_expect(data: &[u8], expected: ObjectType) -> Result<&[u8]> {
    let (obj_type, payload) = unpack_object(data)?;
    if obj_type != expected {
        return Err(PackratError::InvalidFormat(format!(
            "unexpected object type: expected {expected:?}, got {obj_type:?}"
        )));
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trip() {
        let packed = pack_object(ObjectType::Tree, b"listing");
        let (obj_type, payload) = unpack_object(&packed).unwrap();
        assert_eq!(obj_type, ObjectType::Tree);
        assert_eq!(payload, b"listing");
    }

    #[test]
    fn unpack_empty_object_errors() {
        assert!(unpack_object(b"").is_err());
    }

    #[test]
    fn unknown_tag_errors() {
        let err = unpack_object(&[0x7F, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, PackratError::UnknownObjectType(0x7F)));
    }

    #[test]
    fn expect_rejects_wrong_type() {
        let packed = pack_object(ObjectType::FileData, b"bytes");
        assert!(unpack_object_expect(&packed, ObjectType::FileData).is_ok());
        assert!(unpack_object_expect(&packed, ObjectType::HashCache).is_err());
    }
}
