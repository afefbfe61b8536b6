//! On-disk framing of one graph record.
//!
//! Format: [magic "PGRF": 4][version: u16][reserved: u16][CRC32: u32][len: u32][rkyv payload: len]
//! All header integers are little-endian.

use crc32fast::Hasher;
use protgraph_core::error::{GraphError, Result};
use protgraph_core::model::GraphRecord;
use rkyv::ser::{serializers::AllocSerializer, Serializer};
use rkyv::{AlignedVec, Deserialize};

pub const MAGIC: &[u8; 4] = b"PGRF";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 16;

pub fn encode(record: &GraphRecord) -> Result<Vec<u8>> {
    let mut serializer = AllocSerializer::<4096>::default();
    serializer
        .serialize_value(record)
        .map_err(|_| GraphError::format("failed to serialize graph record"))?;
    let payload = serializer.into_serializer().into_inner();

    let len = u32::try_from(payload.len())
        .map_err(|_| GraphError::format("graph record exceeds 4 GiB"))?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let crc = hasher.finalize();

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<GraphRecord> {
    if bytes.len() < HEADER_LEN {
        return Err(GraphError::format(format!(
            "truncated header: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(GraphError::format("not a graph record (bad magic)"));
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(GraphError::format(format!(
            "unsupported format version {}",
            version
        )));
    }
    let crc = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;

    let payload = &bytes[HEADER_LEN..];
    if payload.len() != len {
        return Err(GraphError::format(format!(
            "payload length {} does not match header length {}",
            payload.len(),
            len
        )));
    }

    let mut hasher = Hasher::new();
    hasher.update(payload);
    if hasher.finalize() != crc {
        return Err(GraphError::format("data integrity error (CRC mismatch)"));
    }

    // Archive validation needs the payload at rkyv's alignment.
    let mut aligned = AlignedVec::with_capacity(len);
    aligned.extend_from_slice(payload);

    let archived = rkyv::check_archived_root::<GraphRecord>(&aligned[..])
        .map_err(|_| GraphError::format("archived graph record failed validation"))?;
    let record: GraphRecord = archived
        .deserialize(&mut rkyv::Infallible)
        .unwrap_or_else(|never| match never {});
    Ok(record)
}
