//! GLB binary container framing.
//!
//! A GLB file is a 12-byte header followed by 8-byte-prefixed chunks:
//!
//! ```text
//! magic "glTF" | version 2 | total length      (u32 LE each)
//! chunkLength  | chunkType | chunkData ...     (JSON chunk, space padded)
//! chunkLength  | chunkType | chunkData ...     (optional BIN chunk, zero padded)
//! ```

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use gltfkit_core::FormatError;

/// `glTF` in little-endian.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
/// `JSON` in little-endian.
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
/// `BIN\0` in little-endian.
pub const CHUNK_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Which container a byte stream holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// JSON text.
    Text,
    /// GLB.
    Binary,
    Unknown,
}

/// Detects the container from the leading bytes.
pub fn sniff(bytes: &[u8]) -> ContainerKind {
    if bytes.len() >= 4 && LittleEndian::read_u32(&bytes[0..4]) == GLB_MAGIC {
        return ContainerKind::Binary;
    }
    let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match text.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => ContainerKind::Text,
        _ => ContainerKind::Unknown,
    }
}

/// Chunks of a parsed GLB, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbChunks<'a> {
    /// JSON chunk with trailing padding removed.
    pub json: &'a [u8],
    /// BIN chunk including any trailing padding.
    pub bin: Option<&'a [u8]>,
}

/// Splits a GLB into its JSON and BIN chunks.
///
/// Chunks of unknown type are skipped. Trailing spaces and NULs are trimmed
/// from the JSON chunk; the BIN chunk is returned with its zero padding. So
/// `parse_binary(pack_binary(j, b))` gives back `j` and `b` exactly only when
/// `j` has no trailing whitespace and `b.len()` is a multiple of 4.
pub fn parse_binary(bytes: &[u8]) -> Result<GlbChunks<'_>, FormatError> {
    if bytes.len() < HEADER_LEN {
        return Err(FormatError::TruncatedHeader {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }

    let magic = LittleEndian::read_u32(&bytes[0..4]);
    let version = LittleEndian::read_u32(&bytes[4..8]);
    let total = LittleEndian::read_u32(&bytes[8..12]) as usize;

    if magic != GLB_MAGIC {
        return Err(FormatError::BadMagic(magic));
    }
    if version != GLB_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }
    if total > bytes.len() {
        return Err(FormatError::LengthMismatch {
            declared: total,
            actual: bytes.len(),
        });
    }
    if total < HEADER_LEN {
        return Err(FormatError::TruncatedHeader {
            needed: HEADER_LEN,
            available: total,
        });
    }

    let mut offset = HEADER_LEN;
    let mut json: Option<&[u8]> = None;
    let mut bin: Option<&[u8]> = None;
    let mut chunk_index = 0usize;

    while offset < total {
        if offset + CHUNK_HEADER_LEN > total {
            return Err(FormatError::ChunkOverrun {
                offset,
                length: CHUNK_HEADER_LEN,
                total,
            });
        }
        let length = LittleEndian::read_u32(&bytes[offset..offset + 4]) as usize;
        let kind = LittleEndian::read_u32(&bytes[offset + 4..offset + 8]);
        let start = offset + CHUNK_HEADER_LEN;
        let end = start
            .checked_add(length)
            .filter(|&end| end <= total)
            .ok_or(FormatError::ChunkOverrun {
                offset,
                length,
                total,
            })?;
        let data = &bytes[start..end];

        match kind {
            CHUNK_JSON => {
                if json.is_some() {
                    return Err(FormatError::DuplicateChunk("JSON"));
                }
                if chunk_index != 0 {
                    return Err(FormatError::MissingJsonChunk);
                }
                json = Some(data);
            }
            CHUNK_BIN => {
                if bin.is_some() {
                    return Err(FormatError::DuplicateChunk("BIN"));
                }
                if chunk_index == 0 {
                    return Err(FormatError::MissingJsonChunk);
                }
                if chunk_index != 1 {
                    return Err(FormatError::MisplacedChunk);
                }
                bin = Some(data);
            }
            other => {
                if chunk_index == 0 {
                    return Err(FormatError::MissingJsonChunk);
                }
                debug!("skipping GLB chunk 0x{:08X} ({} bytes)", other, length);
            }
        }

        chunk_index += 1;
        offset = end;
    }

    let json = json.ok_or(FormatError::MissingJsonChunk)?;
    let trimmed = json
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |last| last + 1);
    debug!(
        "parsed GLB: {} byte JSON chunk, {} byte BIN chunk",
        json.len(),
        bin.map_or(0, |b| b.len())
    );

    Ok(GlbChunks {
        json: &json[..trimmed],
        bin,
    })
}

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Packs JSON text and an optional binary payload into a GLB.
///
/// The JSON chunk is padded with spaces and the BIN chunk with zeros to
/// 4-byte multiples. Fails when the result would not fit a 32-bit length.
pub fn pack_binary(json: &[u8], bin: Option<&[u8]>) -> Result<Vec<u8>, FormatError> {
    let json_padded = json.len() + padding(json.len());
    let bin_padded = bin.map(|b| b.len() + padding(b.len()));
    let total = HEADER_LEN
        + CHUNK_HEADER_LEN
        + json_padded
        + bin_padded.map_or(0, |len| CHUNK_HEADER_LEN + len);

    if u32::try_from(total).is_err() {
        return Err(FormatError::InvalidField {
            path: "glb".to_string(),
            reason: format!("{} bytes exceeds the 32-bit GLB length", total),
        });
    }

    let mut output = Vec::with_capacity(total);

    // Header
    output.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    output.extend_from_slice(&GLB_VERSION.to_le_bytes());
    output.extend_from_slice(&(total as u32).to_le_bytes());

    // JSON chunk
    output.extend_from_slice(&(json_padded as u32).to_le_bytes());
    output.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    output.extend_from_slice(json);
    output.resize(output.len() + padding(json.len()), b' ');

    // Binary chunk
    if let (Some(bin), Some(bin_padded)) = (bin, bin_padded) {
        output.extend_from_slice(&(bin_padded as u32).to_le_bytes());
        output.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        output.extend_from_slice(bin);
        output.resize(output.len() + padding(bin.len()), 0);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(kind: u32, data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    fn glb(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = GLB_MAGIC.to_le_bytes().to_vec();
        out.extend_from_slice(&GLB_VERSION.to_le_bytes());
        out.extend_from_slice(&((12 + body.len()) as u32).to_le_bytes());
        out.extend(body);
        out
    }

    #[test]
    fn test_sniff() {
        assert_eq!(sniff(b"glTF\x02\0\0\0"), ContainerKind::Binary);
        assert_eq!(sniff(b"  \n{\"asset\":{}}"), ContainerKind::Text);
        assert_eq!(sniff(b"\xEF\xBB\xBF{}"), ContainerKind::Text);
        assert_eq!(sniff(b"PK\x03\x04"), ContainerKind::Unknown);
        assert_eq!(sniff(b""), ContainerKind::Unknown);
    }

    #[test]
    fn test_pack_and_parse() {
        let packed = pack_binary(b"{\"a\":1}", Some(&[1u8, 2, 3, 4, 5][..])).unwrap();
        assert_eq!(packed.len(), 12 + 8 + 8 + 8 + 8);
        assert_eq!(LittleEndian::read_u32(&packed[8..12]) as usize, packed.len());

        let chunks = parse_binary(&packed).unwrap();
        assert_eq!(chunks.json, b"{\"a\":1}");
        assert_eq!(chunks.bin, Some(&[1u8, 2, 3, 4, 5, 0, 0, 0][..]));
    }

    #[test]
    fn test_parse_trims_json_but_keeps_bin_padding() {
        let packed = pack_binary(b"{\"a\":1}  ", Some(&[9u8, 9, 9, 9][..])).unwrap();
        let chunks = parse_binary(&packed).unwrap();
        assert_eq!(chunks.json, b"{\"a\":1}");
        assert_eq!(chunks.bin, Some(&[9u8, 9, 9, 9][..]));

        let packed = pack_binary(b"{}", Some(&[9u8, 9][..])).unwrap();
        assert_eq!(parse_binary(&packed).unwrap().bin, Some(&[9u8, 9, 0, 0][..]));
    }

    #[test]
    fn test_json_only() {
        let packed = pack_binary(b"{}", None).unwrap();
        assert_eq!(packed.len(), 24);
        let chunks = parse_binary(&packed).unwrap();
        assert_eq!(chunks.json, b"{}");
        assert_eq!(chunks.bin, None);
    }

    #[test]
    fn test_header_errors() {
        assert_eq!(
            parse_binary(b"glTF"),
            Err(FormatError::TruncatedHeader {
                needed: 12,
                available: 4
            })
        );

        let mut bad_magic = pack_binary(b"{}", None).unwrap();
        bad_magic[0] = b'x';
        assert!(matches!(parse_binary(&bad_magic), Err(FormatError::BadMagic(_))));

        let mut bad_version = pack_binary(b"{}", None).unwrap();
        bad_version[4] = 1;
        assert_eq!(
            parse_binary(&bad_version),
            Err(FormatError::UnsupportedVersion(1))
        );

        let mut too_long = pack_binary(b"{}", None).unwrap();
        too_long[8] = 200;
        assert!(matches!(
            parse_binary(&too_long),
            Err(FormatError::LengthMismatch { declared: 200, .. })
        ));
    }

    #[test]
    fn test_declared_length_shorter_than_json_chunk() {
        let mut packed = pack_binary(b"{\"asset\":{\"version\":\"2.0\"}}", None).unwrap();
        packed[8..12].copy_from_slice(&24u32.to_le_bytes());
        assert!(matches!(
            parse_binary(&packed),
            Err(FormatError::ChunkOverrun { offset: 12, total: 24, .. })
        ));
    }

    #[test]
    fn test_chunk_order_rules() {
        let json = chunk(CHUNK_JSON, b"{}  ");
        let bin = chunk(CHUNK_BIN, &[0; 4]);
        let other = chunk(0x1234_5678, &[9; 4]);

        assert_eq!(parse_binary(&glb(&[bin.clone()])), Err(FormatError::MissingJsonChunk));
        assert_eq!(
            parse_binary(&glb(&[json.clone(), json.clone()])),
            Err(FormatError::DuplicateChunk("JSON"))
        );
        assert_eq!(
            parse_binary(&glb(&[json.clone(), bin.clone(), bin.clone()])),
            Err(FormatError::DuplicateChunk("BIN"))
        );
        assert_eq!(
            parse_binary(&glb(&[json.clone(), other.clone(), bin.clone()])),
            Err(FormatError::MisplacedChunk)
        );

        let data = glb(&[json, bin, other]);
        let chunks = parse_binary(&data).unwrap();
        assert_eq!(chunks.json, b"{}");
        assert_eq!(chunks.bin, Some(&[0u8; 4][..]));
    }
}
