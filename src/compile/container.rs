//! Compiled-Shader Container
//!
//! Compiled artifacts are FourCC part containers (the DXBC layout): a fixed
//! header followed by a part offset table, each part carrying a FourCC tag,
//! a payload length and the payload bytes.
//!
//! ```text
//! 0   "DXBC"            4-byte magic
//! 4   digest            16 bytes (left zeroed on rebuild)
//! 20  version           u16 major, u16 minor
//! 24  total size        u32
//! 28  part count        u32
//! 32  part offsets      u32 each, from container start
//! ..  parts             FourCC + u32 payload length + payload
//! ```
//!
//! The generator needs three operations on this layout: find the
//! debug-symbol blob, find the debug-name blob, and rebuild a container with
//! all debug parts removed. Extraction from a malformed container degrades
//! to "no blob"; stripping a malformed container returns it unchanged.

/// Debug symbol bitcode part.
pub const PART_DEBUG_BITCODE: [u8; 4] = *b"ILDB";
/// Debug name part (the symbol file name).
pub const PART_DEBUG_NAME: [u8; 4] = *b"ILDN";
/// Legacy debug symbol part.
pub const PART_LEGACY_DEBUG: [u8; 4] = *b"SPDB";
/// Legacy debug info part.
pub const PART_LEGACY_DEBUG_INFO: [u8; 4] = *b"SDBG";

const MAGIC: [u8; 4] = *b"DXBC";
const HEADER_SIZE: usize = 32;

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes
        .get(offset..offset + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn is_debug_part(fourcc: [u8; 4]) -> bool {
    matches!(
        fourcc,
        PART_DEBUG_BITCODE | PART_DEBUG_NAME | PART_LEGACY_DEBUG | PART_LEGACY_DEBUG_INFO
    )
}

/// Enumerate the container's parts as `(fourcc, payload)` pairs.
///
/// Returns `None` when the bytes are not a well-formed container.
#[must_use]
pub fn parts(container: &[u8]) -> Option<Vec<([u8; 4], &[u8])>> {
    if container.get(..4) != Some(MAGIC.as_slice()) {
        return None;
    }
    let count = read_u32(container, 28)? as usize;
    // The offset table must fit before anything is allocated for it.
    if container.len() < HEADER_SIZE.checked_add(count.checked_mul(4)?)? {
        return None;
    }

    let mut parts = Vec::with_capacity(count);
    for index in 0..count {
        let offset = read_u32(container, HEADER_SIZE + index * 4)? as usize;
        let fourcc: [u8; 4] = container.get(offset..offset + 4)?.try_into().ok()?;
        let size = read_u32(container, offset + 4)? as usize;
        let payload = container.get(offset + 8..offset + 8 + size)?;
        parts.push((fourcc, payload));
    }
    Some(parts)
}

/// Get the payload of the first part tagged with `fourcc`.
#[must_use]
pub fn part(container: &[u8], fourcc: [u8; 4]) -> Option<&[u8]> {
    parts(container)?
        .into_iter()
        .find(|&(tag, _)| tag == fourcc)
        .map(|(_, payload)| payload)
}

/// Assemble a container from parts. The digest is left zeroed.
#[must_use]
pub fn build(parts: &[([u8; 4], &[u8])]) -> Vec<u8> {
    let offsets_end = HEADER_SIZE + parts.len() * 4;
    let total: usize = offsets_end + parts.iter().map(|(_, p)| 8 + p.len()).sum::<usize>();

    let mut container = Vec::with_capacity(total);
    container.extend_from_slice(&MAGIC);
    container.extend_from_slice(&[0u8; 16]);
    container.extend_from_slice(&1u16.to_le_bytes());
    container.extend_from_slice(&0u16.to_le_bytes());
    container.extend_from_slice(&(total as u32).to_le_bytes());
    container.extend_from_slice(&(parts.len() as u32).to_le_bytes());

    let mut offset = offsets_end;
    for (_, payload) in parts {
        container.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += 8 + payload.len();
    }
    for (fourcc, payload) in parts {
        container.extend_from_slice(fourcc);
        container.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        container.extend_from_slice(payload);
    }
    container
}

/// Rebuild the container without any debug parts.
///
/// Bytes that do not parse as a container, or contain no debug parts, are
/// returned unchanged.
#[must_use]
pub fn strip_debug(container: &[u8]) -> Vec<u8> {
    let Some(all) = parts(container) else {
        return container.to_vec();
    };
    let kept: Vec<_> = all
        .iter()
        .copied()
        .filter(|&(fourcc, _)| !is_debug_part(fourcc))
        .collect();
    if kept.len() == all.len() {
        return container.to_vec();
    }
    build(&kept)
}
