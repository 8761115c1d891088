//! On-disk format for persisted index trees
//!
//! ```text
//! {"format_version":1,"field":"age","degree":3,"checksum":2712203,"body_len":812}\n
//! <JSON-encoded tree, body_len bytes>
//! ```
//!
//! The checksum is CRC32 over the body. A blob is accepted only if the
//! version, length and checksum agree and the decoded tree passes its
//! structural invariant check.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};
use super::IndexTree;
use crate::storage::write_atomic;

/// Current blob format version
pub const FORMAT_VERSION: u32 = 1;

/// File extension of index blobs
pub const INDEX_EXTENSION: &str = "idx";

/// Largest degree a blob may declare
pub const MAX_DEGREE: usize = 1024;

#[derive(Debug, Serialize, Deserialize)]
struct BlobHeader {
    format_version: u32,
    field: String,
    degree: usize,
    checksum: u32,
    body_len: usize,
}

/// File name for the index on `field`.
///
/// Bytes outside `[A-Za-z0-9._-]` are written as `%XX`.
pub fn file_name_for(field: &str) -> String {
    let mut name = String::with_capacity(field.len() + 4);
    for byte in field.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name.push('.');
    name.push_str(INDEX_EXTENSION);
    name
}

/// Serializes a tree into blob bytes.
pub fn encode(field: &str, tree: &IndexTree) -> IndexResult<Vec<u8>> {
    let body = serde_json::to_vec(tree)
        .map_err(|e| IndexError::build_failed(field, format!("cannot encode tree: {}", e)))?;
    let header = BlobHeader {
        format_version: FORMAT_VERSION,
        field: field.to_string(),
        degree: tree.degree(),
        checksum: crc32fast::hash(&body),
        body_len: body.len(),
    };
    let mut out = serde_json::to_vec(&header)
        .map_err(|e| IndexError::build_failed(field, format!("cannot encode header: {}", e)))?;
    out.push(b'\n');
    out.extend_from_slice(&body);
    Ok(out)
}

/// Verifies and decodes blob bytes read from `path`.
///
/// Returns the field named in the header and the tree.
pub fn decode(path: &Path, bytes: &[u8]) -> IndexResult<(String, IndexTree)> {
    let newline = bytes
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| IndexError::corrupted(path, "missing header line"))?;
    let (header_bytes, rest) = bytes.split_at(newline);
    let body = &rest[1..];

    let header: BlobHeader = serde_json::from_slice(header_bytes)
        .map_err(|e| IndexError::corrupted(path, format!("unreadable header: {}", e)))?;

    if header.format_version != FORMAT_VERSION {
        return Err(IndexError::corrupted(
            path,
            format!("unsupported format version {}", header.format_version),
        ));
    }
    if header.body_len != body.len() {
        return Err(IndexError::corrupted(
            path,
            format!("expected {} body bytes, found {}", header.body_len, body.len()),
        ));
    }
    let actual = crc32fast::hash(body);
    if actual != header.checksum {
        return Err(IndexError::corrupted(
            path,
            format!("checksum mismatch: header {:08x}, body {:08x}", header.checksum, actual),
        ));
    }
    if header.degree < IndexTree::MIN_DEGREE || header.degree > MAX_DEGREE {
        return Err(IndexError::corrupted(
            path,
            format!("degree {} out of range", header.degree),
        ));
    }

    let tree: IndexTree = serde_json::from_slice(body)
        .map_err(|e| IndexError::corrupted(path, format!("unreadable tree: {}", e)))?;
    if tree.degree() != header.degree {
        return Err(IndexError::corrupted(
            path,
            format!("tree degree {} disagrees with header {}", tree.degree(), header.degree),
        ));
    }
    tree.check_invariants()
        .map_err(|reason| IndexError::corrupted(path, reason))?;

    Ok((header.field, tree))
}

/// Writes the blob for `field` into `dir` atomically. Returns its path.
pub fn persist(dir: &Path, field: &str, tree: &IndexTree) -> IndexResult<PathBuf> {
    let path = dir.join(file_name_for(field));
    let bytes = encode(field, tree)?;
    write_atomic(&path, &bytes).map_err(|e| IndexError::io(&path, e))?;
    Ok(path)
}

/// Reads and verifies one blob.
pub fn load(path: &Path) -> IndexResult<(String, IndexTree)> {
    let bytes = fs::read(path).map_err(|e| IndexError::io(path, e))?;
    decode(path, &bytes)
}

/// Paths of every blob in `dir`, sorted.
pub fn list_blobs(dir: &Path) -> IndexResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| IndexError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| IndexError::io(dir, e))?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(INDEX_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
