//! CF_HDROP payload encoding
//!
//! The shell expects a `DROPFILES` header followed by a list of UTF-16 file
//! names, each terminated by a NUL, with one extra NUL closing the list:
//!
//! | offset | size | field                          |
//! |--------|------|--------------------------------|
//! | 0      | 4    | offset of the file list (= 20) |
//! | 4      | 4    | pt.x = 0                       |
//! | 8      | 4    | pt.y = 0                       |
//! | 12     | 4    | fNC = 0                        |
//! | 16     | 4    | fWide = 1                      |
//! | 20     | ...  | UTF-16LE names                 |
//!
//! All fields are little-endian.

use std::path::{Path, PathBuf};

/// Size of the DROPFILES header in bytes
pub const DROPFILES_HEADER_SIZE: usize = 20;

/// Ordered list of files offered to the drop target.
///
/// Immutable once built; the session only ever reads it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragPayload {
    paths: Vec<PathBuf>,
}

impl DragPayload {
    /// Build a payload, skipping empty entries.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths = paths
            .into_iter()
            .map(Into::into)
            .filter(|p: &PathBuf| !p.as_os_str().is_empty())
            .collect();
        Self { paths }
    }

    /// Build a payload from a newline separated list.
    ///
    /// Runs of `\r` and `\n` count as a single separator, so both Unix and
    /// Windows line endings work and blank lines are ignored.
    pub fn from_joined(joined: &str) -> Self {
        Self::from_paths(
            joined
                .split(['\r', '\n'])
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Encode a path as UTF-16 without terminator
#[cfg(target_os = "windows")]
fn wide_path(path: &Path) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    path.as_os_str().encode_wide().collect()
}

/// Encode a path as UTF-16 without terminator
#[cfg(not(target_os = "windows"))]
fn wide_path(path: &Path) -> Vec<u16> {
    path.to_string_lossy().encode_utf16().collect()
}

/// Serialize paths into a CF_HDROP block.
///
/// Callers never pass an empty list; the session rejects empty payloads
/// before getting here.
pub fn build_block<P: AsRef<Path>>(paths: &[P]) -> Vec<u8> {
    let mut wide: Vec<u16> = Vec::new();
    for path in paths {
        wide.extend(wide_path(path.as_ref()));
        wide.push(0);
    }
    // Double null-terminator.
    wide.push(0);

    let mut block = Vec::with_capacity(DROPFILES_HEADER_SIZE + wide.len() * 2);
    block.extend_from_slice(&(DROPFILES_HEADER_SIZE as u32).to_le_bytes());
    block.extend_from_slice(&0i32.to_le_bytes()); // pt.x
    block.extend_from_slice(&0i32.to_le_bytes()); // pt.y
    block.extend_from_slice(&0u32.to_le_bytes()); // fNC
    block.extend_from_slice(&1u32.to_le_bytes()); // fWide
    for unit in wide {
        block.extend_from_slice(&unit.to_le_bytes());
    }
    block
}

/// Parse a CF_HDROP block back into file names.
///
/// Only wide blocks are understood. Returns `None` when the header is
/// truncated, the list offset overlaps the header, is misaligned or points
/// outside the block, or the list is not terminated.
pub fn decode_block(block: &[u8]) -> Option<Vec<String>> {
    if block.len() < DROPFILES_HEADER_SIZE {
        return None;
    }
    let read_u32 = |at: usize| u32::from_le_bytes([block[at], block[at + 1], block[at + 2], block[at + 3]]);

    let offset = read_u32(0) as usize;
    if read_u32(16) == 0 || offset < DROPFILES_HEADER_SIZE || offset % 2 != 0 || offset > block.len() {
        return None;
    }

    let units: Vec<u16> = block[offset..]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let mut names = Vec::new();
    let mut start = 0;
    for (i, &unit) in units.iter().enumerate() {
        if unit != 0 {
            continue;
        }
        if i == start {
            // Empty entry marks end of list
            return Some(names);
        }
        names.push(String::from_utf16_lossy(&units[start..i]));
        start = i + 1;
    }
    None
}
