//! String and file helpers used by CRS handling and drivers.

use std::fs;
use std::path::Path;

use super::{Error, Result};

/// Characters stripped by [`trim`]: space, tabs, and line breaks.
const WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\x0b', '\x0c'];

/// Trim leading and trailing whitespace.
pub fn trim(s: &str) -> String {
    s.trim_matches(WHITESPACE).to_string()
}

/// Read a whole file into a string.
///
/// Missing files are reported as [`Error::FileNotFound`] so the status
/// recorded at the handle boundary stays specific.
pub fn read_file_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::Io(e)
        }
    })?;
    Ok(String::from_utf8(bytes)?)
}
