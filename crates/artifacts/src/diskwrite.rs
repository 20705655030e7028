//! Write a file only when its content actually changed.
//!
//! Grounded on the teacher's own atomic file writer: a temp file is created
//! alongside the target and persisted over it, so readers (the nameserver,
//! the proxy) never observe a partially-written file.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;

use camino::Utf8Path;
use sha2::{Digest, Sha256};

/// Knot/Caddy run as a different user than `edged`; the files this writes
/// must be world-readable for them to pick it up.
const FILE_MODE: u32 = 0o644;

/// Write `contents` to `path`, but only if the SHA-256 of the existing file
/// (if any) differs. Returns whether a write happened, so callers can decide
/// whether to reload a dependent service.
pub fn write_if_diff(path: &Utf8Path, contents: &[u8]) -> io::Result<bool> {
    if let Ok(existing) = fs::read(path) {
        if sha256(&existing) == sha256(contents) {
            return Ok(false);
        }
    }

    let dir = path
        .parent()
        .expect("write_if_diff requires a path with a parent directory");
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::Builder::new().tempfile_in(dir)?;
    tmp.as_file_mut().write_all(contents)?;
    let file = tmp.persist(path)?;
    file.set_permissions(fs::Permissions::from_mode(FILE_MODE))?;

    Ok(true)
}

fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn temp_path(name: &str) -> Utf8PathBuf {
        let dir = tempfile::tempdir().unwrap().keep();
        Utf8PathBuf::from_path_buf(dir.join(name)).unwrap()
    }

    #[test]
    fn writes_once_then_skips_unchanged_content() {
        let path = temp_path("zone.db");
        assert!(write_if_diff(&path, b"hello").unwrap());
        assert!(!write_if_diff(&path, b"hello").unwrap());
        assert!(write_if_diff(&path, b"hello world").unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }
}
