//! Duplicate file detection
//!
//! Warns when both slots hold the same document, either by path or by
//! byte-identical content. Sizes are compared first so differing files are
//! rejected without hashing.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// How the two files were found to be the same
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Duplicate {
    /// Both slots point at the same path
    SamePath,
    /// Different paths, identical bytes
    SameContent,
}

impl Duplicate {
    pub fn message(&self) -> &'static str {
        match self {
            Duplicate::SamePath => "The same file (identical path) is loaded in both slots",
            Duplicate::SameContent => "The files have different paths but identical content",
        }
    }
}

/// Compare two files on disk
pub fn check_duplicates(a: &Path, b: &Path) -> Result<Option<Duplicate>> {
    if a == b {
        return Ok(Some(Duplicate::SamePath));
    }

    if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
        return Ok(None);
    }

    let hash_a = file_hash(a)?;
    let hash_b = file_hash(b)?;
    tracing::debug!(left = %hash_a, right = %hash_b, "Compared file hashes");

    Ok((hash_a == hash_b).then_some(Duplicate::SameContent))
}

/// Hex SHA-256 of a file's content
pub fn file_hash(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_same_path() {
        let file = temp_with(b"%PDF-1.4");
        assert_eq!(
            check_duplicates(file.path(), file.path()).unwrap(),
            Some(Duplicate::SamePath)
        );
    }

    #[test]
    fn test_same_content() {
        let a = temp_with(b"%PDF-1.4 same");
        let b = temp_with(b"%PDF-1.4 same");
        assert_eq!(
            check_duplicates(a.path(), b.path()).unwrap(),
            Some(Duplicate::SameContent)
        );
    }

    #[test]
    fn test_same_size_different_content() {
        let a = temp_with(b"%PDF-1.4 aaaa");
        let b = temp_with(b"%PDF-1.4 bbbb");
        assert_eq!(check_duplicates(a.path(), b.path()).unwrap(), None);
    }

    #[test]
    fn test_different_size() {
        let a = temp_with(b"short");
        let b = temp_with(b"much longer content");
        assert_eq!(check_duplicates(a.path(), b.path()).unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let a = temp_with(b"x");
        let missing = Path::new("/nonexistent/pdfdiff/missing.pdf");
        assert!(check_duplicates(a.path(), missing).is_err());
    }

    #[test]
    fn test_file_hash_known_value() {
        let file = temp_with(b"abc");
        assert_eq!(
            file_hash(file.path()).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
