//! Streaming content fingerprints.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest as _, Sha256};

use crate::core::errors::{CheckupError, Result};
use crate::store::record::Digest;

/// Bytes read per chunk; memory use is independent of file size.
pub const CHUNK_SIZE: usize = 4096;

/// Computes a deterministic fingerprint of a file's bytes.
pub trait DigestProvider {
    /// Fingerprint of the file at `path`; fails if it cannot be opened or read.
    fn digest(&self, path: &Path) -> Result<Digest>;
}

/// SHA-256 over the full file content, hex encoded (64 chars).
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl DigestProvider for Sha256Digest {
    fn digest(&self, path: &Path) -> Result<Digest> {
        let mut file = File::open(path).map_err(|source| CheckupError::io(path, source))?;
        digest_reader(&mut file).map_err(|source| CheckupError::io(path, source))
    }
}

/// Fold a reader into a SHA-256 fingerprint, `CHUNK_SIZE` bytes at a time.
pub fn digest_reader<R: Read>(reader: &mut R) -> std::io::Result<Digest> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(Digest::from_hex(format!("{:x}", hasher.finalize())))
}
