use crate::api::modrinth::{FileHashes, ModrinthError};
use sha1::{Digest, Sha1};
use sha2::Sha512;
use std::io::Read;
use std::path::Path;

/// Lower-case hex encoding of a digest
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    to_hex(Sha1::digest(bytes).as_slice())
}

/// SHA-1 of a file on disk, read in fixed-size blocks
pub fn sha1_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(to_hex(hasher.finalize().as_slice()))
}

/// SHA-1 and SHA-512 computed side by side over a byte stream
pub struct StreamingHasher {
    sha1: Sha1,
    sha512: Sha512,
}

impl Default for StreamingHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingHasher {
    pub fn new() -> Self {
        Self {
            sha1: Sha1::new(),
            sha512: Sha512::new(),
        }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.sha1.update(chunk);
        self.sha512.update(chunk);
    }

    /// Compare against the expected hashes; SHA-512 only when one is given
    pub fn verify(self, url: &str, expected: &FileHashes) -> Result<(), ModrinthError> {
        let actual_sha1 = to_hex(self.sha1.finalize().as_slice());
        if !actual_sha1.eq_ignore_ascii_case(&expected.sha1) {
            return Err(ModrinthError::HashMismatch {
                url: url.to_string(),
                expected: expected.sha1.clone(),
                actual: actual_sha1,
            });
        }

        if let Some(expected_sha512) = &expected.sha512 {
            let actual_sha512 = to_hex(self.sha512.finalize().as_slice());
            if !actual_sha512.eq_ignore_ascii_case(expected_sha512) {
                return Err(ModrinthError::HashMismatch {
                    url: url.to_string(),
                    expected: expected_sha512.clone(),
                    actual: actual_sha512,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    include!("hashing.test.rs");
}
