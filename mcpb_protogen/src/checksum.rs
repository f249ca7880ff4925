// Copyright 2023 drey7925
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::{io_err, ProtogenError, Result};

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Checks `data` against a pinned digest. `what` only shows up in the error message.
pub fn verify_checksum(what: &str, data: &[u8], expected: &str) -> Result<()> {
    let actual = sha256_hex(data);
    if actual.eq_ignore_ascii_case(expected.trim()) {
        Ok(())
    } else {
        Err(ProtogenError::ChecksumMismatch {
            what: what.to_string(),
            expected: expected.trim().to_lowercase(),
            actual,
        })
    }
}

/// Reads a lock file containing a single hex SHA-256 digest.
pub fn read_lock(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ProtogenError::MissingLock(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(io_err(path))?;
    let digest = contents.trim();
    if digest.len() != 64 {
        return Err(ProtogenError::InvalidLock {
            path: path.to_path_buf(),
            reason: format!("expected 64 hex characters, found {}", digest.len()),
        });
    }
    if hex::decode(digest).is_err() {
        return Err(ProtogenError::InvalidLock {
            path: path.to_path_buf(),
            reason: "not a hex string".to_string(),
        });
    }
    Ok(digest.to_lowercase())
}

pub fn write_lock(path: &Path, digest: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
    }
    std::fs::write(path, format!("{}\n", digest)).map_err(io_err(path))
}

/// Checks the vendored definition against its lock file. Used by build scripts, so that a
/// hand-edited or partially downloaded definition never reaches the compiler.
pub fn verify_vendored(proto: &Path, lock: &Path) -> Result<()> {
    let expected = read_lock(lock)?;
    let data = std::fs::read(proto).map_err(io_err(proto))?;
    verify_checksum(&proto.display().to_string(), &data, &expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_checksum_ignores_case_and_whitespace() {
        let digest = sha256_hex(b"syntax = \"proto3\";");
        verify_checksum("test", b"syntax = \"proto3\";", &format!(" {}\n", digest.to_uppercase()))
            .unwrap();
        let err = verify_checksum("test", b"something else", &digest).unwrap_err();
        assert!(matches!(err, ProtogenError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_lock_roundtrip_and_validation() {
        let dir = tempfile::tempdir().unwrap();
        let lock = dir.path().join("nested").join("minecraft.proto.sha256");
        assert!(matches!(
            read_lock(&lock).unwrap_err(),
            ProtogenError::MissingLock(_)
        ));

        let digest = sha256_hex(b"x");
        write_lock(&lock, &digest).unwrap();
        assert_eq!(read_lock(&lock).unwrap(), digest);

        std::fs::write(&lock, "abc").unwrap();
        assert!(matches!(
            read_lock(&lock).unwrap_err(),
            ProtogenError::InvalidLock { .. }
        ));
        std::fs::write(&lock, "z".repeat(64)).unwrap();
        assert!(matches!(
            read_lock(&lock).unwrap_err(),
            ProtogenError::InvalidLock { .. }
        ));
    }

    #[test]
    fn test_vendored_definition_matches_lock() {
        let proto_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("mcpb_core")
            .join("proto");
        verify_vendored(
            &proto_dir.join("minecraft.proto"),
            &proto_dir.join("minecraft.proto.sha256"),
        )
        .unwrap();
    }
}
