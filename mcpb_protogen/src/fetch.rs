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

use std::{io::Write, path::Path};

use crate::{io_err, Result};

/// Source of the raw interface definition.
pub trait ProtoFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[cfg(feature = "fetch")]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "fetch")]
impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("mcpb-protogen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| crate::ProtogenError::Fetch {
                url: String::new(),
                message: format!("couldn't build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[cfg(feature = "fetch")]
impl ProtoFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        use crate::ProtogenError;

        log::info!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProtogenError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProtogenError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(|e| ProtogenError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        log::info!("Fetched {} bytes", body.len());
        Ok(body.to_vec())
    }
}

/// Fetches `url`, rejecting an empty body. The plugin never publishes an empty definition, so
/// an empty response means a broken mirror or proxy.
pub fn fetch_proto(fetcher: &dyn ProtoFetcher, url: &str) -> Result<Vec<u8>> {
    let data = fetcher.fetch(url)?;
    if data.is_empty() {
        return Err(crate::ProtogenError::Fetch {
            url: url.to_string(),
            message: "empty response body".to_string(),
        });
    }
    Ok(data)
}

/// Replaces the file at `path` with `data`. The data goes to a sibling temp file first so a
/// failed write never leaves a truncated definition behind. The temp file is removed if the
/// final rename fails.
pub fn write_proto(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    let mut prefix = path.file_name().unwrap_or_default().to_os_string();
    prefix.push(".");
    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".download")
        .tempfile_in(parent)
        .map_err(io_err(parent))?;
    tmp.write_all(data).map_err(io_err(tmp.path()))?;
    tmp.persist(path).map_err(|e| io_err(path)(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_proto_overwrites_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proto").join("minecraft.proto");
        write_proto(&path, b"first").unwrap();
        write_proto(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("minecraft.proto")]);
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory where the file should go makes the rename fail.
        let path = dir.path().join("minecraft.proto");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = write_proto(&path, b"data").unwrap_err();
        assert!(matches!(err, crate::ProtogenError::Io { .. }));
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("minecraft.proto")]);
    }
}
