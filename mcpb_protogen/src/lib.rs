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

//! Fetches the plugin's `minecraft.proto`, pins it by content hash and compiles it into
//! message and service stubs.
//!
//! The same crate is used by `mcpb_core/build.rs` (with the `fetch` feature disabled) to check
//! the vendored copy against its lock file before running the code generator.

pub mod checksum;
pub mod compile;
pub mod config;
pub mod fetch;
pub mod pipeline;

use std::path::PathBuf;

use thiserror::Error;

pub use checksum::{read_lock, sha256_hex, verify_checksum, verify_vendored, write_lock};
pub use compile::{ProtoCompiler, TonicCompiler};
pub use config::{GenerationTarget, ProtogenConfig};
pub use fetch::{fetch_proto, write_proto, ProtoFetcher};
#[cfg(feature = "fetch")]
pub use fetch::HttpFetcher;
pub use pipeline::{LockPolicy, Pipeline, PipelineReport};

#[derive(Error, Debug)]
pub enum ProtogenError {
    #[error("Failed to fetch `{url}`: {message}")]
    Fetch { url: String, message: String },
    #[error("Fetching `{url}` returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("Checksum mismatch for {what}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        what: String,
        expected: String,
        actual: String,
    },
    #[error("Lock file {0:?} is missing; rerun with --update-lock to pin the current definition")]
    MissingLock(PathBuf),
    #[error("Lock file {path:?} is malformed: {reason}")]
    InvalidLock { path: PathBuf, reason: String },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No protoc available: {0}")]
    ProtocUnavailable(String),
    #[error("Compiling {proto:?} failed: {source}")]
    Compile {
        proto: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, ProtogenError>;

pub(crate) fn io_err(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ProtogenError {
    let path = path.into();
    move |source| ProtogenError::Io { path, source }
}
