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

use std::path::PathBuf;

use crate::{
    checksum::{read_lock, sha256_hex, verify_checksum, write_lock},
    compile::ProtoCompiler,
    config::{GenerationTarget, ProtogenConfig},
    fetch::{fetch_proto, write_proto, ProtoFetcher},
    io_err, Result,
};

/// What to do with the pinned digest when a fresh definition is downloaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockPolicy {
    /// The download must match the lock file, otherwise nothing is written.
    Verify,
    /// Accept whatever was downloaded and pin it.
    Update,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    pub sha256: String,
    pub lock_changed: bool,
    pub generated: Vec<PathBuf>,
}

/// fetch -> verify -> write -> compile, strictly in that order. Any failure stops the run
/// before the next step starts.
pub struct Pipeline<'a> {
    config: &'a ProtogenConfig,
    lock_policy: LockPolicy,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a ProtogenConfig, lock_policy: LockPolicy) -> Self {
        Self {
            config,
            lock_policy,
        }
    }

    /// Downloads the definition and replaces the local copy. Returns the digest of the new copy
    /// and whether the lock file changed.
    pub fn fetch(&self, fetcher: &dyn ProtoFetcher) -> Result<(String, bool)> {
        let data = fetch_proto(fetcher, &self.config.source_url)?;
        let digest = sha256_hex(&data);
        let lock_changed = match self.lock_policy {
            LockPolicy::Verify => {
                let expected = read_lock(&self.config.lock_path)?;
                verify_checksum(&self.config.source_url, &data, &expected)?;
                false
            }
            LockPolicy::Update => {
                let previous = read_lock(&self.config.lock_path).ok();
                if previous.as_deref() != Some(digest.as_str()) {
                    log::warn!(
                        "Pinning {} at {} (was {})",
                        self.config.proto_path.display(),
                        digest,
                        previous.as_deref().unwrap_or("<unpinned>")
                    );
                    true
                } else {
                    false
                }
            }
        };
        write_proto(&self.config.proto_path, &data)?;
        if lock_changed {
            write_lock(&self.config.lock_path, &digest)?;
        }
        log::info!(
            "Wrote {} ({} bytes, sha256 {})",
            self.config.proto_path.display(),
            data.len(),
            digest
        );
        Ok((digest, lock_changed))
    }

    /// Runs the whole pipeline. `compiler_for` picks the compiler for each target, which lets
    /// targets differ in whether client or server stubs are emitted.
    pub fn run<C: ProtoCompiler>(
        &self,
        fetcher: &dyn ProtoFetcher,
        compiler_for: impl Fn(&GenerationTarget) -> C,
    ) -> Result<PipelineReport> {
        for target in &self.config.targets {
            std::fs::create_dir_all(&target.out_dir).map_err(io_err(&target.out_dir))?;
        }
        let (sha256, lock_changed) = self.fetch(fetcher)?;
        let mut generated = vec![];
        for target in &self.config.targets {
            log::info!(
                "Generating target `{}` into {}",
                target.name,
                target.out_dir.display()
            );
            compiler_for(target).compile(&self.config.proto_path, &target.out_dir)?;
            generated.push(target.out_dir.clone());
        }
        Ok(PipelineReport {
            sha256,
            lock_changed,
            generated,
        })
    }
}
