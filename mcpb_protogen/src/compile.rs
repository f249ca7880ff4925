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

use std::path::{Path, PathBuf};

use crate::{config::GenerationTarget, ProtogenError, Result};

/// Turns an interface definition into generated sources inside `out_dir`.
pub trait ProtoCompiler {
    fn compile(&self, proto: &Path, out_dir: &Path) -> Result<()>;
}

/// tonic-build/prost-build backed compiler.
///
/// Uses `$PROTOC` when set, otherwise the protoc binary vendored by `protoc-bin-vendored`, so no
/// system toolchain is needed.
#[derive(Clone, Debug)]
pub struct TonicCompiler {
    build_client: bool,
    build_server: bool,
    emit_rerun_if_changed: bool,
    descriptor_set: Option<PathBuf>,
}

impl Default for TonicCompiler {
    fn default() -> Self {
        Self {
            build_client: true,
            build_server: false,
            emit_rerun_if_changed: false,
            descriptor_set: None,
        }
    }
}

impl TonicCompiler {
    pub fn for_target(target: &GenerationTarget) -> Self {
        Self {
            build_client: target.build_client,
            build_server: target.build_server,
            ..Default::default()
        }
    }
    pub fn with_client(mut self, build_client: bool) -> Self {
        self.build_client = build_client;
        self
    }
    pub fn with_server(mut self, build_server: bool) -> Self {
        self.build_server = build_server;
        self
    }
    /// Only meaningful inside a build script.
    pub fn with_rerun_if_changed(mut self, emit: bool) -> Self {
        self.emit_rerun_if_changed = emit;
        self
    }
    pub fn with_descriptor_set(mut self, path: impl Into<PathBuf>) -> Self {
        self.descriptor_set = Some(path.into());
        self
    }

    fn protoc_path() -> Result<PathBuf> {
        if let Some(protoc) = std::env::var_os("PROTOC") {
            return Ok(PathBuf::from(protoc));
        }
        protoc_bin_vendored::protoc_bin_path()
            .map_err(|e| ProtogenError::ProtocUnavailable(e.to_string()))
    }
}

impl ProtoCompiler for TonicCompiler {
    fn compile(&self, proto: &Path, out_dir: &Path) -> Result<()> {
        let include = match proto.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut config = prost_build::Config::new();
        config.protoc_executable(Self::protoc_path()?);

        let mut builder = tonic_build::configure()
            .build_client(self.build_client)
            .build_server(self.build_server)
            .emit_rerun_if_changed(self.emit_rerun_if_changed)
            .out_dir(out_dir);
        if let Some(descriptor_set) = &self.descriptor_set {
            builder = builder.file_descriptor_set_path(descriptor_set);
        }
        log::debug!(
            "Compiling {} into {} (client: {}, server: {})",
            proto.display(),
            out_dir.display(),
            self.build_client,
            self.build_server
        );
        builder
            .compile_protos_with_config(config, &[proto], &[include])
            .map_err(|source| ProtogenError::Compile {
                proto: proto.to_path_buf(),
                source,
            })
    }
}
