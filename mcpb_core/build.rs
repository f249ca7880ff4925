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

use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use mcpb_protogen::{verify_vendored, ProtoCompiler, TonicCompiler};

fn main() -> Result<()> {
    let proto = PathBuf::from("proto/minecraft.proto");
    let lock = PathBuf::from("proto/minecraft.proto.sha256");
    println!("cargo:rerun-if-changed={}", lock.display());
    verify_vendored(&proto, &lock).context("Vendored minecraft.proto doesn't match its lock")?;

    let out_dir = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR not set")?);
    TonicCompiler::default()
        .with_client(true)
        .with_server(true)
        .with_rerun_if_changed(true)
        .with_descriptor_set(out_dir.join("mcpb_descriptor.bin"))
        .compile(&proto, &out_dir)
        .context("Compiling minecraft.proto")?;
    Ok(())
}
