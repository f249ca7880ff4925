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

use anyhow::{Context, Result};
use clap::Parser;
use mcpb_client::{ClientSettings, Minecraft, Vec3};

#[derive(Parser, Debug)]
#[command(version, about = "Greets the server and turns the block at the origin into obsidian")]
struct Args {
    /// Overrides the host from settings.ron
    #[arg(long)]
    host: Option<String>,

    /// Overrides the port from settings.ron
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long, default_value = "obsidian")]
    block: String,

    /// Writes the effective settings to the config dir before connecting.
    #[arg(long)]
    save_settings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = ClientSettings::load_from_disk()?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if args.save_settings {
        settings.save_to_disk()?;
    }

    let mc = Minecraft::connect_with_settings(settings)
        .await
        .context("Connecting to the plugin")?;
    log::info!("{:?}", mc);

    mc.post_to_chat("Hello Minecraft!").await?;
    let origin = Vec3::ZERO;
    let block = mc.block(origin).await?;
    mc.post_to_chat_parts(&["Block type at origin:", &block], " ")
        .await?;
    mc.post_to_chat(format!("Changing that block to {}!", args.block))
        .await?;
    mc.set_block(&args.block, origin).await?;

    mc.close().await;
    Ok(())
}
