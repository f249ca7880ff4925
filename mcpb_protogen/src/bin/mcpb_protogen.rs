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

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mcpb_protogen::{
    config::{GenerationTarget, CONFIG_RON_FILE},
    verify_vendored, HttpFetcher, LockPolicy, Pipeline, ProtogenConfig,
    TonicCompiler,
};

#[derive(Parser, Debug)]
#[command(version, about = "Fetches and compiles the plugin's minecraft.proto")]
struct Args {
    /// RON config file. Defaults are used when it doesn't exist.
    #[arg(short, long, value_name = "CONFIG", default_value = CONFIG_RON_FILE)]
    config: PathBuf,

    /// Overrides the source URL from the config.
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the definition and replace the vendored copy.
    Fetch {
        /// Accept the downloaded content and rewrite the lock file.
        #[arg(long)]
        update_lock: bool,
    },
    /// Download, then compile every target.
    Generate {
        #[arg(long)]
        update_lock: bool,
        /// Generate only the first configured target, into this directory.
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Check the vendored copy against the lock file. Never touches the network.
    Verify,
}

fn lock_policy(update_lock: bool) -> LockPolicy {
    if update_lock {
        LockPolicy::Update
    } else {
        LockPolicy::Verify
    }
}

fn override_out_dir(config: &mut ProtogenConfig, dir: PathBuf) {
    config.targets.truncate(1);
    match config.targets.first_mut() {
        Some(target) => target.out_dir = dir,
        None => config.targets.push(GenerationTarget {
            out_dir: dir,
            ..Default::default()
        }),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = ProtogenConfig::load(&args.config)
        .with_context(|| format!("Loading {}", args.config.display()))?;
    if let Some(url) = args.url {
        config.source_url = url;
    }

    match args.command {
        Command::Fetch { update_lock } => {
            let fetcher = HttpFetcher::new()?;
            let (digest, changed) = Pipeline::new(&config, lock_policy(update_lock))
                .fetch(&fetcher)
                .context("Fetching minecraft.proto")?;
            log::info!(
                "Vendored copy is at sha256 {}{}",
                digest,
                if changed { " (lock updated)" } else { "" }
            );
        }
        Command::Generate {
            update_lock,
            out_dir,
        } => {
            if let Some(dir) = out_dir {
                override_out_dir(&mut config, dir);
            }
            let fetcher = HttpFetcher::new()?;
            let report = Pipeline::new(&config, lock_policy(update_lock))
                .run(&fetcher, TonicCompiler::for_target)
                .context("Generating stubs")?;
            for dir in &report.generated {
                log::info!("Generated {}", dir.display());
            }
        }
        Command::Verify => {
            verify_vendored(&config.proto_path, &config.lock_path).with_context(|| {
                format!("Verifying {}", config.proto_path.display())
            })?;
            log::info!("{} matches its lock file", config.proto_path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(argv: &[&str]) -> std::result::Result<Option<PathBuf>, clap::Error> {
        let args = Args::try_parse_from(argv)?;
        match args.command {
            Command::Generate { out_dir, .. } => Ok(out_dir),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_out_dir_takes_one_value() {
        assert_eq!(
            generate(&["mcpb-protogen", "generate", "--out-dir", "a"]).unwrap(),
            Some(PathBuf::from("a"))
        );
        assert_eq!(generate(&["mcpb-protogen", "generate"]).unwrap(), None);
        assert!(generate(&["mcpb-protogen", "generate", "--out-dir", "a", "b"]).is_err());
        assert!(
            generate(&["mcpb-protogen", "generate", "--out-dir", "a", "--out-dir", "b"]).is_err()
        );
    }

    #[test]
    fn test_out_dir_keeps_first_target() {
        let mut config = ProtogenConfig::default();
        override_out_dir(&mut config, PathBuf::from("gen"));
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].name, "mcpb");
        assert_eq!(config.targets[0].out_dir, PathBuf::from("gen"));

        config.targets.clear();
        override_out_dir(&mut config, PathBuf::from("gen2"));
        assert_eq!(
            config.targets,
            vec![GenerationTarget {
                out_dir: PathBuf::from("gen2"),
                ..Default::default()
            }]
        );
    }
}
