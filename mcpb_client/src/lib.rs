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

//! Async client for the MCPB server-side plugin.
//!
//! ```no_run
//! # async fn demo() -> mcpb_client::Result<()> {
//! use mcpb_client::{Minecraft, Vec3};
//!
//! let mc = Minecraft::connect("localhost", 1789).await?;
//! mc.post_to_chat("Hello Minecraft!").await?;
//! let player = mc.player(None).await?;
//! mc.set_block("stone", player.pos().await?.down(1.0)).await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod connection;
pub mod entity;
pub mod error;
pub mod events;
pub mod minecraft;
pub mod player;
pub mod settings;
pub mod tools;
pub mod world;

pub use entity::{Entity, Helmet};
pub use error::{Error, Result};
pub use events::{
    BlockHitEvent, ChatEvent, Event, EventKind, PlayerDeathEvent, PlayerJoinEvent,
    PlayerLeaveEvent, ProjectileHitEvent, ProjectileTarget,
};
pub use minecraft::Minecraft;
pub use player::{GameMode, Player};
pub use settings::ClientSettings;
pub use world::{BlockCube, Flip, World, WorldTarget};

pub use mcpb_core::{
    colors, constants, protocol, text, Cardinal, Color, Direction, Enchantment, Nbt,
    StatusError, Vec3,
};

#[cfg(test)]
mod tests;
