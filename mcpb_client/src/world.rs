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

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use futures::{stream, StreamExt, TryStreamExt};
use mcpb_core::{
    check_status,
    protocol::{
        self, entity_request, BlockInfo, BlockRequest, Blocks, EntityLocation, EntityRequest,
        HeightRequest, WorldInfo, WorldRequest,
    },
    Cardinal, Color, Direction, Vec3,
};

use crate::{
    connection::Connection,
    entity::Entity,
    error::{Error, Result},
};

/// Number of single-block requests kept in flight by the bulk read helpers.
const MAX_INFLIGHT_REQUESTS: usize = 64;

pub const OVERWORLD_KEY: &str = "minecraft:overworld";
pub const NETHER_KEY: &str = "minecraft:the_nether";
pub const END_KEY: &str = "minecraft:the_end";

/// Blocks indexed as `[x][y][z]`, as returned by [World::copy_block_cube].
pub type BlockCube = Vec<Vec<Vec<String>>>;

/// Adds the `minecraft:` namespace to bare world keys.
pub fn normalize_world_key(key: &str) -> String {
    if key.contains(':') {
        key.to_string()
    } else {
        format!("minecraft:{}", key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WorldData {
    pub(crate) name: String,
    pub(crate) key: String,
}

/// Either a world handle or a world key such as `"the_end"`.
#[derive(Clone, Copy)]
pub enum WorldTarget<'a> {
    World(&'a World),
    Key(&'a str),
}

impl<'a> From<&'a World> for WorldTarget<'a> {
    fn from(world: &'a World) -> Self {
        WorldTarget::World(world)
    }
}

impl<'a> From<&'a str> for WorldTarget<'a> {
    fn from(key: &'a str) -> Self {
        WorldTarget::Key(key)
    }
}

impl WorldTarget<'_> {
    /// Resolves to the name the plugin knows the world by.
    pub(crate) async fn resolve(&self, conn: &Connection) -> Result<protocol::World> {
        let data = match self {
            WorldTarget::Key(key) => conn.world_by_key(key).await?,
            WorldTarget::World(world) => {
                if !world.conn.same_as(conn) {
                    return Err(Error::ForeignWorld);
                }
                match &world.data {
                    Some(data) => {
                        let current = conn.world_by_name(&data.name).await?;
                        if !Arc::ptr_eq(&current, data) {
                            return Err(Error::StaleWorld(data.name.clone()));
                        }
                        current
                    }
                    None => {
                        return Err(Error::InvalidArgument(
                            "the default world is not a destination".to_string(),
                        ))
                    }
                }
            }
        };
        Ok(protocol::World {
            name: data.name.clone(),
            info: None,
        })
    }
}

/// Mirroring applied after rotation by [World::paste_block_cube].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

/// Maps every block of `cube` to its offset from the paste origin once rotated towards
/// `rotation` (the cube's +x axis ends up pointing that way) and flipped.
pub fn plan_paste(
    cube: &BlockCube,
    rotation: Direction,
    flip: Flip,
) -> Result<Vec<((i32, i32, i32), &str)>> {
    let xlen = cube.len();
    let ylen = cube.first().map(Vec::len).unwrap_or(0);
    let zlen = cube
        .first()
        .and_then(|plane| plane.first())
        .map(Vec::len)
        .unwrap_or(0);
    if xlen == 0 || ylen == 0 || zlen == 0 {
        return Err(Error::InvalidArgument("block cube is empty".to_string()));
    }
    if cube
        .iter()
        .any(|plane| plane.len() != ylen || plane.iter().any(|line| line.len() != zlen))
    {
        return Err(Error::InvalidArgument(
            "block cube is not rectangular".to_string(),
        ));
    }

    let (mut xlen, mut ylen, mut zlen) = (xlen as i64, ylen as i64, zlen as i64);
    let (mut xstride, mut ystride, mut zstride) = (ylen * zlen, zlen, 1i64);
    match rotation {
        Direction::East => {}
        Direction::South => {
            zstride = -zstride;
            std::mem::swap(&mut xlen, &mut zlen);
            std::mem::swap(&mut xstride, &mut zstride);
        }
        Direction::West => {
            xstride = -xstride;
            zstride = -zstride;
        }
        Direction::North => {
            std::mem::swap(&mut xlen, &mut zlen);
            std::mem::swap(&mut xstride, &mut zstride);
            zstride = -zstride;
        }
        Direction::Up => {
            ystride = -ystride;
            std::mem::swap(&mut xlen, &mut ylen);
            std::mem::swap(&mut xstride, &mut ystride);
        }
        Direction::Down => {
            std::mem::swap(&mut xlen, &mut ylen);
            std::mem::swap(&mut xstride, &mut ystride);
            ystride = -ystride;
        }
    }
    if flip.x {
        xstride = -xstride;
    }
    if flip.y {
        ystride = -ystride;
    }
    if flip.z {
        zstride = -zstride;
    }

    // Walking an axis backwards when its stride is negative.
    let source = |index: i64, len: i64, stride: i64| {
        if stride >= 0 {
            index
        } else {
            len - 1 - index
        }
    };
    let flat: Vec<&str> = cube.iter().flatten().flatten().map(String::as_str).collect();
    let mut planned = Vec::with_capacity(flat.len());
    for xi in 0..xlen {
        let x = source(xi, xlen, xstride);
        for yi in 0..ylen {
            let y = source(yi, ylen, ystride);
            for zi in 0..zlen {
                let z = source(zi, zlen, zstride);
                let index = x * xstride.abs() + y * ystride.abs() + z * zstride.abs();
                let block = flat.get(index as usize).ok_or_else(|| {
                    Error::InvalidArgument(format!("paste index {} out of range", index))
                })?;
                planned.push(((xi as i32, yi as i32, zi as i32), *block));
            }
        }
    }
    Ok(planned)
}

/// Block and entity operations on one world.
///
/// The handle returned by dereferencing [crate::Minecraft] is the *default world*: requests
/// carry no world, so the plugin decides which one is meant.
#[derive(Clone)]
pub struct World {
    conn: Connection,
    data: Option<Arc<WorldData>>,
}

impl Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            Some(data) => write!(f, "World(key={})", data.key),
            None => write!(f, "DefaultWorld"),
        }
    }
}

impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        self.conn.same_as(&other.conn)
            && match (&self.data, &other.data) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl World {
    pub(crate) fn new(conn: Connection, data: Option<Arc<WorldData>>) -> Self {
        Self { conn, data }
    }

    pub(crate) fn default_world(conn: Connection) -> Self {
        Self { conn, data: None }
    }

    /// Folder name of the world. `None` for the default world.
    pub fn name(&self) -> Option<&str> {
        self.data.as_deref().map(|d| d.name.as_str())
    }

    /// Namespaced key, e.g. `minecraft:the_nether`. `None` for the default world.
    pub fn key(&self) -> Option<&str> {
        self.data.as_deref().map(|d| d.key.as_str())
    }

    pub fn is_default(&self) -> bool {
        self.data.is_none()
    }

    fn proto(&self) -> Option<protocol::World> {
        self.data.as_ref().map(|data| protocol::World {
            name: data.name.clone(),
            info: None,
        })
    }

    /// For the default world: whether pvp is on in any world.
    pub async fn pvp(&self) -> Result<bool> {
        let response = self
            .conn
            .client()
            .access_worlds(WorldRequest {
                worlds: self.proto().into_iter().collect(),
            })
            .await?
            .into_inner();
        check_status(response.status.as_ref())?;
        Ok(response
            .worlds
            .iter()
            .any(|w| w.info.as_ref().is_some_and(|info| info.pvp)))
    }

    /// For the default world: sets pvp in every world.
    pub async fn set_pvp(&self, value: bool) -> Result<()> {
        let names = match &self.data {
            Some(data) => vec![data.name.clone()],
            None => {
                let response = self
                    .conn
                    .client()
                    .access_worlds(WorldRequest { worlds: vec![] })
                    .await?
                    .into_inner();
                check_status(response.status.as_ref())?;
                response.worlds.into_iter().map(|w| w.name).collect()
            }
        };
        let request = WorldRequest {
            worlds: names
                .into_iter()
                .map(|name| protocol::World {
                    name,
                    info: Some(WorldInfo {
                        key: String::new(),
                        pvp: value,
                    }),
                })
                .collect(),
        };
        let response = self.conn.client().access_worlds(request).await?.into_inner();
        check_status(response.status.as_ref())?;
        Ok(())
    }

    /// Position of the highest non-air block at x/z.
    pub async fn highest_pos(&self, x: i32, z: i32) -> Result<Vec3> {
        let response = self
            .conn
            .client()
            .get_height(HeightRequest {
                world: self.proto(),
                x,
                z,
            })
            .await?
            .into_inner();
        check_status(response.status.as_ref())?;
        let pos = response
            .block
            .and_then(|b| b.pos)
            .ok_or_else(|| Error::Protocol("getHeight returned no block".to_string()))?;
        Ok(pos.into())
    }

    pub async fn height(&self, x: i32, z: i32) -> Result<i32> {
        Ok(self.highest_pos(x, z).await?.y as i32)
    }

    pub async fn block(&self, pos: Vec3) -> Result<String> {
        let response = self
            .conn
            .client()
            .get_block(BlockRequest {
                world: self.proto(),
                pos: Some(pos.to_block_pos()),
            })
            .await?
            .into_inner();
        check_status(response.status.as_ref())?;
        Ok(response.info.map(|i| i.block_type).unwrap_or_default())
    }

    /// Block types at every position, in order.
    pub async fn blocks(&self, positions: &[Vec3]) -> Result<Vec<String>> {
        stream::iter(positions.iter().map(|pos| self.block(*pos)))
            .buffered(MAX_INFLIGHT_REQUESTS)
            .try_collect()
            .await
    }

    pub async fn set_block(&self, block_type: &str, pos: Vec3) -> Result<()> {
        let status = self
            .conn
            .client()
            .set_block(protocol::Block {
                world: self.proto(),
                info: Some(BlockInfo {
                    block_type: block_type.to_string(),
                }),
                pos: Some(pos.to_block_pos()),
            })
            .await?
            .into_inner();
        check_status(Some(&status))?;
        Ok(())
    }

    /// Sets every position to `block_type`, split into requests of at most `max_blocks`.
    pub async fn set_block_list(&self, block_type: &str, positions: &[Vec3]) -> Result<()> {
        let chunk_size = self.conn.settings().max_blocks.max(1);
        for chunk in positions.chunks(chunk_size) {
            let status = self
                .conn
                .client()
                .set_blocks(Blocks {
                    world: self.proto(),
                    info: Some(BlockInfo {
                        block_type: block_type.to_string(),
                    }),
                    pos: chunk.iter().map(Vec3::to_block_pos).collect(),
                })
                .await?
                .into_inner();
            check_status(Some(&status))?;
        }
        Ok(())
    }

    /// Fills the cuboid between the two corners, both inclusive.
    pub async fn set_block_cube(&self, block_type: &str, pos1: Vec3, pos2: Vec3) -> Result<()> {
        let status = self
            .conn
            .client()
            .set_block_cube(Blocks {
                world: self.proto(),
                info: Some(BlockInfo {
                    block_type: block_type.to_string(),
                }),
                pos: vec![pos1.to_block_pos(), pos2.to_block_pos()],
            })
            .await?
            .into_inner();
        check_status(Some(&status))?;
        Ok(())
    }

    /// Sets every combination of the given coordinates, e.g. `(0..10).step_by(2)` for x.
    /// Each axis must be finite.
    pub async fn set_block_grid(
        &self,
        block_type: &str,
        xs: impl IntoIterator<Item = i32>,
        ys: impl IntoIterator<Item = i32>,
        zs: impl IntoIterator<Item = i32>,
    ) -> Result<()> {
        let ys: Vec<i32> = ys.into_iter().collect();
        let zs: Vec<i32> = zs.into_iter().collect();
        let mut positions = vec![];
        for x in xs {
            for y in &ys {
                for z in &zs {
                    positions.push(Vec3::from((x, *y, *z)));
                }
            }
        }
        self.set_block_list(block_type, &positions).await
    }

    async fn fetch_entities(
        &self,
        include_not_spawnable: bool,
        with_locations: bool,
        entity_type: Option<&str>,
    ) -> Result<Vec<Entity>> {
        let request = EntityRequest {
            filter: Some(entity_request::Filter::Worldwide(
                entity_request::WorldEntities {
                    world: self.proto(),
                    r#type: entity_type.unwrap_or_default().to_string(),
                    include_not_spawnable,
                },
            )),
            with_locations,
        };
        let response = self.conn.client().get_entities(request).await?.into_inner();
        check_status(response.status.as_ref())?;
        let mut entities = Vec::with_capacity(response.entities.len());
        for raw in response.entities {
            // Players are only listed together with non-spawnable entities. They get their own
            // handles through the player API.
            if include_not_spawnable && raw.r#type == "player" {
                continue;
            }
            let entity = self.conn.entity(&raw.id);
            if with_locations {
                entity.apply_update(&raw).await?;
            } else {
                entity.set_type(&raw.r#type);
            }
            entities.push(entity);
        }
        Ok(entities)
    }

    /// All entities of `entity_type` (or all types). Projectiles, drops and the like are only
    /// included if `only_spawnable` is false.
    pub async fn entities(
        &self,
        entity_type: Option<&str>,
        only_spawnable: bool,
    ) -> Result<Vec<Entity>> {
        self.fetch_entities(!only_spawnable, false, entity_type)
            .await
    }

    pub async fn entities_around(
        &self,
        pos: Vec3,
        distance: f64,
        entity_type: Option<&str>,
        only_spawnable: bool,
    ) -> Result<Vec<Entity>> {
        let entities = self
            .fetch_entities(!only_spawnable, true, entity_type)
            .await?;
        Ok(entities
            .into_iter()
            .filter(|e| e.cached_pos().distance(pos) <= distance)
            .collect())
    }

    pub async fn spawn_entity(&self, entity_type: &str, pos: Vec3) -> Result<Entity> {
        let response = self
            .conn
            .client()
            .spawn_entity(protocol::Entity {
                id: String::new(),
                r#type: entity_type.to_string(),
                location: Some(EntityLocation {
                    world: self.proto(),
                    pos: Some(pos.to_proto_f()),
                    orientation: None,
                }),
            })
            .await?
            .into_inner();
        check_status(response.status.as_ref())?;
        let spawned = response
            .entity
            .ok_or_else(|| Error::Protocol("spawnEntity returned no entity".to_string()))?;
        let entity = self.conn.entity(&spawned.id);
        entity.set_type(&spawned.r#type);
        log::debug!("Spawned {:?}", entity);
        Ok(entity)
    }

    /// Removes all non-player entities of `entity_type` (or all types) without drops.
    pub async fn remove_entities(&self, entity_type: Option<&str>) -> Result<()> {
        let selector = match entity_type {
            Some(entity_type) => format!("@e[type={}]", entity_type),
            None => "@e[type=!player]".to_string(),
        };
        self.run_command(&format!("tp {} 0 -50000 0", selector))
            .await?;
        self.run_command(&format!("kill {}", selector)).await
    }

    /// Reads the cuboid between the corners (both inclusive) as `[x][y][z]`.
    pub async fn copy_block_cube(&self, pos1: Vec3, pos2: Vec3) -> Result<BlockCube> {
        let low = pos1.map_pairwise(pos2, f64::min).floor();
        let high = pos1.map_pairwise(pos2, f64::max).floor();
        let (x0, y0, z0) = (low.x as i32, low.y as i32, low.z as i32);
        let (x1, y1, z1) = (high.x as i32, high.y as i32, high.z as i32);

        let positions: Vec<Vec3> = (x0..=x1)
            .flat_map(|x| (y0..=y1).flat_map(move |y| (z0..=z1).map(move |z| Vec3::from((x, y, z)))))
            .collect();
        let mut flat = self.blocks(&positions).await?.into_iter();

        let mut cube = Vec::with_capacity((x1 - x0 + 1) as usize);
        for _ in x0..=x1 {
            let mut plane = Vec::with_capacity((y1 - y0 + 1) as usize);
            for _ in y0..=y1 {
                plane.push(flat.by_ref().take((z1 - z0 + 1) as usize).collect());
            }
            cube.push(plane);
        }
        Ok(cube)
    }

    /// Pastes a cube as produced by [World::copy_block_cube] with its lowest corner at `pos`.
    /// See [plan_paste] for how rotation and flips are applied.
    pub async fn paste_block_cube(
        &self,
        cube: &BlockCube,
        pos: Vec3,
        rotation: Direction,
        flip: Flip,
    ) -> Result<()> {
        let origin = pos.floor();
        let mut by_type: BTreeMap<&str, Vec<Vec3>> = BTreeMap::new();
        for ((x, y, z), block) in plan_paste(cube, rotation, flip)? {
            by_type
                .entry(block)
                .or_default()
                .push(origin + Vec3::from((x, y, z)));
        }
        for (block_type, positions) in by_type {
            self.set_block_list(block_type, &positions).await?;
        }
        Ok(())
    }

    /// Places a two-block bed with its foot at `pos` and its head one block towards
    /// `direction`.
    pub async fn place_bed(&self, pos: Vec3, direction: Cardinal, color: Color) -> Result<()> {
        let foot = pos.to_block_pos();
        let head = pos.floor().towards(direction.direction(), 1.0).to_block_pos();
        for (part, at) in [("foot", foot), ("head", head)] {
            self.run_command(&format!(
                "setblock {} {} {} {}_bed[part={},facing={}]",
                at.x,
                at.y,
                at.z,
                color.as_str(),
                part,
                direction.as_str()
            ))
            .await?;
        }
        Ok(())
    }

    pub async fn spawn_items(&self, pos: Vec3, item_type: &str, amount: u32) -> Result<()> {
        let at = pos.to_block_pos();
        self.run_command(&format!(
            "summon item {} {} {} {{Item:{{id:\"{}\", Count:{}}}}}",
            at.x, at.y, at.z, item_type, amount
        ))
        .await
    }

    /// Runs a server command without the leading `/`. A world other than the default one runs
    /// it inside itself.
    pub async fn run_command(&self, command: &str) -> Result<()> {
        match &self.data {
            Some(data) => {
                self.conn
                    .run_command(format!("execute in {} run {}", data.key, command))
                    .await
            }
            None => self.conn.run_command(command.to_string()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(xlen: usize, ylen: usize, zlen: usize) -> BlockCube {
        (0..xlen)
            .map(|x| {
                (0..ylen)
                    .map(|y| (0..zlen).map(|z| format!("{}{}{}", x, y, z)).collect())
                    .collect()
            })
            .collect()
    }

    fn lookup(planned: &[((i32, i32, i32), &str)], at: (i32, i32, i32)) -> String {
        planned
            .iter()
            .find(|(pos, _)| *pos == at)
            .map(|(_, block)| block.to_string())
            .unwrap()
    }

    #[test]
    fn test_normalize_world_key() {
        assert_eq!(normalize_world_key("the_end"), END_KEY);
        assert_eq!(normalize_world_key(NETHER_KEY), NETHER_KEY);
        assert_eq!(normalize_world_key("custom:mine"), "custom:mine");
    }

    #[test]
    fn test_plan_paste_east_is_identity() {
        let c = cube(2, 3, 4);
        let planned = plan_paste(&c, Direction::East, Flip::default()).unwrap();
        assert_eq!(planned.len(), 24);
        for ((x, y, z), block) in planned {
            assert_eq!(block, format!("{}{}{}", x, y, z));
        }
    }

    #[test]
    fn test_plan_paste_rotations() {
        let c = cube(2, 1, 3);
        // +x of the cube points south: new z is old x, new x runs against old z.
        let south = plan_paste(&c, Direction::South, Flip::default()).unwrap();
        assert_eq!(south.len(), 6);
        assert_eq!(lookup(&south, (0, 0, 0)), "002");
        assert_eq!(lookup(&south, (2, 0, 0)), "000");
        assert_eq!(lookup(&south, (2, 0, 1)), "100");

        let west = plan_paste(&c, Direction::West, Flip::default()).unwrap();
        assert_eq!(lookup(&west, (0, 0, 0)), "102");
        assert_eq!(lookup(&west, (1, 0, 2)), "000");

        let north = plan_paste(&c, Direction::North, Flip::default()).unwrap();
        assert_eq!(lookup(&north, (0, 0, 0)), "100");
        assert_eq!(lookup(&north, (0, 0, 1)), "000");
        assert_eq!(lookup(&north, (2, 0, 1)), "002");

        let column = cube(2, 1, 1);
        let up = plan_paste(&column, Direction::Up, Flip::default()).unwrap();
        assert_eq!(up, vec![((0, 0, 0), "000"), ((0, 1, 0), "100")]);

        let down = plan_paste(&column, Direction::Down, Flip::default()).unwrap();
        assert_eq!(down, vec![((0, 0, 0), "100"), ((0, 1, 0), "000")]);
    }

    #[test]
    fn test_plan_paste_flips() {
        let c = cube(2, 2, 1);
        let flipped = plan_paste(
            &c,
            Direction::East,
            Flip {
                x: true,
                y: false,
                z: false,
            },
        )
        .unwrap();
        assert_eq!(lookup(&flipped, (0, 0, 0)), "100");
        assert_eq!(lookup(&flipped, (1, 1, 0)), "010");

        let both = plan_paste(
            &c,
            Direction::East,
            Flip {
                x: true,
                y: true,
                z: false,
            },
        )
        .unwrap();
        assert_eq!(lookup(&both, (0, 0, 0)), "110");
    }

    #[test]
    fn test_plan_paste_rejects_bad_cubes() {
        assert!(matches!(
            plan_paste(&vec![], Direction::East, Flip::default()),
            Err(Error::InvalidArgument(_))
        ));
        let mut ragged = cube(2, 2, 2);
        ragged[1][0].pop();
        assert!(matches!(
            plan_paste(&ragged, Direction::East, Flip::default()),
            Err(Error::InvalidArgument(_))
        ));
    }
}
