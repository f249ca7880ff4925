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

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use mcpb_core::{constants::blocks::AIR, Vec3};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{Error, Result},
    world::{World, WorldTarget},
    Minecraft,
};

const MAX_BATCH_PERIOD: Duration = Duration::from_secs(10);

fn sign(n: f64) -> f64 {
    if n >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Where the turtle looks. Both vectors stay unit length and perpendicular.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Heading {
    pub front: Vec3,
    pub up: Vec3,
}

impl Default for Heading {
    fn default() -> Self {
        Self {
            front: Vec3::ZERO.east(1.0),
            up: Vec3::ZERO.up(1.0),
        }
    }
}

impl Heading {
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).norm()
    }

    /// Tilts towards `to` by `degrees`.
    pub fn rotate(&mut self, degrees: f64, to: Vec3) {
        let axis = self.front.cross(to).norm();
        self.front = self.front.rotate(axis, degrees).norm();
        self.up = self.up.rotate(axis, degrees).norm();
    }

    /// Points straight at `target` as seen from `from`. Targets straight above or below, or
    /// at `from` itself, leave the heading unchanged.
    pub fn look_at(&mut self, from: Vec3, target: Vec3) {
        let delta = target - from;
        let flat = delta.with_y(0.0);
        if flat.length() == 0.0 {
            return;
        }
        let direction = delta.norm();
        self.front = flat.norm();
        self.up = Vec3::ZERO.up(1.0);
        let angle = self.front.angle(direction) * sign(delta.y);
        self.rotate(angle, self.up);
    }
}

/// Blocks covered by a pen of `size` centered on the block containing `center`.
pub fn pen_positions(center: Vec3, size: u32) -> Vec<Vec3> {
    let center = center.floor();
    if size <= 1 {
        return vec![center];
    }
    let size = size as i32;
    let range = -(size / 2)..(size / 2 + size % 2);
    let mut positions = Vec::with_capacity((size * size * size) as usize);
    for x in range.clone() {
        for y in range.clone() {
            for z in range.clone() {
                positions.push(center + Vec3::from((x, y, z)));
            }
        }
    }
    positions
}

struct Batch {
    pending: Arc<Mutex<Vec<(String, Vec3)>>>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

async fn flush(world: &World, pending: &Mutex<Vec<(String, Vec3)>>) -> Result<()> {
    let drained = std::mem::take(&mut *pending.lock());
    let mut by_block: BTreeMap<String, Vec<Vec3>> = BTreeMap::new();
    for (block, pos) in drained {
        by_block.entry(block).or_default().push(pos);
    }
    for (block, positions) in by_block {
        world.set_block_list(&block, &positions).await?;
    }
    Ok(())
}

/// Draws with blocks while it moves, like Logo's turtle.
///
/// All moves and settings chain:
/// `turtle.forward(5.0).await?.right(90.0).await?.forward(5.0).await?`.
pub struct Turtle {
    world: World,
    pos: Vec3,
    home: Vec3,
    heading: Heading,
    head: String,
    body: String,
    speed: f64,
    pen_down: bool,
    show_head: bool,
    pen_size: u32,
    head_positions: Vec<Vec3>,
    batch: Option<Batch>,
}

impl Turtle {
    /// Starts at `pos` in `world`. A missing position means the default player's position, and
    /// then also the player's world unless one is given. Without either, the default world is
    /// drawn in.
    pub async fn new(
        mc: &Minecraft,
        pos: Option<Vec3>,
        world: Option<WorldTarget<'_>>,
    ) -> Result<Self> {
        let mut world = match world {
            Some(WorldTarget::World(world)) => Some(world.clone()),
            Some(WorldTarget::Key(key)) => Some(mc.world_by_key(key).await?),
            None => None,
        };
        let pos = match pos {
            Some(pos) => pos,
            None => {
                let player = mc.player(None).await?;
                if world.is_none() {
                    world = Some(player.world().await?);
                }
                player.pos().await?
            }
        };
        let mut turtle = Self {
            world: world.unwrap_or_else(|| (**mc).clone()),
            pos,
            home: pos,
            heading: Heading::default(),
            head: "diamond_block".to_string(),
            body: "black_wool".to_string(),
            speed: 1.0,
            pen_down: true,
            show_head: true,
            pen_size: 1,
            head_positions: vec![],
            batch: None,
        };
        turtle.paint().await?;
        Ok(turtle)
    }

    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    async fn paint(&mut self) -> Result<()> {
        let new_head = pen_positions(self.pos, self.pen_size);
        if let Some(batch) = &self.batch {
            batch
                .pending
                .lock()
                .extend(new_head.into_iter().map(|p| (self.body.clone(), p)));
            return Ok(());
        }
        if !self.head_positions.is_empty() {
            let old_head = std::mem::take(&mut self.head_positions);
            let block = if self.pen_down { self.body.as_str() } else { AIR };
            self.world.set_block_list(block, &old_head).await?;
        }
        if self.show_head {
            self.world.set_block_list(&self.head, &new_head).await?;
            self.head_positions = new_head;
        } else if self.pen_down {
            self.world.set_block_list(&self.body, &new_head).await?;
        }
        Ok(())
    }

    /// Moves `by` whole blocks along the heading, painting every step. Negative values move
    /// backwards.
    pub async fn forward(&mut self, by: f64) -> Result<&mut Self> {
        let wait = (self.speed > 0.0).then(|| Duration::from_secs_f64(1.0 / self.speed));
        for _ in 0..(by.abs() as u64) {
            self.pos = self.pos + self.heading.front * sign(by);
            self.paint().await?;
            if let Some(wait) = wait {
                tokio::time::sleep(wait).await;
            }
        }
        Ok(self)
    }

    pub async fn backward(&mut self, by: f64) -> Result<&mut Self> {
        self.forward(-by).await
    }

    pub async fn right(&mut self, degrees: f64) -> Result<&mut Self> {
        let to = self.heading.right();
        self.heading.rotate(degrees, to);
        Ok(self)
    }

    pub async fn left(&mut self, degrees: f64) -> Result<&mut Self> {
        self.right(-degrees).await
    }

    pub async fn up(&mut self, degrees: f64) -> Result<&mut Self> {
        let to = self.heading.up;
        self.heading.rotate(degrees, to);
        Ok(self)
    }

    pub async fn down(&mut self, degrees: f64) -> Result<&mut Self> {
        self.up(-degrees).await
    }

    /// Walks to `pos` in a straight line. The heading is the same afterwards.
    pub async fn goto(&mut self, pos: Vec3) -> Result<&mut Self> {
        let heading = self.heading;
        self.heading.look_at(self.pos, pos);
        self.forward((pos - self.pos).length()).await?;
        self.pos = pos;
        self.heading = heading;
        self.paint().await?;
        Ok(self)
    }

    /// Walks back to the starting position and faces east again.
    pub async fn home(&mut self) -> Result<&mut Self> {
        self.goto(self.home).await?;
        self.heading = Heading::default();
        Ok(self)
    }

    /// Jumps to `pos` without drawing the way there.
    pub async fn teleport(&mut self, pos: Vec3) -> Result<&mut Self> {
        self.pos = pos;
        self.paint().await?;
        Ok(self)
    }

    pub async fn head(&mut self, block: &str) -> Result<&mut Self> {
        self.head = block.to_string();
        self.paint().await?;
        Ok(self)
    }

    pub fn body(&mut self, block: &str) -> &mut Self {
        self.body = block.to_string();
        self
    }

    /// Roughly blocks per second. 0 doesn't wait between steps at all.
    pub fn speed(&mut self, speed: f64) -> Result<&mut Self> {
        if !(speed >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "turtle speed must not be negative, got {}",
                speed
            )));
        }
        self.speed = speed;
        Ok(self)
    }

    pub async fn pen_down(&mut self) -> Result<&mut Self> {
        self.pen_down = true;
        self.paint().await?;
        Ok(self)
    }

    pub async fn pen_up(&mut self) -> Result<&mut Self> {
        self.pen_down = false;
        self.paint().await?;
        Ok(self)
    }

    pub async fn pen_size(&mut self, size: u32) -> Result<&mut Self> {
        if size < 1 {
            return Err(Error::InvalidArgument(
                "pen size must be at least 1".to_string(),
            ));
        }
        self.pen_size = size;
        self.paint().await?;
        Ok(self)
    }

    pub async fn show_head(&mut self) -> Result<&mut Self> {
        self.show_head = true;
        self.paint().await?;
        Ok(self)
    }

    pub async fn hide_head(&mut self) -> Result<&mut Self> {
        self.show_head = false;
        self.paint().await?;
        Ok(self)
    }

    /// Collects painted blocks and sends them every `period` instead of one request per step.
    /// The head isn't drawn meanwhile. Calling it again changes the period.
    pub async fn start_batch_mode(&mut self, period: Duration) -> Result<&mut Self> {
        if period.is_zero() {
            return Err(Error::InvalidArgument(
                "batch period must be positive".to_string(),
            ));
        }
        if period > MAX_BATCH_PERIOD {
            return Err(Error::InvalidArgument(format!(
                "batch period must be at most {:?}",
                MAX_BATCH_PERIOD
            )));
        }
        let pending = match self.batch.take() {
            Some(batch) => {
                batch.cancel.cancel();
                if let Err(e) = batch.task.await {
                    log::warn!("Turtle batch task failed: {:?}", e);
                }
                batch.pending
            }
            None => Arc::new(Mutex::new(Vec::new())),
        };
        let cancel = CancellationToken::new();
        let task = {
            let world = self.world.clone();
            let pending = pending.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await;
                while !cancel.is_cancelled() {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = flush(&world, &pending).await {
                                log::warn!("Turtle failed to flush a batch: {:?}", e);
                            }
                        }
                        _ = cancel.cancelled() => {}
                    }
                }
            })
        };
        self.batch = Some(Batch {
            pending,
            cancel,
            task,
        });
        Ok(self)
    }

    /// Sends whatever is still pending and goes back to painting every step.
    pub async fn stop_batch_mode(&mut self) -> Result<&mut Self> {
        if let Some(batch) = self.batch.take() {
            batch.cancel.cancel();
            if let Err(e) = batch.task.await {
                log::warn!("Turtle batch task failed: {:?}", e);
            }
            flush(&self.world, &batch.pending).await?;
        }
        Ok(self)
    }
}

impl Drop for Turtle {
    fn drop(&mut self) {
        if let Some(batch) = &self.batch {
            batch.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::assert_relative_eq;

    use super::*;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
    }

    #[test]
    fn test_turning() {
        let mut heading = Heading::default();
        assert_vec_eq(heading.right(), Vec3::ZERO.south(1.0));

        let to = heading.right();
        heading.rotate(90.0, to);
        assert_vec_eq(heading.front, Vec3::ZERO.south(1.0));
        assert_vec_eq(heading.up, Vec3::ZERO.up(1.0));

        let to = heading.up;
        heading.rotate(90.0, to);
        assert_vec_eq(heading.front, Vec3::ZERO.up(1.0));
        assert_vec_eq(heading.up, Vec3::ZERO.north(1.0));
    }

    #[test]
    fn test_look_at() {
        let mut heading = Heading::default();
        heading.look_at(Vec3::ZERO, Vec3::new(0.0, 5.0, 5.0));
        assert_vec_eq(heading.front, Vec3::new(0.0, 1.0, 1.0).norm());

        let before = heading;
        heading.look_at(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(heading, before);
        heading.look_at(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(heading, before);
    }

    #[test]
    fn test_pen_positions() {
        assert_eq!(
            pen_positions(Vec3::new(1.5, 2.2, -0.5), 1),
            vec![Vec3::new(1.0, 2.0, -1.0)]
        );
        let two = pen_positions(Vec3::ZERO, 2);
        assert_eq!(two.len(), 8);
        assert!(two.contains(&Vec3::new(-1.0, -1.0, -1.0)));
        assert!(two.contains(&Vec3::new(0.0, 0.0, 0.0)));
        let three = pen_positions(Vec3::ZERO, 3);
        assert_eq!(three.len(), 27);
        assert!(three.contains(&Vec3::new(1.0, 1.0, 1.0)));
        assert!(three.contains(&Vec3::new(-1.0, -1.0, -1.0)));
    }
}
