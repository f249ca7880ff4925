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

use std::{fmt::Display, str::FromStr};

use thiserror::Error;

use crate::vec3::Vec3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not a direction")]
pub struct ParseDirectionError(pub String);

/// The six axis-aligned directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    East,
    South,
    West,
    North,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::North,
        Direction::Up,
        Direction::Down,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::North => "north",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    pub fn unit(&self) -> Vec3 {
        match self {
            Direction::East => Vec3::new(1.0, 0.0, 0.0),
            Direction::South => Vec3::new(0.0, 0.0, 1.0),
            Direction::West => Vec3::new(-1.0, 0.0, 0.0),
            Direction::North => Vec3::new(0.0, 0.0, -1.0),
            Direction::Up => Vec3::new(0.0, 1.0, 0.0),
            Direction::Down => Vec3::new(0.0, -1.0, 0.0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseDirectionError(s.to_string()))
    }
}

/// The four horizontal directions, as used for block facings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cardinal {
    East,
    South,
    West,
    North,
}

impl Cardinal {
    pub const ALL: [Cardinal; 4] = [
        Cardinal::East,
        Cardinal::South,
        Cardinal::West,
        Cardinal::North,
    ];

    pub const fn as_str(&self) -> &'static str {
        self.direction().as_str()
    }

    pub const fn direction(&self) -> Direction {
        match self {
            Cardinal::East => Direction::East,
            Cardinal::South => Direction::South,
            Cardinal::West => Direction::West,
            Cardinal::North => Direction::North,
        }
    }

    pub fn opposite(&self) -> Cardinal {
        match self {
            Cardinal::East => Cardinal::West,
            Cardinal::South => Cardinal::North,
            Cardinal::West => Cardinal::East,
            Cardinal::North => Cardinal::South,
        }
    }
}

impl From<Cardinal> for Direction {
    fn from(value: Cardinal) -> Self {
        value.direction()
    }
}

impl TryFrom<Direction> for Cardinal {
    type Error = ParseDirectionError;

    fn try_from(value: Direction) -> Result<Self, Self::Error> {
        match value {
            Direction::East => Ok(Cardinal::East),
            Direction::South => Ok(Cardinal::South),
            Direction::West => Ok(Cardinal::West),
            Direction::North => Ok(Cardinal::North),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

impl Display for Cardinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cardinal {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Direction>()?.try_into()
    }
}

pub mod blocks {
    pub const AIR: &str = "air";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("UP".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(" north".parse::<Cardinal>(), Ok(Cardinal::North));
        assert!("up".parse::<Cardinal>().is_err());
        assert!("sideways".parse::<Direction>().is_err());
        for d in Direction::ALL {
            assert_eq!(d.to_string().parse::<Direction>(), Ok(d));
            assert_eq!(d.unit().direction_label(), d);
            assert_eq!(d.opposite().unit(), -d.unit());
        }
    }
}
