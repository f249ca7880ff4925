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

use std::{
    fmt::Debug,
    ops::{Add, Div, Mul, Neg, Sub},
};

use crate::constants::{Cardinal, Direction};
use crate::protocol;

/// A 3D vector in world space. Minecraft's axes: +x is east, +y is up, +z is south.
///
/// Values are immutable; every operation returns a new vector. PartialOrd is lexicographic on
/// (x, y, z), which is only meant for sorting.
#[derive(PartialEq, PartialOrd, Clone, Copy, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Debug for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Vec3({}, {}, {})", self.x, self.y, self.z))
    }
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Builds a unit direction vector.
    ///
    /// yaw: -180..180 (-180/180 north, -90 east, 0 south, 90 west)
    /// pitch: -90..90 (-90 up, 0 straight, 90 down)
    pub fn from_yaw_pitch(yaw: f64, pitch: f64) -> Self {
        let yawed = Vec3::ZERO.south(1.0).rotate(Vec3::ZERO.down(1.0), yaw);
        yawed.rotate(yawed.cross(Vec3::ZERO.down(1.0)), pitch)
    }

    /// Inverse of [Vec3::from_yaw_pitch]. The zero vector maps to (0, 0).
    pub fn yaw_pitch(&self) -> (f64, f64) {
        if self.x == 0.0 && self.y == 0.0 && self.z == 0.0 {
            return (0.0, 0.0);
        }
        let yaw = -self.x.atan2(self.z).to_degrees();
        let pitch = (self.z.hypot(self.x)).atan2(self.y).to_degrees() - 90.0;
        (yaw, pitch)
    }

    pub fn dot(&self, v: Vec3) -> f64 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    pub fn cross(&self, v: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * v.z - self.z * v.y,
            y: self.z * v.x - self.x * v.z,
            z: self.x * v.y - self.y * v.x,
        }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    pub fn distance(&self, v: Vec3) -> f64 {
        (*self - v).length()
    }

    /// Unit vector in the same direction. The zero vector yields NaN components.
    pub fn norm(&self) -> Vec3 {
        *self / self.length()
    }

    /// Angle between the two vectors, in degrees.
    pub fn angle(&self, v: Vec3) -> f64 {
        let cos = self.dot(v) / (self.length() * v.length());
        cos.clamp(-1.0, 1.0).acos().to_degrees()
    }

    pub fn multiply_elementwise(&self, v: Vec3) -> Vec3 {
        self.map_pairwise(v, |a, b| a * b)
    }

    /// Component-wise floored division.
    pub fn floor_div(&self, n: f64) -> Vec3 {
        self.map(|v| (v / n).floor())
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Vec3 {
        Vec3::new(f(self.x), f(self.y), f(self.z))
    }

    pub fn map_pairwise(&self, v: Vec3, f: impl Fn(f64, f64) -> f64) -> Vec3 {
        Vec3::new(f(self.x, v.x), f(self.y, v.y), f(self.z, v.z))
    }

    /// Rotates around the axis `v` by `degrees`.
    pub fn rotate(&self, v: Vec3, degrees: f64) -> Vec3 {
        self.rotate_rad(v, degrees.to_radians())
    }

    /// Rodrigues rotation around the axis `v` by `phi` radians.
    pub fn rotate_rad(&self, v: Vec3, phi: f64) -> Vec3 {
        let k = v.norm();
        let (sin, cos) = phi.sin_cos();
        *self * cos + k.cross(*self) * sin + k * k.dot(*self) * (1.0 - cos)
    }

    /// Rounds to `ndigits` decimal places, half to even.
    pub fn round(&self, ndigits: i32) -> Vec3 {
        if ndigits == 0 {
            return self.map(f64::round_ties_even);
        }
        let scale = 10f64.powi(ndigits);
        self.map(|v| (v * scale).round_ties_even() / scale)
    }

    pub fn floor(&self) -> Vec3 {
        self.map(f64::floor)
    }
    pub fn ceil(&self) -> Vec3 {
        self.map(f64::ceil)
    }
    pub fn trunc(&self) -> Vec3 {
        self.map(f64::trunc)
    }

    /// Keeps only the component with the greatest magnitude. Ties prefer x, then y.
    pub fn closest_axis(&self) -> Vec3 {
        let greatest = self.x.abs().max(self.y.abs()).max(self.z.abs());
        if self.x.abs() == greatest {
            Vec3::ZERO.with_x(self.x)
        } else if self.y.abs() == greatest {
            Vec3::ZERO.with_y(self.y)
        } else if self.z.abs() == greatest {
            Vec3::ZERO.with_z(self.z)
        } else {
            Vec3::ZERO
        }
    }

    /// The direction this vector mostly points in. The zero vector is labelled east.
    pub fn direction_label(&self) -> Direction {
        let axis = self.closest_axis();
        if axis.x > 0.0 {
            Direction::East
        } else if axis.x < 0.0 {
            Direction::West
        } else if axis.y > 0.0 {
            Direction::Up
        } else if axis.y < 0.0 {
            Direction::Down
        } else if axis.z > 0.0 {
            Direction::South
        } else if axis.z < 0.0 {
            Direction::North
        } else {
            Direction::East
        }
    }

    pub fn cardinal_label(&self) -> Cardinal {
        match self.with_y(0.0).direction_label() {
            Direction::West => Cardinal::West,
            Direction::South => Cardinal::South,
            Direction::North => Cardinal::North,
            _ => Cardinal::East,
        }
    }

    pub fn east(&self, n: f64) -> Vec3 {
        self.with_x(self.x + n)
    }
    pub fn west(&self, n: f64) -> Vec3 {
        self.with_x(self.x - n)
    }
    pub fn up(&self, n: f64) -> Vec3 {
        self.with_y(self.y + n)
    }
    pub fn down(&self, n: f64) -> Vec3 {
        self.with_y(self.y - n)
    }
    pub fn south(&self, n: f64) -> Vec3 {
        self.with_z(self.z + n)
    }
    pub fn north(&self, n: f64) -> Vec3 {
        self.with_z(self.z - n)
    }
    /// Moves `n` blocks in the given direction.
    pub fn towards(&self, direction: Direction, n: f64) -> Vec3 {
        *self + direction.unit() * n
    }

    pub fn with_x(&self, x: f64) -> Vec3 {
        Vec3 { x, ..*self }
    }
    pub fn with_y(&self, y: f64) -> Vec3 {
        Vec3 { y, ..*self }
    }
    pub fn with_z(&self, z: f64) -> Vec3 {
        Vec3 { z, ..*self }
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Block position containing this point.
    pub fn to_block_pos(&self) -> protocol::Vec3 {
        let floored = self.floor();
        protocol::Vec3 {
            x: floored.x as i32,
            y: floored.y as i32,
            z: floored.z as i32,
        }
    }

    pub fn to_proto_f(&self) -> protocol::Vec3f {
        protocol::Vec3f {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

impl IntoIterator for Vec3 {
    type Item = f64;
    type IntoIter = std::array::IntoIter<f64, 3>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_array().into_iter()
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Vec3 { x, y, z }
    }
}
impl From<(f64, f64, f64)> for Vec3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Vec3 { x, y, z }
    }
}
impl From<(i32, i32, i32)> for Vec3 {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Vec3::new(x as f64, y as f64, z as f64)
    }
}

impl From<Vec3> for cgmath::Vector3<f64> {
    fn from(val: Vec3) -> Self {
        cgmath::Vector3::new(val.x, val.y, val.z)
    }
}
impl From<cgmath::Vector3<f64>> for Vec3 {
    fn from(val: cgmath::Vector3<f64>) -> Self {
        Vec3::new(val.x, val.y, val.z)
    }
}

impl From<&protocol::Vec3> for Vec3 {
    fn from(value: &protocol::Vec3) -> Self {
        Vec3::new(value.x as f64, value.y as f64, value.z as f64)
    }
}
impl From<protocol::Vec3> for Vec3 {
    fn from(value: protocol::Vec3) -> Self {
        (&value).into()
    }
}
impl From<&protocol::Vec3f> for Vec3 {
    fn from(value: &protocol::Vec3f) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}
impl From<protocol::Vec3f> for Vec3 {
    fn from(value: protocol::Vec3f) -> Self {
        (&value).into()
    }
}
impl From<Vec3> for protocol::Vec3 {
    fn from(value: Vec3) -> Self {
        value.to_block_pos()
    }
}
impl From<Vec3> for protocol::Vec3f {
    fn from(value: Vec3) -> Self {
        value.to_proto_f()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        self.map_pairwise(rhs, |a, b| a + b)
    }
}
impl Add<f64> for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: f64) -> Vec3 {
        self.map(|a| a + rhs)
    }
}
impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        self.map_pairwise(rhs, |a, b| a - b)
    }
}
impl Sub<f64> for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: f64) -> Vec3 {
        self.map(|a| a - rhs)
    }
}
/// Element-wise product.
impl Mul for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Vec3 {
        self.multiply_elementwise(rhs)
    }
}
impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        self.map(|a| a * rhs)
    }
}
impl Mul<Vec3> for f64 {
    type Output = Vec3;
    fn mul(self, rhs: Vec3) -> Vec3 {
        rhs * self
    }
}
impl Div<f64> for Vec3 {
    type Output = Vec3;
    fn div(self, rhs: f64) -> Vec3 {
        self.map(|a| a / rhs)
    }
}
impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        self.map(|a| -a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::assert_relative_eq;

    fn assert_close(a: Vec3, b: Vec3) {
        let a: cgmath::Vector3<f64> = a.into();
        let b: cgmath::Vector3<f64> = b.into();
        assert_relative_eq!(a, b, epsilon = 1e-9);
    }

    #[test]
    fn test_arithmetic() {
        let v = Vec3::new(1.0, -2.0, 3.0);
        let w = Vec3::new(-3.0, 0.0, 2.0);
        assert_eq!(v + w, Vec3::new(-2.0, -2.0, 5.0));
        assert_eq!(v - w, Vec3::new(4.0, -2.0, 1.0));
        assert_eq!(v + 1.0, Vec3::new(2.0, -1.0, 4.0));
        assert_eq!(v - 1.0, Vec3::new(0.0, -3.0, 2.0));
        assert_eq!(v * 2.0, 2.0 * v);
        assert_eq!(v * w, Vec3::new(-3.0, 0.0, 6.0));
        assert_eq!(v / 2.0, Vec3::new(0.5, -1.0, 1.5));
        assert_eq!(-v, Vec3::new(-1.0, 2.0, -3.0));
        assert_eq!(v.floor_div(2.0), Vec3::new(0.0, -1.0, 1.0));
        assert_eq!(v.dot(w), 3.0);
        assert_eq!(v.cross(w), Vec3::new(-4.0, -11.0, -6.0));
        assert_eq!(v.cross(w).dot(v), 0.0);
        assert_eq!(v.map_pairwise(w, f64::min), Vec3::new(-3.0, -2.0, 2.0));
    }

    #[test]
    fn test_length_and_norm() {
        let v = Vec3::new(1.0, -2.0, 3.0);
        assert_relative_eq!(v.length(), 14f64.sqrt());
        assert_relative_eq!(v.norm().length(), 1.0);
        assert_relative_eq!(v.distance(v.east(3.0)), 3.0);
        assert_relative_eq!(Vec3::ZERO.east(1.0).angle(Vec3::ZERO.up(1.0)), 90.0);
    }

    #[test]
    fn test_rounding() {
        let v = Vec3::new(1.4, 2.61, 3.8);
        assert_eq!(v.round(0), Vec3::new(1.0, 3.0, 4.0));
        assert_eq!(v.floor(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v.ceil(), Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(Vec3::new(-1.7, 1.7, 0.0).trunc(), Vec3::new(-1.0, 1.0, 0.0));
        assert_ne!(v.round(1), v);
        assert_eq!(v.round(2), v);
        assert_eq!(Vec3::new(0.5, 1.5, 2.5).round(0), Vec3::new(0.0, 2.0, 2.0));
    }

    #[test]
    fn test_rotate() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let k = Vec3::ZERO.up(1.0);
        let w90 = 90f64.to_radians();
        assert_close(v.rotate_rad(k, w90), Vec3::new(3.0, 2.0, -1.0));
        assert_close(v.rotate_rad(k, 2.0 * w90), Vec3::new(-1.0, 2.0, -3.0));
        assert_close(v.rotate_rad(k, 3.0 * w90), Vec3::new(-3.0, 2.0, 1.0));
        assert_close(v.rotate_rad(k, 4.0 * w90), v);
        assert_close(v.rotate_rad(k, w90), v.rotate_rad(-k, 3.0 * w90));
        assert_close(v.rotate(k, 90.0), v.rotate_rad(k, w90));

        let k = Vec3::ZERO.south(1.0);
        assert_close(v.rotate_rad(k, w90), Vec3::new(-2.0, 1.0, 3.0));
        let k = Vec3::ZERO.east(1.0);
        assert_close(v.rotate_rad(k, w90), Vec3::new(1.0, -3.0, 2.0));
    }

    #[test]
    fn test_yaw_pitch() {
        assert_eq!(Vec3::ZERO.yaw_pitch(), (0.0, 0.0));
        assert_close(Vec3::from_yaw_pitch(0.0, 0.0), Vec3::ZERO.south(1.0));
        assert_close(Vec3::from_yaw_pitch(-90.0, 0.0), Vec3::ZERO.east(1.0));
        assert_close(Vec3::from_yaw_pitch(90.0, 0.0), Vec3::ZERO.west(1.0));
        assert_close(Vec3::from_yaw_pitch(0.0, -90.0), Vec3::ZERO.up(1.0));
        for (yaw, pitch) in [(10.0, 20.0), (-135.0, -45.0), (170.0, 80.0)] {
            let (y, p) = Vec3::from_yaw_pitch(yaw, pitch).yaw_pitch();
            assert_relative_eq!(y, yaw, epsilon = 1e-9);
            assert_relative_eq!(p, pitch, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Vec3::new(0.5, -3.0, 1.0).direction_label(), Direction::Down);
        assert_eq!(Vec3::new(0.5, -3.0, 1.0).cardinal_label(), Cardinal::South);
        assert_eq!(Vec3::new(-2.0, 0.0, 2.0).direction_label(), Direction::West);
        assert_eq!(Vec3::ZERO.direction_label(), Direction::East);
        assert_eq!(Vec3::ZERO.up(1.0).cardinal_label(), Cardinal::East);
        assert_eq!(Vec3::new(0.0, 0.0, -4.0).closest_axis(), Vec3::new(0.0, 0.0, -4.0));
    }

    #[test]
    fn test_order() {
        let v1 = Vec3::ZERO;
        let v2 = Vec3::new(1.0, 2.0, 3.0);
        let v3 = Vec3::new(3.0, 2.0, 1.0);
        let mut sorted = vec![v3, v1, v2];
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(sorted, vec![v1, v2, v3]);
        assert!(Vec3::new(1.0, 2.0, 3.0) < Vec3::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn test_wire_conversions() {
        let v = Vec3::new(-0.5, 64.9, 3.0);
        assert_eq!(
            protocol::Vec3::from(v),
            protocol::Vec3 { x: -1, y: 64, z: 3 }
        );
        assert_eq!(Vec3::from(protocol::Vec3f::from(v)), v);
        assert_eq!(v.into_iter().collect::<Vec<_>>(), vec![-0.5, 64.9, 3.0]);
        assert_eq!(v.towards(Direction::North, 2.0), v.north(2.0));
    }
}
