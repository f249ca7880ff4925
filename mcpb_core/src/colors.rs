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

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not a dye color")]
pub struct ParseColorError(pub String);

/// The 16 dye colors. Block ids like `red_wool` or `blue_bed` are built from [Color::as_str].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Orange,
    Magenta,
    LightBlue,
    Yellow,
    Lime,
    Pink,
    Gray,
    LightGray,
    Cyan,
    Purple,
    Blue,
    Brown,
    Green,
    Red,
    Black,
}

impl Color {
    pub const ALL: [Color; 16] = [
        Color::White,
        Color::Orange,
        Color::Magenta,
        Color::LightBlue,
        Color::Yellow,
        Color::Lime,
        Color::Pink,
        Color::Gray,
        Color::LightGray,
        Color::Cyan,
        Color::Purple,
        Color::Blue,
        Color::Brown,
        Color::Green,
        Color::Red,
        Color::Black,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Orange => "orange",
            Color::Magenta => "magenta",
            Color::LightBlue => "light_blue",
            Color::Yellow => "yellow",
            Color::Lime => "lime",
            Color::Pink => "pink",
            Color::Gray => "gray",
            Color::LightGray => "light_gray",
            Color::Cyan => "cyan",
            Color::Purple => "purple",
            Color::Blue => "blue",
            Color::Brown => "brown",
            Color::Green => "green",
            Color::Red => "red",
            Color::Black => "black",
        }
    }

    /// 0xRRGGBB as used by dyed leather and fireworks.
    pub const fn code(&self) -> u32 {
        match self {
            Color::White => 0xF9FFFE,
            Color::Orange => 0xF9801D,
            Color::Magenta => 0xC74EBD,
            Color::LightBlue => 0x3AB3DA,
            Color::Yellow => 0xFED83D,
            Color::Lime => 0x80C71F,
            Color::Pink => 0xF38BAA,
            Color::Gray => 0x474F52,
            Color::LightGray => 0x9D9D97,
            Color::Cyan => 0x169C9C,
            Color::Purple => 0x8932B8,
            Color::Blue => 0x3C44AA,
            Color::Brown => 0x835432,
            Color::Green => 0x5E7C16,
            Color::Red => 0xB02E26,
            Color::Black => 0x1D1D21,
        }
    }

    pub const fn rgb(&self) -> (u8, u8, u8) {
        let code = self.code();
        ((code >> 16) as u8, (code >> 8) as u8, code as u8)
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseColorError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_codes() {
        assert_eq!(Color::Red.rgb(), (0xB0, 0x2E, 0x26));
        assert_eq!("light_gray".parse::<Color>(), Ok(Color::LightGray));
        assert!("Light Gray".parse::<Color>().is_err());
        for color in Color::ALL {
            assert_eq!(color.to_string().parse::<Color>(), Ok(color));
        }
    }
}
