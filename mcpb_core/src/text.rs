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

//! Formatting codes for chat messages, signs and item names.
//!
//! ```
//! use mcpb_core::text;
//! let msg = format!("{}{}Hello!{}", text::RED, text::BOLD, text::RESET);
//! assert_eq!(text::strip_codes(&msg), "Hello!");
//! ```

pub const BLACK: &str = "§0";
pub const DARK_BLUE: &str = "§1";
pub const DARK_GREEN: &str = "§2";
pub const DARK_AQUA: &str = "§3";
pub const DARK_RED: &str = "§4";
pub const DARK_PURPLE: &str = "§5";
pub const GOLD: &str = "§6";
pub const GRAY: &str = "§7";
pub const DARK_GRAY: &str = "§8";
pub const BLUE: &str = "§9";
pub const GREEN: &str = "§a";
pub const AQUA: &str = "§b";
pub const RED: &str = "§c";
pub const PURPLE: &str = "§d";
pub const YELLOW: &str = "§e";
pub const WHITE: &str = "§f";
pub const MINECOIN_GOLD: &str = "§g";

pub const UNDERLINED: &str = "§u";
pub const BOLD: &str = "§l";
pub const ITALIC: &str = "§o";
pub const STRIKETHROUGH: &str = "§m";
pub const ILLEGIBLE: &str = "§k";
pub const RESET: &str = "§r";

/// Removes every `§x` code, e.g. to compare chat messages against plain text.
pub fn strip_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            result.push(c);
        }
    }
    result
}
