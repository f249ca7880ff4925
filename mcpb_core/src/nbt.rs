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

use std::fmt::Display;

use serde::Serialize;
use serde_json::json;

/// Item enchantments understood by [Nbt::add_enchantment].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Enchantment {
    AquaAffinity,
    BaneOfArthropods,
    BlastProtection,
    Channeling,
    BindingCurse,
    VanishingCurse,
    DepthStrider,
    Efficiency,
    FeatherFalling,
    FireAspect,
    FireProtection,
    Flame,
    Fortune,
    FrostWalker,
    Impaling,
    Infinity,
    Knockback,
    Looting,
    Loyalty,
    LuckOfTheSea,
    Lure,
    Mending,
    Multishot,
    Piercing,
    Power,
    ProjectileProtection,
    Protection,
    Punch,
    QuickCharge,
    Respiration,
    Riptide,
    Sharpness,
    SilkTouch,
    Smite,
    SoulSpeed,
    Sweeping,
    SwiftSneak,
    Thorns,
    Unbreaking,
}

impl Enchantment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Enchantment::AquaAffinity => "aqua_affinity",
            Enchantment::BaneOfArthropods => "bane_of_arthropods",
            Enchantment::BlastProtection => "blast_protection",
            Enchantment::Channeling => "channeling",
            Enchantment::BindingCurse => "binding_curse",
            Enchantment::VanishingCurse => "vanishing_curse",
            Enchantment::DepthStrider => "depth_strider",
            Enchantment::Efficiency => "efficiency",
            Enchantment::FeatherFalling => "feather_falling",
            Enchantment::FireAspect => "fire_aspect",
            Enchantment::FireProtection => "fire_protection",
            Enchantment::Flame => "flame",
            Enchantment::Fortune => "fortune",
            Enchantment::FrostWalker => "frost_walker",
            Enchantment::Impaling => "impaling",
            Enchantment::Infinity => "infinity",
            Enchantment::Knockback => "knockback",
            Enchantment::Looting => "looting",
            Enchantment::Loyalty => "loyalty",
            Enchantment::LuckOfTheSea => "luck_of_the_sea",
            Enchantment::Lure => "lure",
            Enchantment::Mending => "mending",
            Enchantment::Multishot => "multishot",
            Enchantment::Piercing => "piercing",
            Enchantment::Power => "power",
            Enchantment::ProjectileProtection => "projectile_protection",
            Enchantment::Protection => "protection",
            Enchantment::Punch => "punch",
            Enchantment::QuickCharge => "quick_charge",
            Enchantment::Respiration => "respiration",
            Enchantment::Riptide => "riptide",
            Enchantment::Sharpness => "sharpness",
            Enchantment::SilkTouch => "silk_touch",
            Enchantment::Smite => "smite",
            Enchantment::SoulSpeed => "soul_speed",
            Enchantment::Sweeping => "sweeping",
            Enchantment::SwiftSneak => "swift_sneak",
            Enchantment::Thorns => "thorns",
            Enchantment::Unbreaking => "unbreaking",
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
struct EnchantmentTag {
    id: &'static str,
    lvl: u32,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
struct DisplayTag {
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "Lore", skip_serializing_if = "Vec::is_empty")]
    lore: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<u32>,
}

impl DisplayTag {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.lore.is_empty() && self.color.is_none()
    }
}

/// Item tag builder. Renders as the JSON-style tag accepted by `/give` and `/item`.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Nbt {
    #[serde(rename = "Unbreakable", skip_serializing_if = "Option::is_none")]
    unbreakable: Option<u8>,
    #[serde(skip_serializing_if = "DisplayTag::is_empty")]
    display: DisplayTag,
    #[serde(rename = "CanPlaceOn", skip_serializing_if = "Vec::is_empty")]
    can_place_on: Vec<String>,
    #[serde(rename = "CanDestroy", skip_serializing_if = "Vec::is_empty")]
    can_destroy: Vec<String>,
    #[serde(rename = "Enchantments", skip_serializing_if = "Vec::is_empty")]
    enchantments: Vec<EnchantmentTag>,
}

impl Nbt {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Nbt::default()
    }

    pub fn set_unbreakable(&mut self) -> &mut Self {
        self.unbreakable = Some(1);
        self
    }

    /// Sets the display name. Minecraft renders custom names in italics unless told otherwise.
    pub fn set_name(&mut self, text: &str, italic: bool) -> &mut Self {
        self.display.name = Some(json!([{ "text": text, "italic": italic }]).to_string());
        self
    }

    pub fn add_lore(&mut self, text: &str) -> &mut Self {
        self.display.lore.push(json!(text).to_string());
        self
    }

    /// Dye color of leather armor, as 0xRRGGBB.
    pub fn set_color(&mut self, color: u32) -> &mut Self {
        self.display.color = Some(color);
        self
    }

    pub fn add_can_place_on(&mut self, block: &str) -> &mut Self {
        self.can_place_on.push(block.to_string());
        self
    }

    pub fn add_can_destroy(&mut self, block: &str) -> &mut Self {
        self.can_destroy.push(block.to_string());
        self
    }

    pub fn add_enchantment(&mut self, enchantment: Enchantment, level: u32) -> &mut Self {
        self.enchantments.push(EnchantmentTag {
            id: enchantment.as_str(),
            lvl: level,
        });
        self
    }
}

impl Display for Nbt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        f.write_str(&rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_empty() {
        assert_eq!(Nbt::new().to_string(), "{}");
    }

    #[test]
    fn test_builder() {
        let mut nbt = Nbt::new();
        nbt.set_unbreakable()
            .add_enchantment(Enchantment::Sharpness, 5)
            .add_enchantment(Enchantment::Looting, 3)
            .add_can_destroy("stone")
            .set_name("Excalibur", false)
            .add_lore("first")
            .add_lore("second");

        let parsed: Value = serde_json::from_str(&nbt.to_string()).unwrap();
        assert_eq!(parsed["Unbreakable"], json!(1));
        assert_eq!(
            parsed["Enchantments"],
            json!([{"id": "sharpness", "lvl": 5}, {"id": "looting", "lvl": 3}])
        );
        assert_eq!(parsed["CanDestroy"], json!(["stone"]));
        assert_eq!(parsed["display"]["Lore"], json!(["\"first\"", "\"second\""]));
        let name: Value =
            serde_json::from_str(parsed["display"]["Name"].as_str().unwrap()).unwrap();
        assert_eq!(name, json!([{"text": "Excalibur", "italic": false}]));
    }

    #[test]
    fn test_display_color() {
        let mut nbt = Nbt::new();
        nbt.set_color(crate::Color::Red.code());
        assert!(!nbt.is_empty());
        let parsed: Value = serde_json::from_str(&nbt.to_string()).unwrap();
        assert_eq!(parsed["display"]["color"], json!(crate::Color::Red.code()));
        assert!(parsed["display"].get("Lore").is_none());
    }
}
