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

pub mod mcpb {
    pub mod protocol {
        tonic::include_proto!("mcpb");

        pub const DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("mcpb_descriptor");
    }
}
pub use mcpb::protocol;

pub mod colors;
pub mod constants;
pub mod nbt;
pub mod status;
pub mod text;
pub mod vec3;

pub use colors::Color;
pub use constants::{Cardinal, Direction};
pub use nbt::{Enchantment, Nbt};
pub use status::{check_status, StatusError};
pub use vec3::Vec3;

/// Default port of the server-side plugin.
pub const DEFAULT_PORT: u16 = 1789;
pub const DEFAULT_HOST: &str = "localhost";

#[cfg(test)]
mod tests {
    #[test]
    fn test_descriptor_set_names_service() {
        use prost::Message;
        let set = prost_types::FileDescriptorSet::decode(super::protocol::DESCRIPTOR_SET).unwrap();
        let file = set
            .file
            .iter()
            .find(|f| f.package() == "mcpb")
            .unwrap();
        assert!(file.service.iter().any(|s| s.name() == "Minecraft"));
    }
}
