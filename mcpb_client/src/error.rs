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

use mcpb_core::{protocol::EventType, StatusError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error("RPC failed: {0}")]
    Rpc(#[from] tonic::Status),
    #[error("Connection failed: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} is not applicable to players")]
    NotApplicable(&'static str),
    #[error("Can't poll {0:?} while a callback is registered for it")]
    EventCallbackRegistered(EventType),
    #[error("World belongs to a different connection")]
    ForeignWorld,
    #[error("World handle for `{0}` was replaced by a refresh; look it up again")]
    StaleWorld(String),
    #[error("Unexpected response from the plugin: {0}")]
    Protocol(String),
}

impl Error {
    /// The plugin status carried by this error, if any.
    pub fn status(&self) -> Option<&StatusError> {
        match self {
            Error::Status(status) => Some(status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
