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

//! Errors reported by the plugin through the `Status` message.

use thiserror::Error;

use crate::protocol::{Status, StatusCode};

fn suffix(extra: &Option<String>) -> String {
    match extra {
        Some(extra) => format!(": '{extra}'"),
        None => String::new(),
    }
}

/// One variant per non-OK status code. `extra` is the detail the plugin attached, usually the
/// offending argument or name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("Unknown plugin error{}", suffix(.extra))]
    Unknown { extra: Option<String> },
    #[error("Missing argument{}", suffix(.extra))]
    MissingArgument { extra: Option<String> },
    #[error("Invalid argument{}", suffix(.extra))]
    InvalidArgument { extra: Option<String> },
    #[error("Not implemented by the plugin{}", suffix(.extra))]
    NotImplemented { extra: Option<String> },
    #[error("World not found{}", suffix(.extra))]
    WorldNotFound { extra: Option<String> },
    #[error("Player not found (maybe offline?){}", suffix(.extra))]
    PlayerNotFound { extra: Option<String> },
    #[error("Unknown block type{}", suffix(.extra))]
    BlockTypeNotFound { extra: Option<String> },
    #[error("Unknown entity type{}", suffix(.extra))]
    EntityTypeNotFound { extra: Option<String> },
    #[error("Entity type is not spawnable{}", suffix(.extra))]
    EntityNotSpawnable { extra: Option<String> },
    #[error("Entity not found{}", suffix(.extra))]
    EntityNotFound { extra: Option<String> },
    #[error("Status code {code} is not supported by this client{}", suffix(.extra))]
    UnsupportedCode { code: i32, extra: Option<String> },
}

impl StatusError {
    /// Maps a status to its error. Returns None for OK.
    pub fn from_status(status: &Status) -> Option<StatusError> {
        let extra = if status.extra.is_empty() {
            None
        } else {
            Some(status.extra.clone())
        };
        let code = match StatusCode::try_from(status.code) {
            Ok(code) => code,
            Err(_) => {
                return Some(StatusError::UnsupportedCode {
                    code: status.code,
                    extra,
                })
            }
        };
        Some(match code {
            StatusCode::Ok => return None,
            StatusCode::ErrorUnknown => StatusError::Unknown { extra },
            StatusCode::MissingArgument => StatusError::MissingArgument { extra },
            StatusCode::InvalidArgument => StatusError::InvalidArgument { extra },
            StatusCode::NotImplemented => StatusError::NotImplemented { extra },
            StatusCode::WorldNotFound => StatusError::WorldNotFound { extra },
            StatusCode::PlayerNotFound => StatusError::PlayerNotFound { extra },
            StatusCode::BlockTypeNotFound => StatusError::BlockTypeNotFound { extra },
            StatusCode::EntityTypeNotFound => StatusError::EntityTypeNotFound { extra },
            StatusCode::EntityNotSpawnable => StatusError::EntityNotSpawnable { extra },
            StatusCode::EntityNotFound => StatusError::EntityNotFound { extra },
        })
    }

    pub fn code(&self) -> i32 {
        match self {
            StatusError::Unknown { .. } => StatusCode::ErrorUnknown as i32,
            StatusError::MissingArgument { .. } => StatusCode::MissingArgument as i32,
            StatusError::InvalidArgument { .. } => StatusCode::InvalidArgument as i32,
            StatusError::NotImplemented { .. } => StatusCode::NotImplemented as i32,
            StatusError::WorldNotFound { .. } => StatusCode::WorldNotFound as i32,
            StatusError::PlayerNotFound { .. } => StatusCode::PlayerNotFound as i32,
            StatusError::BlockTypeNotFound { .. } => StatusCode::BlockTypeNotFound as i32,
            StatusError::EntityTypeNotFound { .. } => StatusCode::EntityTypeNotFound as i32,
            StatusError::EntityNotSpawnable { .. } => StatusCode::EntityNotSpawnable as i32,
            StatusError::EntityNotFound { .. } => StatusCode::EntityNotFound as i32,
            StatusError::UnsupportedCode { code, .. } => *code,
        }
    }

    pub fn extra(&self) -> Option<&str> {
        match self {
            StatusError::Unknown { extra }
            | StatusError::MissingArgument { extra }
            | StatusError::InvalidArgument { extra }
            | StatusError::NotImplemented { extra }
            | StatusError::WorldNotFound { extra }
            | StatusError::PlayerNotFound { extra }
            | StatusError::BlockTypeNotFound { extra }
            | StatusError::EntityTypeNotFound { extra }
            | StatusError::EntityNotSpawnable { extra }
            | StatusError::EntityNotFound { extra }
            | StatusError::UnsupportedCode { extra, .. } => extra.as_deref(),
        }
    }
}

/// Ok for a missing status as well, since proto3 omits a default-valued message field.
pub fn check_status(status: Option<&Status>) -> Result<(), StatusError> {
    match status.and_then(StatusError::from_status) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: i32, extra: &str) -> Status {
        Status {
            code,
            extra: extra.to_string(),
        }
    }

    #[test]
    fn test_ok_is_not_an_error() {
        assert_eq!(StatusError::from_status(&status(0, "")), None);
        assert_eq!(check_status(Some(&status(0, "ignored"))), Ok(()));
        assert_eq!(check_status(None), Ok(()));
    }

    #[test]
    fn test_every_code_roundtrips() {
        for code in 1..=10 {
            let err = StatusError::from_status(&status(code, "")).unwrap();
            assert_eq!(err.code(), code);
            assert!(!matches!(err, StatusError::UnsupportedCode { .. }));
            assert_eq!(err.extra(), None);
        }
    }

    #[test]
    fn test_extra_is_kept() {
        let err = check_status(Some(&status(6, "Steve"))).unwrap_err();
        assert_eq!(
            err,
            StatusError::PlayerNotFound {
                extra: Some("Steve".to_string())
            }
        );
        assert_eq!(err.extra(), Some("Steve"));
        assert!(err.to_string().contains("'Steve'"));
        assert_eq!(
            StatusError::from_status(&status(5, "")).unwrap().to_string(),
            "World not found"
        );
    }

    #[test]
    fn test_unsupported_code() {
        let err = StatusError::from_status(&status(42, "x")).unwrap();
        assert_eq!(
            err,
            StatusError::UnsupportedCode {
                code: 42,
                extra: Some("x".to_string())
            }
        );
        assert_eq!(err.code(), 42);
    }
}
