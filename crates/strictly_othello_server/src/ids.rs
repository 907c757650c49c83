//! Opaque numeric identifiers for rooms and users.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a game room.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct RoomId(u64);

impl RoomId {
    /// Wraps a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl FromStr for RoomId {
    type Err = SessionError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| SessionError::validation(format!("malformed room id '{}'", s)))
    }
}

/// Identifier of a user.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wraps a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl FromStr for UserId {
    type Err = SessionError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| SessionError::validation(format!("malformed user id '{}'", s)))
    }
}
