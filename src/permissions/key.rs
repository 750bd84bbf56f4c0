//! Provider identity: who owns a permission tree and in which world

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The two kinds of permission owners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// A player, identified by UUID
    Player,
    /// A group, identified by name
    Group,
}

impl OwnerKind {
    /// Value stored in the `owner_kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Player => "player",
            OwnerKind::Group => "group",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "player" => Ok(OwnerKind::Player),
            "group" => Ok(OwnerKind::Group),
            other => Err(format!("unknown owner kind '{}' (expected player or group)", other)),
        }
    }
}

/// Owner string that cannot be used for the requested kind
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("player owner must be a UUID, got '{0}'")]
pub struct InvalidOwner(pub String);

/// Identifies one provider: owner plus optional world scope (`None` = global)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderKey {
    kind: OwnerKind,
    owner: String,
    world: Option<String>,
}

impl ProviderKey {
    pub fn player(id: Uuid, world: Option<&str>) -> Self {
        Self {
            kind: OwnerKind::Player,
            owner: id.to_string(),
            world: world.filter(|w| !w.is_empty()).map(str::to_string),
        }
    }

    pub fn group(name: &str, world: Option<&str>) -> Self {
        Self {
            kind: OwnerKind::Group,
            owner: name.to_string(),
            world: world.filter(|w| !w.is_empty()).map(str::to_string),
        }
    }

    /// Build a key from untyped input; player owners must parse as UUIDs
    pub fn new(kind: OwnerKind, owner: &str, world: Option<&str>) -> Result<Self, InvalidOwner> {
        match kind {
            OwnerKind::Player => Uuid::parse_str(owner)
                .map(|id| Self::player(id, world))
                .map_err(|_| InvalidOwner(owner.to_string())),
            OwnerKind::Group => Ok(Self::group(owner, world)),
        }
    }

    pub fn kind(&self) -> OwnerKind {
        self.kind
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn world(&self) -> Option<&str> {
        self.world.as_deref()
    }

    pub fn is_player(&self) -> bool {
        self.kind == OwnerKind::Player
    }

    pub fn is_global(&self) -> bool {
        self.world.is_none()
    }

    /// The same owner at global scope
    pub fn global(&self) -> Self {
        Self {
            kind: self.kind,
            owner: self.owner.clone(),
            world: None,
        }
    }

    /// Parent provider key: the global scope for a world-scoped key, none otherwise
    pub fn parent(&self) -> Option<Self> {
        self.world.as_ref().map(|_| self.global())
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.world {
            Some(world) => write!(f, "{}:{}@{}", self.kind, self.owner, world),
            None => write!(f, "{}:{}", self.kind, self.owner),
        }
    }
}
