//! permtree - hierarchical permission resolution
//!
//! Per-player and per-group permission trees with `*` wildcards, world
//! scopes that fall back to global scope, and a small result cache per
//! provider, persisted in SQLite.

pub mod config;
pub mod db;
pub mod init;
pub mod permissions;
pub mod store;

pub use config::{Config, ConfigError};
pub use permissions::{OwnerKind, PermissionProvider, PermissionRegistry, ProviderKey};
pub use store::{MemoryStore, PermissionStore, SqliteStore, StoreError};
