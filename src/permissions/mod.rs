//! Permission resolution
//!
//! Dotted permission paths (`canary.command.super.groupmod.add`) are stored
//! in per-owner trees and resolved with wildcard support:
//! - A `*` segment is the default for any child not listed explicitly
//! - The most specific entry wins; a wildcard only fills gaps
//! - Unresolvable paths deny; blank paths always grant
//!
//! Providers are scoped to a player or group, globally or per world. A
//! world-scoped provider defers to the owner's global provider for paths it
//! has no entry for.

mod cache;
mod key;
mod node;
mod path;
mod provider;
mod registry;
pub mod resolver;
mod subject;

pub use cache::{
    CacheConfig, InvalidCacheConfig, PermissionCache, DEFAULT_PRUNE_TO, DEFAULT_SOFT_CAP,
};
pub use key::{InvalidOwner, OwnerKind, ProviderKey};
pub use node::{PermissionNode, ASTERISK};
pub use path::{split_segments, validate_permission_path, PathSyntaxError, MAX_PATH_LEN};
pub use provider::{PermissionProvider, ProviderLookup};
pub use registry::PermissionRegistry;
