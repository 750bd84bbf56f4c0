//! Integration Test Harness
//!
//! - `PermTest` - A registry over an on-disk SQLite database in a temp dir
//! - `permtree()` - Runs the real `permtree` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use harness::PermTest;
//!
//! #[tokio::test]
//! async fn test_grant_survives_restart() {
//!     let mut perms = PermTest::start().await.unwrap();
//!     let key = ProviderKey::group("mods", None);
//!     perms.registry.add_permission(&key, "canary.kick", true).await.unwrap();
//!
//!     perms.restart().await.unwrap();
//!     assert!(perms.registry.query_permission(&key, "canary.kick").await.unwrap());
//! }
//! ```

mod cli;
mod server;

pub use cli::{permtree, permtree_with_env, CliOutput};
pub use server::PermTest;
