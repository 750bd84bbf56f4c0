//! permtree - permission administration tool

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use permtree::db::Database;
use permtree::init::{self, SeedFile};
use permtree::permissions::validate_permission_path;
use permtree::{Config, OwnerKind, PermissionRegistry, ProviderKey, SqliteStore};

/// Hierarchical permission store and checker
#[derive(Parser, Debug)]
#[command(name = "permtree", version, about = "Grant, check and list permissions")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the configured one)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new permission database
    Init {
        /// Seed grants to store (TOML, [[grant]] tables)
        #[arg(long)]
        seed: Option<PathBuf>,
    },
    /// Grant (or with --deny, deny) a permission path
    Grant {
        /// player or group
        kind: OwnerKind,
        /// Player UUID or group name
        owner: String,
        /// Dotted permission path, e.g. canary.command.help
        path: String,
        /// World scope; omit for global
        #[arg(long)]
        world: Option<String>,
        /// Store the path as denied
        #[arg(long)]
        deny: bool,
    },
    /// Check whether a permission path is granted
    Check {
        /// player or group
        kind: OwnerKind,
        /// Player UUID or group name
        owner: String,
        /// Dotted permission path
        path: String,
        /// World scope; omit for global
        #[arg(long)]
        world: Option<String>,
        /// Groups to fall back to, nearest first (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,
    },
    /// List stored permissions
    List {
        /// player or group
        kind: OwnerKind,
        /// Player UUID or group name
        owner: String,
        /// World scope; omit for global
        #[arg(long)]
        world: Option<String>,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter.as_str().into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

/// Configured database file; every command needs one
fn database_path(config: &Config) -> Result<&Path> {
    config
        .database
        .as_deref()
        .ok_or_else(|| anyhow!("no database: pass --database or set it in the configuration"))
}

/// Registry over the existing configured database
async fn open_registry(config: &Config) -> Result<PermissionRegistry> {
    let db = Database::open(database_path(config)?).await?;
    let store = Arc::new(SqliteStore::new(db.pool().clone()));
    Ok(PermissionRegistry::new(store, config.cache))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(database) = args.database {
        config.database = Some(database);
    }

    init_tracing(&config);

    match args.command {
        Command::Init { seed } => {
            let path = database_path(&config)?;
            let seed = match seed {
                Some(seed_path) => SeedFile::load(&seed_path)?,
                None => SeedFile::default(),
            };
            let count = init::init_database(path, &seed).await?;
            println!("Created {} with {} seed grants", path.display(), count);
        }
        Command::Grant {
            kind,
            owner,
            path,
            world,
            deny,
        } => {
            validate_permission_path(&path)?;
            let key = ProviderKey::new(kind, &owner, world.as_deref())?;
            let registry = open_registry(&config).await?;
            let id = registry.add_permission(&key, &path, !deny).await?;
            println!("{} {} = {} (id {})", key, path, !deny, id);
        }
        Command::Check {
            kind,
            owner,
            path,
            world,
            groups,
        } => {
            let key = ProviderKey::new(kind, &owner, world.as_deref())?;
            let registry = open_registry(&config).await?;
            let granted = match kind {
                OwnerKind::Player => {
                    let player = Uuid::parse_str(&owner)?;
                    registry
                        .check_player(player, world.as_deref(), &groups, &path)
                        .await?
                }
                OwnerKind::Group => {
                    registry
                        .check_group(&owner, world.as_deref(), &groups, &path)
                        .await?
                }
            };
            println!("{} {}: {}", key, path, granted);
        }
        Command::List {
            kind,
            owner,
            world,
            json,
        } => {
            let key = ProviderKey::new(kind, &owner, world.as_deref())?;
            let registry = open_registry(&config).await?;
            let rows = registry.stored_permissions(&key).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("{}: no permissions", key);
            } else {
                for row in rows {
                    println!("{}: {}", row.path, row.value);
                }
            }
        }
    }

    Ok(())
}
