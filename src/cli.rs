//! CLI
//!
//! Command tree for the `blockrent` binary. Each command opens the repo home,
//! runs one repo operation on a tokio runtime and renders a text result.

use crate::addressing::content_id;
use crate::config::{resolve_home, ConfigLoader, RepoPaths};
use crate::logging::init_logging;
use crate::model::StorageOptions;
use crate::provider::server;
use crate::repo::{display_name, Identity, Repo};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Blockrent - replicated block storage across peer providers
#[derive(Parser)]
#[command(name = "blockrent")]
#[command(about = "Store files as content-addressed blocks on contracted peer providers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repo home directory (default: $BLOCKRENT_HOME or ~/.blockrent)
    #[arg(long)]
    pub home: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new repo home
    Init {
        /// User identifier (derived when omitted)
        #[arg(long)]
        user_id: Option<String>,
        /// Node identifier (derived when omitted)
        #[arg(long)]
        node_id: Option<String>,
    },
    /// Store a file on providers
    Put {
        file: PathBuf,
        /// Display name in the listing (default: file name)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        block_size: Option<usize>,
        /// Providers per block
        #[arg(long)]
        redundancy: Option<usize>,
    },
    /// Retrieve a stored file
    Get {
        name: String,
        /// Destination path (default: the name in the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored files
    List,
    /// Replicate the root listing to providers
    Sync,
    /// Show repo summary
    Info,
    /// Serve this node's block store to peers
    Serve {
        /// Bind address (default: provider_address from config)
        #[arg(long)]
        addr: Option<String>,
    },
}

pub struct CliContext {
    home: PathBuf,
    runtime: tokio::runtime::Runtime,
}

impl CliContext {
    pub fn new(home: Option<PathBuf>) -> Result<Self> {
        let home = resolve_home(home)?;
        let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
        Ok(Self { home, runtime })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Install the logger from the repo's config, or defaults without a repo.
    pub fn init_logging(&self) -> Result<()> {
        let paths = RepoPaths::new(&self.home);
        let config = if paths.config_file.exists() {
            Some(ConfigLoader::load(&self.home)?.logging)
        } else {
            None
        };
        init_logging(config.as_ref(), Some(&self.home))?;
        Ok(())
    }

    pub fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Init { user_id, node_id } => self.init(user_id.clone(), node_id.clone()),
            Commands::Put {
                file,
                name,
                block_size,
                redundancy,
            } => {
                let mut repo = self.open()?;
                let mut options = repo.config().default_storage_options(&display_name(file));
                if let Some(name) = name {
                    options.file_name = name.clone();
                }
                if let Some(block_size) = block_size {
                    options.policy.block_size = *block_size;
                }
                if let Some(redundancy) = redundancy {
                    options.policy.redundancy = *redundancy;
                }
                self.put(&mut repo, file, options)
            }
            Commands::Get { name, out } => {
                let repo = self.open()?;
                let dest = out.clone().unwrap_or_else(|| PathBuf::from(name));
                let written = self
                    .runtime
                    .block_on(repo.get_to_path(name, &dest))
                    .with_context(|| format!("Failed to retrieve {}", name))?;
                Ok(format!("Wrote {} bytes to {}", written, dest.display()))
            }
            Commands::List => {
                let repo = self.open()?;
                Ok(format_listing(&repo))
            }
            Commands::Sync => {
                let mut repo = self.open()?;
                let report = self
                    .runtime
                    .block_on(repo.sync())
                    .context("Failed to sync root listing")?;
                Ok(format!(
                    "Root listing pushed to {} of {} providers",
                    report.updated, report.total
                ))
            }
            Commands::Info => {
                let repo = self.open()?;
                format_info(&repo)
            }
            Commands::Serve { addr } => {
                let repo = self.open()?;
                let addr = addr
                    .clone()
                    .unwrap_or_else(|| repo.config().provider_address.clone());
                let provider = Arc::new(repo.local_provider()?);
                self.runtime
                    .block_on(server::serve(&addr, provider))
                    .with_context(|| format!("Provider server on {} failed", addr))?;
                Ok(String::new())
            }
        }
    }

    fn open(&self) -> Result<Repo> {
        Repo::open(&self.home)
            .with_context(|| format!("Cannot open repo at {}", self.home.display()))
    }

    fn init(&self, user_id: Option<String>, node_id: Option<String>) -> Result<String> {
        let identity = Identity {
            user_id: user_id.unwrap_or_else(|| derive_id("user")),
            node_id: node_id.unwrap_or_else(|| derive_id("node")),
        };
        let repo = Repo::init(&self.home, identity)
            .with_context(|| format!("Cannot initialise repo at {}", self.home.display()))?;
        Ok(format!(
            "Initialised repo at {}\n  user: {}\n  node: {}",
            repo.paths().home.display(),
            repo.config().user_id,
            repo.config().node_id
        ))
    }

    fn put(&self, repo: &mut Repo, file: &Path, options: StorageOptions) -> Result<String> {
        let inode = self
            .runtime
            .block_on(repo.put(file, Some(options)))
            .with_context(|| format!("Failed to store {}", file.display()))?;
        Ok(format!(
            "Stored {} as {} ({} bytes in {} blocks)",
            file.display(),
            inode.name,
            inode.size,
            inode.blocks.len()
        ))
    }
}

/// Placeholder identifier until key-based identities exist.
fn derive_id(kind: &str) -> String {
    let seed = format!(
        "{}:{}:{}",
        kind,
        chrono::Utc::now().to_rfc3339(),
        std::process::id()
    );
    content_id(seed.as_bytes())
}

fn format_listing(repo: &Repo) -> String {
    if repo.root().files.is_empty() {
        return "No files stored".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Id"]);
    for entry in &repo.root().files {
        table.add_row(vec![entry.name.clone(), entry.id.clone()]);
    }
    table.to_string()
}

fn format_info(repo: &Repo) -> Result<String> {
    let info = repo.info()?;
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Field", "Value"]);
    let rows = [
        ("Home", info.home.display().to_string()),
        ("User", info.user_id),
        ("Node", info.node_id),
        ("Root listing", info.root_id),
        ("Files", info.files.to_string()),
        ("Known providers", info.providers.to_string()),
        ("Root contracts", info.root_contracts.to_string()),
        ("Block size", info.block_size.to_string()),
        ("Redundancy", info.redundancy.to_string()),
        ("Provider address", info.provider_address),
    ];
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value]);
    }
    Ok(table.to_string())
}
