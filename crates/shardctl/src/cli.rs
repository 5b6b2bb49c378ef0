//! Command-line argument parsing with clap.

use std::fmt;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::client::ClientConfig;
use crate::error::CliResult;

/// Long help for `list shards count`.
const SHARD_COUNT_ABOUT: &str = "\
List shard count for each data node.

A good rule-of-thumb is to keep the number of shards per node below 20 per GB
of heap it has configured. A node with a 30GB heap should therefore have a
maximum of 600 shards, and the further below this limit you can keep it the
better. This will generally help the cluster stay in good health.";

/// shardctl - shard listing and allocation control for search clusters.
#[derive(Parser, Debug, Clone)]
#[command(name = "shardctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Cluster URL to send requests to.
    #[arg(short, long, env = "SHARDCTL_URL", default_value = "http://localhost:9200")]
    pub url: String,

    /// Username for HTTP basic authentication.
    #[arg(long, env = "SHARDCTL_USERNAME")]
    pub username: Option<String>,

    /// Password for HTTP basic authentication.
    #[arg(long, env = "SHARDCTL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in seconds.
    #[arg(
        long,
        env = "SHARDCTL_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Connection settings collected from the global flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster URL is not a usable http(s) URL.
    pub fn client_config(&self) -> CliResult<ClientConfig> {
        let mut config = ClientConfig::new(&self.url)?.with_timeout(Duration::from_secs(self.timeout));
        if let Some(username) = &self.username {
            config = config.with_basic_auth(username, self.password.clone());
        }
        Ok(config)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List cluster resources.
    List {
        /// List subcommand to execute.
        #[command(subcommand)]
        command: ListCommands,
    },

    /// Get cluster settings.
    Get {
        /// Get subcommand to execute.
        #[command(subcommand)]
        command: GetCommands,
    },

    /// Disable a cluster feature.
    Disable {
        /// Disable subcommand to execute.
        #[command(subcommand)]
        command: ToggleCommands,
    },

    /// Enable a cluster feature.
    Enable {
        /// Enable subcommand to execute.
        #[command(subcommand)]
        command: ToggleCommands,
    },
}

/// `list` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ListCommands {
    /// Show information about one or more shards.
    #[command(alias = "shard")]
    Shards(ListShardsArgs),
}

/// Arguments for `list shards`.
#[derive(Args, Debug, Clone)]
pub struct ListShardsArgs {
    /// Sort shards by store size.
    #[arg(short, long, value_enum, default_value_t = SortOrder::Desc)]
    pub sort: SortOrder,

    /// Only show shards on nodes whose name contains this text.
    #[arg(long)]
    pub node: Option<String>,

    /// Nested subcommand.
    #[command(subcommand)]
    pub command: Option<ListShardsCommands>,
}

/// `list shards` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ListShardsCommands {
    /// List shard count for each data node.
    #[command(long_about = SHARD_COUNT_ABOUT)]
    Count,
}

/// `get` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum GetCommands {
    /// Show shard settings.
    #[command(alias = "shard")]
    Shards {
        /// Shard subcommand to execute.
        #[command(subcommand)]
        command: GetShardsCommands,
    },
}

/// `get shards` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum GetShardsCommands {
    /// Get shard routing allocation.
    #[command(alias = "alloc")]
    Allocations,
}

/// `enable` / `disable` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ToggleCommands {
    /// Shard settings.
    #[command(alias = "shard")]
    Shards {
        /// Shard subcommand to execute.
        #[command(subcommand)]
        command: ToggleShardsCommands,
    },
}

/// `enable shards` / `disable shards` subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ToggleShardsCommands {
    /// Shard routing allocations.
    #[command(alias = "alloc")]
    Allocations,
}

/// Sort direction for the shard listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum SortOrder {
    /// Smallest shards first.
    Asc,
    /// Largest shards first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Wire name used in cat sort keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
