//! # shardctl
//!
//! Shard administration for Elasticsearch-compatible search clusters.
//!
//! Provides commands for:
//! - Listing the shard catalog, optionally for a single node
//! - Counting shards per data node
//! - Reading, enabling and disabling shard routing allocation
//!
//! # Architecture
//!
//! Every command is one request against the cluster's management API. The
//! [`client::ClusterApi`] trait covers the endpoints used; responses are
//! decoded by [`decode`] and rendered by [`output`].
//!
//! ```text
//! ┌───────────┐        HTTP/JSON        ┌──────────────────────┐
//! │  shardctl │◄───────────────────────►│  _cluster/settings   │
//! └───────────┘                         │  _nodes/stats        │
//!                                       │  _cat/shards         │
//!                                       └──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod decode;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format, SortOrder};
pub use client::{ClientConfig, ClusterApi, HttpClusterClient};
pub use decode::AllocationFlag;
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
