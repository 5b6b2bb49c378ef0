//! CLI command implementations.
//!
//! Each submodule implements a family of CLI commands:
//! - [`shards`] - Shard catalog listing and per-node shard counts
//! - [`allocation`] - Reading and toggling shard routing allocation

pub mod allocation;
pub mod shards;

pub use allocation::{AllocationAction, AllocationCommand};
pub use shards::ShardsCommand;
