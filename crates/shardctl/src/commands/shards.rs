//! Shard listing command implementation.
//!
//! Provides:
//! - `list shards`: the shard catalog sorted by store size, optionally
//!   restricted to one node
//! - `list shards count`: shard totals for data nodes

use std::io::Write;

use tracing::debug;

use crate::cli::{ListShardsArgs, ListShardsCommands, SortOrder};
use crate::client::{CatShardsOptions, ClusterApi};
use crate::decode::{NODE_STATS_METRIC, SHARD_COUNT_FILTER, decode_node_stats};
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ShardCountTable, filter_json_rows, write_matching_lines};

/// Shard command executor.
pub struct ShardsCommand<C> {
    client: C,
}

impl<C: ClusterApi> ShardsCommand<C> {
    /// Create a new shard command.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Execute `list shards` or one of its subcommands.
    ///
    /// # Errors
    ///
    /// Returns an error if the request, decoding, or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &ListShardsArgs,
    ) -> CliResult<()> {
        match args.command {
            Some(ListShardsCommands::Count) => self.count(writer, format).await,
            None => self.list(writer, format, args.sort, args.node.as_deref()).await,
        }
    }

    /// Print the shard catalog.
    ///
    /// With a node filter, the text catalog is streamed and only the header
    /// plus lines containing the filter are printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or output fails.
    pub async fn list<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        order: SortOrder,
        node: Option<&str>,
    ) -> CliResult<()> {
        let options = CatShardsOptions::listing(order);

        if format.is_json() {
            let body = self.client.cat_shards(&options.format("json")).await?;
            return match node {
                Some(node) => {
                    let rows = filter_json_rows(&body, node)?;
                    serde_json::to_writer_pretty(&mut *writer, &rows)
                        .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                    writeln!(writer)?;
                    Ok(())
                }
                None => format.write_raw(writer, &body),
            };
        }

        match node {
            Some(node) => {
                let reader = self.client.cat_shards_lines(&options).await?;
                let matched = write_matching_lines(reader, node, writer).await?;
                debug!(node, matched, "Filtered shard catalog");
                Ok(())
            }
            None => {
                let body = self.client.cat_shards(&options).await?;
                format.write_raw(writer, &body)
            }
        }
    }

    /// Print shard counts of data nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request, decoding, or output fails.
    pub async fn count<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> CliResult<()> {
        let body = self
            .client
            .node_stats(NODE_STATS_METRIC, SHARD_COUNT_FILTER)
            .await?;
        let snapshot = decode_node_stats(&body)?;
        let table = ShardCountTable::from(&snapshot);
        debug!(nodes = snapshot.nodes().count(), rows = table.rows.len(), "Counted shards");
        format.write(writer, &table)
    }
}
