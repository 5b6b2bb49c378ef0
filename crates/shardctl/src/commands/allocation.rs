//! Shard allocation command implementation.
//!
//! `get shards allocations` reads `cluster.routing.allocation.enable` from
//! every settings scope. `enable`/`disable shards allocations` set the
//! transient value to `all`/`none` and relay the cluster's reply verbatim;
//! the reply is not checked for `"acknowledged": true`.

use std::io::Write;

use tracing::{debug, info};

use crate::client::ClusterApi;
use crate::decode::{ALLOCATION_ENABLE_FILTER, AllocationFlag, decode_cluster_settings};
use crate::error::CliResult;
use crate::output::{AllocationSettings, OutputFormat};

/// What to do with shard allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationAction {
    /// Print the current allocation setting per scope.
    Show,
    /// Set the transient allocation setting.
    Set(AllocationFlag),
}

/// Allocation command executor.
pub struct AllocationCommand<C> {
    client: C,
}

impl<C: ClusterApi> AllocationCommand<C> {
    /// Create a new allocation command.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Execute an allocation action.
    ///
    /// # Errors
    ///
    /// Returns an error if the request, decoding, or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        action: AllocationAction,
    ) -> CliResult<()> {
        match action {
            AllocationAction::Show => self.show(writer, format).await,
            AllocationAction::Set(flag) => self.set(writer, format, flag).await,
        }
    }

    /// Print every scope that has a non-empty allocation setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the request, decoding, or output fails.
    pub async fn show<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> CliResult<()> {
        let body = self.client.cluster_settings(ALLOCATION_ENABLE_FILTER).await?;
        let snapshot = decode_cluster_settings(&body)?;
        debug!(scopes = snapshot.len(), "Decoded cluster settings");
        format.write(writer, &AllocationSettings::from(&snapshot))
    }

    /// Set the transient allocation flag and print the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the cluster answers with a
    /// non-success status. The body of a failed request is part of the error.
    pub async fn set<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        flag: AllocationFlag,
    ) -> CliResult<()> {
        let body = flag.transient_settings_body()?;
        info!(enable = %flag, "Updating transient shard allocation");
        let response = self.client.put_cluster_settings(body).await?;
        format.write_raw(writer, &response)
    }
}
