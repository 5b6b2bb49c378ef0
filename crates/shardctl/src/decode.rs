//! Typed views of cluster API responses and request bodies.
//!
//! Responses are decoded fresh per call and never cached. The cluster
//! answers `{}` when a `filter_path` matches nothing, which decodes to an
//! empty snapshot; a body that is not valid JSON, including an empty one, is
//! a [`CliError::Decode`](crate::CliError::Decode).

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CliResult;

/// `filter_path` selecting the allocation flag in every settings scope.
pub const ALLOCATION_ENABLE_FILTER: &str = "**.cluster.routing.allocation.enable";

/// Full dotted name of the allocation setting.
pub const ALLOCATION_ENABLE_SETTING: &str = "cluster.routing.allocation.enable";

/// Node stats metric holding shard counts.
pub const NODE_STATS_METRIC: &str = "indices";

/// `filter_path` restricting node stats to names and shard totals.
pub const SHARD_COUNT_FILTER: &str = "nodes.**.name,nodes.**.indices.shard_stats.total_count";

/// Name fragment identifying data nodes.
pub const DATA_NODE_MARKER: &str = "data";

/// Value of `cluster.routing.allocation.enable` written by the toggler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationFlag {
    /// No shard allocation.
    None,
    /// Allocation for all shards.
    All,
}

impl AllocationFlag {
    /// Setting value on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
        }
    }

    /// Build the cluster settings document that sets this flag transiently:
    /// `{"transient":{"cluster":{"routing":{"allocation":{"enable":"<flag>"}}}}}`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn transient_settings_body(self) -> CliResult<Vec<u8>> {
        let document = BTreeMap::from([(
            "transient".to_string(),
            ScopeSettings::with_allocation_enable(self.as_str()),
        )]);
        Ok(serde_json::to_vec(&document)?)
    }
}

impl fmt::Display for AllocationFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings of one scope (`transient`, `persistent`, `defaults`), reduced to
/// the allocation subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cluster: Option<ClusterSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ClusterSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    routing: Option<RoutingSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct RoutingSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    allocation: Option<AllocationSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct AllocationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enable: Option<String>,
}

impl ScopeSettings {
    /// Scope with only `cluster.routing.allocation.enable` set.
    #[must_use]
    pub fn with_allocation_enable(value: impl Into<String>) -> Self {
        Self {
            cluster: Some(ClusterSection {
                routing: Some(RoutingSection {
                    allocation: Some(AllocationSection {
                        enable: Some(value.into()),
                    }),
                }),
            }),
        }
    }

    /// `cluster.routing.allocation.enable`, if present and non-empty.
    #[must_use]
    pub fn allocation_enable(&self) -> Option<&str> {
        self.cluster
            .as_ref()?
            .routing
            .as_ref()?
            .allocation
            .as_ref()?
            .enable
            .as_deref()
            .filter(|value| !value.is_empty())
    }
}

/// Cluster settings keyed by scope name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterSettingsSnapshot {
    scopes: BTreeMap<String, ScopeSettings>,
}

impl ClusterSettingsSnapshot {
    /// Scopes that carry a non-empty allocation flag, in scope name order.
    pub fn allocation_enable(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scopes
            .iter()
            .filter_map(|(scope, settings)| Some((scope.as_str(), settings.allocation_enable()?)))
    }

    /// Number of scopes in the response, including ones without the flag.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether the response held no scopes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl FromIterator<(String, ScopeSettings)> for ClusterSettingsSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, ScopeSettings)>>(iter: I) -> Self {
        Self {
            scopes: iter.into_iter().collect(),
        }
    }
}

/// Per-node statistics reduced to name and shard count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawNodeStats")]
pub struct NodeStats {
    /// Node name.
    pub name: String,
    /// Total shards held by the node.
    pub shard_count: u64,
}

impl NodeStats {
    /// Whether the name marks this as a data node.
    ///
    /// This is a naming heuristic, not a role check.
    #[must_use]
    pub fn is_data_node(&self) -> bool {
        self.name.contains(DATA_NODE_MARKER)
    }
}

#[derive(Deserialize)]
struct RawNodeStats {
    #[serde(default)]
    name: String,
    #[serde(default)]
    indices: RawIndices,
}

#[derive(Default, Deserialize)]
struct RawIndices {
    #[serde(default)]
    shard_stats: RawShardStats,
}

#[derive(Default, Deserialize)]
struct RawShardStats {
    #[serde(default)]
    total_count: u64,
}

impl From<RawNodeStats> for NodeStats {
    fn from(raw: RawNodeStats) -> Self {
        Self {
            name: raw.name,
            shard_count: raw.indices.shard_stats.total_count,
        }
    }
}

/// Node statistics keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatsSnapshot {
    #[serde(default)]
    nodes: BTreeMap<String, NodeStats>,
}

impl NodeStatsSnapshot {
    /// All nodes, in node id order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeStats)> {
        self.nodes.iter().map(|(id, stats)| (id.as_str(), stats))
    }

    /// Nodes whose name contains `data`, ordered by name.
    #[must_use]
    pub fn data_nodes(&self) -> Vec<&NodeStats> {
        let mut nodes: Vec<_> = self.nodes.values().filter(|n| n.is_data_node()).collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        nodes
    }
}

impl FromIterator<(String, NodeStats)> for NodeStatsSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, NodeStats)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Decode a `_cluster/settings` response.
///
/// # Errors
///
/// Returns a decode error if the body is not valid JSON of the expected shape.
pub fn decode_cluster_settings(body: &[u8]) -> CliResult<ClusterSettingsSnapshot> {
    decode(body)
}

/// Decode a `_nodes/stats` response.
///
/// # Errors
///
/// Returns a decode error if the body is not valid JSON of the expected shape.
pub fn decode_node_stats(body: &[u8]) -> CliResult<NodeStatsSnapshot> {
    decode(body)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> CliResult<T> {
    Ok(serde_json::from_slice(body)?)
}
