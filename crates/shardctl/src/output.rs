//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats, plus verbatim
//! relay of raw response bodies and substring filtering of text lines.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cli::Format;
use crate::decode::{ALLOCATION_ENABLE_SETTING, ClusterSettingsSnapshot, NodeStatsSnapshot};
use crate::error::{CliError, CliResult};

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> CliResult<()>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a response body exactly as the cluster sent it.
    ///
    /// The body is already in the requested format, so this ignores the
    /// selected output format.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_raw<W: Write>(&self, writer: &mut W, body: &[u8]) -> CliResult<()> {
        writer.write_all(body)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> CliResult<String>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as human-readable text.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> CliResult<()>;
}

/// Allocation flag per settings scope, only scopes where it is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllocationSettings {
    scopes: BTreeMap<String, String>,
}

impl From<&ClusterSettingsSnapshot> for AllocationSettings {
    fn from(snapshot: &ClusterSettingsSnapshot) -> Self {
        Self {
            scopes: snapshot
                .allocation_enable()
                .map(|(scope, value)| (scope.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl TableDisplay for AllocationSettings {
    fn write_table<W: Write>(&self, writer: &mut W) -> CliResult<()> {
        for (scope, value) in &self.scopes {
            writeln!(writer, "{scope}")?;
            writeln!(writer, "{ALLOCATION_ENABLE_SETTING}: {value}")?;
        }
        Ok(())
    }
}

/// One row of the shard count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardCountRow {
    /// Node name.
    pub name: String,
    /// Shards on the node.
    pub shard_count: u64,
}

/// Shard counts of data nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ShardCountTable {
    /// Rows in display order.
    pub rows: Vec<ShardCountRow>,
}

impl From<&NodeStatsSnapshot> for ShardCountTable {
    fn from(snapshot: &NodeStatsSnapshot) -> Self {
        Self {
            rows: snapshot
                .data_nodes()
                .into_iter()
                .map(|node| ShardCountRow {
                    name: node.name.clone(),
                    shard_count: node.shard_count,
                })
                .collect(),
        }
    }
}

impl TableDisplay for ShardCountTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> CliResult<()> {
        const NAME: &str = "name";
        const COUNT: &str = "shard_count";

        let width = self
            .rows
            .iter()
            .map(|row| row.name.chars().count())
            .max()
            .unwrap_or(0)
            .max(NAME.len());

        writeln!(writer, "{NAME:<width$}  {COUNT}")?;
        for row in &self.rows {
            writeln!(writer, "{:<width$}  {}", row.name, row.shard_count)?;
        }
        Ok(())
    }
}

/// Copy lines from `reader` to `writer`, keeping the first (header) line and
/// every later line that contains `needle`. Order is preserved.
///
/// Lines are matched as bytes, so a body that is not valid UTF-8 is passed
/// through unchanged. A trailing `\r` is dropped from each line.
///
/// Returns the number of matching lines after the header.
///
/// # Errors
///
/// Returns an error if reading the stream or writing fails.
pub async fn write_matching_lines<R, W>(reader: R, needle: &str, writer: &mut W) -> CliResult<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.split(b'\n');

    if let Some(header) = lines.next_segment().await? {
        write_line(writer, &header)?;
    }

    let mut matched = 0;
    while let Some(line) = lines.next_segment().await? {
        if contains_bytes(trim_cr(&line), needle.as_bytes()) {
            write_line(writer, &line)?;
            matched += 1;
        }
    }
    Ok(matched)
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn write_line<W: Write>(writer: &mut W, line: &[u8]) -> CliResult<()> {
    writer.write_all(trim_cr(line))?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

/// Keep rows of a JSON cat response whose `node` column contains `needle`.
///
/// # Errors
///
/// Returns a decode error if the body is not a JSON array.
pub fn filter_json_rows(body: &[u8], needle: &str) -> CliResult<Vec<serde_json::Value>> {
    let rows: Vec<serde_json::Value> = serde_json::from_slice(body)?;
    Ok(rows
        .into_iter()
        .filter(|row| {
            row.get("node")
                .and_then(serde_json::Value::as_str)
                .is_some_and(|node| node.contains(needle))
        })
        .collect())
}
