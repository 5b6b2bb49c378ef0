//! HTTP client for the cluster management API.
//!
//! Wraps the three endpoints shardctl talks to:
//!
//! - `/_cluster/settings` (GET with `filter_path`, PUT with a JSON body)
//! - `/_nodes/stats/<metric>` (GET with `filter_path`)
//! - `/_cat/shards` (GET with sort/format/verbosity options)
//!
//! Commands depend on the [`ClusterApi`] trait rather than on
//! [`HttpClusterClient`] directly so they can run against a fake.
//!
//! # Example
//!
//! ```rust,no_run
//! use shardctl::client::{ClientConfig, ClusterApi, HttpClusterClient};
//!
//! # async fn example() -> Result<(), shardctl::CliError> {
//! let config = ClientConfig::new("http://localhost:9200")?;
//! let client = HttpClusterClient::new(config)?;
//! let body = client.cluster_settings("**.cluster.routing.allocation.enable").await?;
//! println!("{}", String::from_utf8_lossy(&body));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use futures::TryStreamExt;
use reqwest::{Client, Method, RequestBuilder, Response};
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;
use tracing::{debug, trace};
use url::Url;

use crate::cli::SortOrder;
use crate::error::{CliError, CliResult};

/// Default request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CLUSTER_SETTINGS_PATH: &str = "_cluster/settings";
const NODE_STATS_PATH: &str = "_nodes/stats";
const CAT_SHARDS_PATH: &str = "_cat/shards";

/// Buffered line source over a streaming response body.
pub type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;

/// Connection settings for the cluster.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl ClientConfig {
    /// Build a config for the cluster at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or is not `http(s)://`.
    pub fn new(url: &str) -> CliResult<Self> {
        let mut base_url = Url::parse(url.trim())
            .map_err(|e| CliError::Config(format!("invalid cluster URL {url}: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(CliError::Config(format!(
                "invalid cluster URL: {url}, must start with http:// or https://"
            )));
        }

        // Endpoints are joined relative to the base, so it has to end in '/'
        // for a path prefix like `https://proxy/search` to survive the join.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            username: None,
            password: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send HTTP basic credentials with every request.
    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Optional parameters of a `_cat/shards` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatShardsOptions {
    sort: Vec<String>,
    pretty: bool,
    human: bool,
    format: Option<String>,
    verbose: bool,
}

impl CatShardsOptions {
    /// Options with every parameter unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used by `list shards`: sorted by store size then index then
    /// shard number, with a header row and human readable sizes.
    #[must_use]
    pub fn listing(order: SortOrder) -> Self {
        Self::new()
            .sort([format!("store:{order}"), "index".into(), "shard".into()])
            .human(true)
            .pretty(true)
            .verbose(true)
    }

    /// Sort keys, sent as `s=<k1>,<k2>,...`.
    #[must_use]
    pub fn sort<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Pretty-print the response.
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Human readable sizes and times.
    #[must_use]
    pub fn human(mut self, human: bool) -> Self {
        self.human = human;
        self
    }

    /// Response format (`text`, `json`, ...).
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Include the column header row.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Render the options as query string pairs. Unset options are omitted.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.sort.is_empty() {
            pairs.push(("s", self.sort.join(",")));
        }
        if self.pretty {
            pairs.push(("pretty", "true".to_string()));
        }
        if self.human {
            pairs.push(("human", "true".to_string()));
        }
        if let Some(format) = &self.format {
            pairs.push(("format", format.clone()));
        }
        if self.verbose {
            pairs.push(("v", "true".to_string()));
        }
        pairs
    }
}

/// The cluster management endpoints shardctl uses.
///
/// Every method is a single request/response round trip. Non-success
/// statuses come back as [`CliError::Status`].
pub trait ClusterApi: Send + Sync {
    /// GET cluster settings filtered by a dotted wildcard path.
    fn cluster_settings(&self, filter_path: &str) -> impl Future<Output = CliResult<Vec<u8>>> + Send;

    /// PUT a cluster settings document and return the response body.
    fn put_cluster_settings(&self, body: Vec<u8>) -> impl Future<Output = CliResult<Vec<u8>>> + Send;

    /// GET node statistics for `metric`, filtered by a comma separated field list.
    fn node_stats(
        &self,
        metric: &str,
        filter_path: &str,
    ) -> impl Future<Output = CliResult<Vec<u8>>> + Send;

    /// GET the shard catalog, reading the whole body.
    fn cat_shards(
        &self,
        options: &CatShardsOptions,
    ) -> impl Future<Output = CliResult<Vec<u8>>> + Send;

    /// GET the shard catalog as a line stream.
    fn cat_shards_lines(
        &self,
        options: &CatShardsOptions,
    ) -> impl Future<Output = CliResult<LineReader>> + Send;
}

/// [`ClusterApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClusterClient {
    http: Client,
    config: ClientConfig,
}

impl HttpClusterClient {
    /// Create a client for the configured cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> CliResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("shardctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> CliResult<Url> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| CliError::Config(format!("invalid endpoint {path}: {e}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.config.username {
            Some(username) => request.basic_auth(username, self.config.password.as_deref()),
            None => request,
        }
    }

    /// Send a request, turning non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> CliResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Received response");

        if !status.is_success() {
            let body = response.text().await?;
            return Err(CliError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn read_body(response: Response) -> CliResult<Vec<u8>> {
        let body = response.bytes().await?;
        trace!(bytes = body.len(), "Read response body");
        Ok(body.to_vec())
    }

    fn cat_shards_request(&self, options: &CatShardsOptions) -> CliResult<RequestBuilder> {
        let url = self.endpoint(CAT_SHARDS_PATH)?;
        debug!(url = %url, query = ?options.query_pairs(), "GET shard catalog");
        Ok(self.request(Method::GET, url).query(&options.query_pairs()))
    }
}

impl ClusterApi for HttpClusterClient {
    async fn cluster_settings(&self, filter_path: &str) -> CliResult<Vec<u8>> {
        let url = self.endpoint(CLUSTER_SETTINGS_PATH)?;
        debug!(url = %url, filter_path, "GET cluster settings");
        let request = self
            .request(Method::GET, url)
            .query(&[("filter_path", filter_path)]);
        let response = self.send(request).await?;
        Self::read_body(response).await
    }

    async fn put_cluster_settings(&self, body: Vec<u8>) -> CliResult<Vec<u8>> {
        let url = self.endpoint(CLUSTER_SETTINGS_PATH)?;
        debug!(url = %url, bytes = body.len(), "PUT cluster settings");
        let request = self
            .request(Method::PUT, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let response = self.send(request).await?;
        Self::read_body(response).await
    }

    async fn node_stats(&self, metric: &str, filter_path: &str) -> CliResult<Vec<u8>> {
        let url = self.endpoint(&format!("{NODE_STATS_PATH}/{metric}"))?;
        debug!(url = %url, filter_path, "GET node stats");
        let request = self
            .request(Method::GET, url)
            .query(&[("filter_path", filter_path)]);
        let response = self.send(request).await?;
        Self::read_body(response).await
    }

    async fn cat_shards(&self, options: &CatShardsOptions) -> CliResult<Vec<u8>> {
        let request = self.cat_shards_request(options)?;
        let response = self.send(request).await?;
        Self::read_body(response).await
    }

    async fn cat_shards_lines(&self, options: &CatShardsOptions) -> CliResult<LineReader> {
        let request = self.cat_shards_request(options)?;
        let response = self.send(request).await?;
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(stream))))
    }
}


/// Integration tests with mock server
#[cfg(test)]
mod mock_tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpClusterClient {
        let config = ClientConfig::new(&server.uri()).expect("mock uri is valid");
        HttpClusterClient::new(config).expect("client builds")
    }

    #[tokio::test]
    async fn test_cluster_settings_sends_filter_path() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_cluster/settings"))
            .and(query_param("filter_path", "**.cluster.routing.allocation.enable"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transient": {"cluster": {"routing": {"allocation": {"enable": "none"}}}}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let body = client_for(&mock_server)
            .cluster_settings("**.cluster.routing.allocation.enable")
            .await
            .expect("request succeeds");
        let value: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(value["transient"]["cluster"]["routing"]["allocation"]["enable"], "none");
    }

    #[tokio::test]
    async fn test_put_cluster_settings_sends_json_body() {
        let mock_server = MockServer::start().await;
        let document = serde_json::json!({
            "transient": {"cluster": {"routing": {"allocation": {"enable": "all"}}}}
        });

        Mock::given(method("PUT"))
            .and(path("/_cluster/settings"))
            .and(header("content-type", "application/json"))
            .and(body_json(&document))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"acknowledged":true}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let body = client_for(&mock_server)
            .put_cluster_settings(serde_json::to_vec(&document).expect("serialize"))
            .await
            .expect("request succeeds");
        assert_eq!(body, br#"{"acknowledged":true}"#);
    }

    #[tokio::test]
    async fn test_node_stats_path_and_filter() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_nodes/stats/indices"))
            .and(query_param(
                "filter_path",
                "nodes.**.name,nodes.**.indices.shard_stats.total_count",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let body = client_for(&mock_server)
            .node_stats("indices", "nodes.**.name,nodes.**.indices.shard_stats.total_count")
            .await
            .expect("request succeeds");
        assert_eq!(body, b"{}");
    }

    #[tokio::test]
    async fn test_cat_shards_query_parameters() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_cat/shards"))
            .and(query_param("s", "store:desc,index,shard"))
            .and(query_param("human", "true"))
            .and(query_param("pretty", "true"))
            .and(query_param("v", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string("index shard prirep\n"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let body = client_for(&mock_server)
            .cat_shards(&CatShardsOptions::listing(SortOrder::Desc))
            .await
            .expect("request succeeds");
        assert_eq!(body, b"index shard prirep\n");
    }

    #[tokio::test]
    async fn test_cat_shards_lines_streams_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/_cat/shards"))
            .respond_with(ResponseTemplate::new(200).set_body_string("header\nrow-1\nrow-2\n"))
            .mount(&mock_server)
            .await;

        let reader = client_for(&mock_server)
            .cat_shards_lines(&CatShardsOptions::listing(SortOrder::Asc))
            .await
            .expect("request succeeds");

        let mut lines = reader.lines();
        let mut collected = Vec::new();
        while let Some(line) = lines.next_line().await.expect("readable") {
            collected.push(line);
        }
        assert_eq!(collected, vec!["header", "row-1", "row-2"]);
    }

    #[tokio::test]
    async fn test_basic_auth_header() {
        let mock_server = MockServer::start().await;

        // "admin:secret"
        Mock::given(method("GET"))
            .and(path("/_cluster/settings"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::new(&mock_server.uri())
            .expect("mock uri is valid")
            .with_basic_auth("admin", Some("secret".into()));
        let client = HttpClusterClient::new(config).expect("client builds");

        let result = client.cluster_settings("**").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/_cluster/settings"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"illegal_argument_exception"}"#),
            )
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .put_cluster_settings(b"{}".to_vec())
            .await
            .unwrap_err();

        match err {
            CliError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("illegal_argument_exception"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop a listener so the port is very likely closed.
        let uri = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            format!("http://{}", listener.local_addr().expect("local addr"))
        };
        let config = ClientConfig::new(&uri)
            .expect("valid uri")
            .with_timeout(Duration::from_secs(2));
        let client = HttpClusterClient::new(config).expect("client builds");

        let err = client.cluster_settings("**").await.unwrap_err();
        assert!(matches!(err, CliError::Transport(_)));
    }
}
