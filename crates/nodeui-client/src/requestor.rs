use crate::{
    AccountInformation, ApiResult, ClientError, NetworkInfo, NodeApi, NodeStatus, Version,
};
use futures_util::FutureExt;
use nodeui_core::{Address, Block, NodeConnectionConfig, decode_block};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TOKEN_HEADER: &str = "X-Algo-API-Token";
pub const CONFIG_FILE: &str = "config.json";

const CATCHPOINT_BUCKET: &str = "https://algorand-catchpoints.s3.us-east-2.amazonaws.com/channel";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// `NodeApi` over the node's REST interface.
#[derive(Debug, Clone)]
pub struct Requestor {
    client: reqwest::Client,
    base_url: String,
    token: String,
    admin_token: Option<String>,
    data_dir: Option<PathBuf>,
}

impl Requestor {
    /// Build a requestor for a resolved connection.
    ///
    /// # Errors
    /// Returns `ClientError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: &NodeConnectionConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.rest_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            admin_token: config.admin_token.clone(),
            data_dir: config.data_dir.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header(TOKEN_HEADER, &self.token)
    }

    fn admin_token(&self, operation: &'static str) -> Result<&str, ClientError> {
        self.admin_token
            .as_deref()
            .ok_or(ClientError::AdminTokenRequired(operation))
    }

    fn admin_request(
        &self,
        method: Method,
        path: &str,
        operation: &'static str,
    ) -> Result<RequestBuilder, ClientError> {
        let token = self.admin_token(operation)?;
        Ok(self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(TOKEN_HEADER, token))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let body = send(self.request(Method::GET, path)).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_status(&self) -> Result<NodeStatus, ClientError> {
        self.get_json("/v2/status").await
    }

    async fn fetch_wait_for_round(&self, round: u64) -> Result<NodeStatus, ClientError> {
        loop {
            let path = format!("/v2/status/wait-for-block-after/{}", round.saturating_sub(1));
            let status: NodeStatus = self.get_json(&path).await?;
            if status.last_round >= round {
                return Ok(status);
            }
            debug!(
                "Node at round {} still waiting for {round}",
                status.last_round
            );
        }
    }

    async fn fetch_block(&self, round: u64) -> Result<Block, ClientError> {
        let path = format!("/v2/blocks/{round}?format=json");
        let body = send(self.request(Method::GET, &path)).await?;
        Ok(decode_block(round, &body)?)
    }

    async fn fetch_versions(&self) -> Result<NetworkInfo, ClientError> {
        let version: Version = self.get_json("/versions").await?;
        NetworkInfo::from_version(&version)
    }

    async fn fetch_account(&self, address: Address) -> Result<AccountInformation, ClientError> {
        self.get_json(&format!("/v2/accounts/{address}")).await
    }

    async fn latest_catchpoint(&self, network: &str) -> Result<String, ClientError> {
        let url = catchpoint_url(network);
        let body = send(self.client.get(url)).await?;
        let label = String::from_utf8_lossy(&body).trim().to_string();
        info!("Latest {network} catchpoint is {label}");
        Ok(label)
    }

    async fn catchup(
        &self,
        method: Method,
        network: &str,
        operation: &'static str,
    ) -> Result<String, ClientError> {
        // Checked before contacting the catchpoint bucket.
        self.admin_token(operation)?;

        let catchpoint = self.latest_catchpoint(network).await?;
        let path = format!("/v2/catchup/{}", encode_catchpoint(&catchpoint));
        send(self.admin_request(method, &path, operation)?).await?;
        Ok(catchpoint)
    }

    async fn request_shutdown(&self) -> Result<(), ClientError> {
        let request = self.admin_request(Method::POST, "/v2/shutdown", "node shutdown")?;
        send(request).await?;
        warn!("Node shutdown requested");
        Ok(())
    }

    async fn read_config_file(&self) -> Result<String, ClientError> {
        let dir = self.data_dir.as_deref().ok_or(ClientError::NoDataDir)?;
        Ok(tokio::fs::read_to_string(dir.join(CONFIG_FILE)).await?)
    }
}

async fn send(request: RequestBuilder) -> Result<Vec<u8>, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).trim().to_string(),
        });
    }
    Ok(body.to_vec())
}

#[must_use]
pub fn catchpoint_url(network: &str) -> String {
    format!("{CATCHPOINT_BUCKET}/{network}/latest.catchpoint")
}

/// Catchpoint labels look like `round#hash`; the `#` must survive as a path segment.
#[must_use]
pub fn encode_catchpoint(label: &str) -> String {
    label.replace('#', "%23")
}

impl NodeApi for Requestor {
    fn status(&self) -> ApiResult<'_, NodeStatus> {
        self.fetch_status().boxed()
    }

    fn wait_for_round(&self, round: u64) -> ApiResult<'_, NodeStatus> {
        self.fetch_wait_for_round(round).boxed()
    }

    fn block(&self, round: u64) -> ApiResult<'_, Block> {
        self.fetch_block(round).boxed()
    }

    fn versions(&self) -> ApiResult<'_, NetworkInfo> {
        self.fetch_versions().boxed()
    }

    fn account(&self, address: Address) -> ApiResult<'_, AccountInformation> {
        self.fetch_account(address).boxed()
    }

    fn start_catchup(&self, network: String) -> ApiResult<'_, String> {
        async move { self.catchup(Method::POST, &network, "fast catchup").await }.boxed()
    }

    fn abort_catchup(&self, network: String) -> ApiResult<'_, String> {
        async move {
            self.catchup(Method::DELETE, &network, "aborting fast catchup")
                .await
        }
        .boxed()
    }

    fn shutdown(&self) -> ApiResult<'_, ()> {
        self.request_shutdown().boxed()
    }

    fn config_file(&self) -> ApiResult<'_, String> {
        self.read_config_file().boxed()
    }

    fn can_administer(&self) -> bool {
        self.admin_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(admin: Option<&str>, data_dir: Option<PathBuf>) -> NodeConnectionConfig {
        NodeConnectionConfig {
            // Nothing listens on port 9 in the test environment; privileged
            // calls must fail before reaching it.
            rest_url: "http://127.0.0.1:9/".into(),
            api_token: "token".into(),
            admin_token: admin.map(str::to_string),
            data_dir,
        }
    }

    #[test]
    fn test_catchpoint_helpers() {
        assert_eq!(
            catchpoint_url("testnet"),
            "https://algorand-catchpoints.s3.us-east-2.amazonaws.com/channel/testnet/latest.catchpoint"
        );
        assert_eq!(encode_catchpoint("4420000#ABCDEF"), "4420000%23ABCDEF");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let requestor = Requestor::new(&config(None, None)).unwrap();
        assert_eq!(requestor.base_url, "http://127.0.0.1:9");
        assert!(!requestor.can_administer());
    }

    #[tokio::test]
    async fn test_privileged_calls_need_admin_token() {
        let requestor = Requestor::new(&config(None, None)).unwrap();

        let err = requestor.shutdown().await.unwrap_err();
        assert!(matches!(err, ClientError::AdminTokenRequired("node shutdown")));

        let err = requestor
            .start_catchup("testnet".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AdminTokenRequired("fast catchup")));

        let err = requestor
            .abort_catchup("testnet".into())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AdminTokenRequired(_)));
    }

    #[tokio::test]
    async fn test_config_file_needs_data_dir() {
        let requestor = Requestor::new(&config(Some("admin"), None)).unwrap();
        assert!(requestor.can_administer());
        let err = requestor.config_file().await.unwrap_err();
        assert!(matches!(err, ClientError::NoDataDir));
    }

    #[tokio::test]
    async fn test_config_file_read_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"Version": 33}"#).unwrap();

        let requestor = Requestor::new(&config(None, Some(dir.path().to_path_buf()))).unwrap();
        let contents = requestor.config_file().await.unwrap();
        assert!(contents.contains("\"Version\": 33"));
    }
}
