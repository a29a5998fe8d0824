use crate::{AccountInformation, ClientError, NetworkInfo, NodeStatus};
use futures_util::future::BoxFuture;
use nodeui_core::{Address, Block};

pub type ApiResult<'a, T> = BoxFuture<'a, Result<T, ClientError>>;

/// Everything the dashboard asks of a node.
///
/// The UI only talks to this trait, so tests can drive the fetch pipeline
/// with an in-memory node.
pub trait NodeApi: Send + Sync {
    fn status(&self) -> ApiResult<'_, NodeStatus>;

    /// Resolve once the node has reached `round`.
    fn wait_for_round(&self, round: u64) -> ApiResult<'_, NodeStatus>;

    fn block(&self, round: u64) -> ApiResult<'_, Block>;

    fn versions(&self) -> ApiResult<'_, NetworkInfo>;

    fn account(&self, address: Address) -> ApiResult<'_, AccountInformation>;

    /// Start fast catchup to the latest catchpoint of `network`. Returns the catchpoint label.
    fn start_catchup(&self, network: String) -> ApiResult<'_, String>;

    /// Abort fast catchup. Returns the catchpoint label that was aborted.
    fn abort_catchup(&self, network: String) -> ApiResult<'_, String>;

    fn shutdown(&self) -> ApiResult<'_, ()>;

    /// Contents of `config.json` in the node's data directory.
    fn config_file(&self) -> ApiResult<'_, String>;

    fn can_administer(&self) -> bool;
}
