use tracing::debug;

use crate::rpc::{DaemonClient, DaemonError, GetInfoResult};

/// Check whether a daemon answers on the client's socket.
pub async fn probe(client: &DaemonClient) -> Result<GetInfoResult, DaemonError> {
  let res = client.get_info().await;
  match &res {
    Ok(info) => debug!(
      event = "daemon_probe_ok",
      socket = %client.socket_path().display(),
      version = %info.version,
      network = %info.network,
      "daemon answered"
    ),
    Err(e) => debug!(
      event = "daemon_probe_failed",
      socket = %client.socket_path().display(),
      unreachable = e.is_unreachable(),
      error = %e,
      "daemon did not answer"
    ),
  }
  res
}
