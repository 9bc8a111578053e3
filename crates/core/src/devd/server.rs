use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::api::{Reply, Wallet};

/// Create a shutdown channel for coordinating server termination.
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
  watch::channel(false)
}

/// Bind the socket and spawn the accept loop.
pub fn start(
  socket_path: &Path,
  wallet: Arc<Wallet>,
  shutdown_tx: watch::Sender<bool>,
  mut shutdown_rx: watch::Receiver<bool>,
) -> io::Result<JoinHandle<()>> {
  if let Some(parent) = socket_path.parent() {
    fs::create_dir_all(parent)?;
  }
  // Remove stale socket if present
  let _ = fs::remove_file(socket_path);

  let listener = UnixListener::bind(socket_path)?;
  let sock = socket_path.to_path_buf();

  info!(event = "devd_started", socket = %socket_path.display(), "dev daemon started");

  let task = tokio::spawn(async move {
    loop {
      tokio::select! {
        _ = shutdown_rx.changed() => {
          info!(event = "devd_shutdown", "shutdown signal received; stopping accept loop");
          break;
        }
        res = listener.accept() => {
          match res {
            Ok((stream, _addr)) => {
              let wallet = wallet.clone();
              let shutdown_tx = shutdown_tx.clone();
              tokio::spawn(async move {
                if let Err(e) = serve(stream, wallet, shutdown_tx).await {
                  error!(event = "devd_serve_error", error = %e, "serve error");
                }
              });
            }
            Err(e) => {
              error!(event = "devd_accept_error", error = %e, "accept error");
              break;
            }
          }
        }
      }
    }
    let _ = fs::remove_file(&sock);
    info!(event = "devd_stopped", socket = %sock.display(), "dev daemon stopped");
  });

  Ok(task)
}

/// Answer newline-delimited requests until the peer hangs up.
async fn serve(
  stream: UnixStream,
  wallet: Arc<Wallet>,
  shutdown_tx: watch::Sender<bool>,
) -> io::Result<()> {
  let (read, mut write) = stream.into_split();
  let mut lines = BufReader::new(read).lines();
  while let Some(line) = lines.next_line().await? {
    if line.trim().is_empty() {
      continue;
    }
    let Reply { body, stop } = wallet.handle_line(&line);
    debug!(event = "devd_reply", stop, "answering request");
    let mut out = body.to_string();
    out.push('\n');
    write.write_all(out.as_bytes()).await?;
    write.flush().await?;
    if stop {
      let _ = shutdown_tx.send(true);
      break;
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::LogLevel;
  use crate::logging::Logger;
  use crate::network::Network;
  use tokio::io::AsyncReadExt;

  #[test]
  fn serve_errors_carry_an_event_tag() {
    let td = tempfile::tempdir().unwrap();
    let log = td.path().join("devd.log");
    let (logger, subscriber) = Logger::build(LogLevel::Info);
    let default = tracing::subscriber::set_default(subscriber);
    logger.log_to_file(&log).unwrap();

    let rt = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .unwrap();
    rt.block_on(async {
      let sock = td.path().join("s");
      let (tx, rx) = shutdown_channel();
      let wallet = Arc::new(Wallet::new(Network::Regtest, 0));
      let task = start(&sock, wallet, tx.clone(), rx).unwrap();

      let mut stream = UnixStream::connect(&sock).await.unwrap();
      stream.write_all(b"\xff\xfe\n").await.unwrap();
      let mut rest = vec![];
      stream.read_to_end(&mut rest).await.unwrap();
      assert!(rest.is_empty());

      let _ = tx.send(true);
      task.await.unwrap();
    });
    drop(default);
    drop(logger);

    let body = fs::read_to_string(&log).unwrap();
    assert!(
      body.lines().any(|l| l.contains("\"event\":\"devd_serve_error\"")),
      "{body}"
    );
  }
}
