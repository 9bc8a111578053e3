use std::future::Future;
use std::io;

/// Run `fut` to completion on a fresh current-thread runtime.
pub fn block_on<F: Future>(fut: F) -> io::Result<F::Output> {
  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_io()
    .enable_time()
    .build()?;
  Ok(rt.block_on(fut))
}

/// Multi-thread runtime for long-running foreground servers.
pub fn server_runtime() -> io::Result<tokio::runtime::Runtime> {
  tokio::runtime::Builder::new_multi_thread()
    .enable_io()
    .enable_time()
    .worker_threads(2)
    .build()
}
