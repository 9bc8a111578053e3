use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{Subscriber, info, subscriber::set_global_default};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, reload};

use crate::config::{LogLevel, installer_log_path, log_path};
use crate::installer::remove_if_exists;
use crate::network::Network;

#[derive(Debug, Error)]
pub enum LoggingError {
  #[error("a global logger is already installed")]
  AlreadyInstalled,
  #[error("opening log file {}: {source}", path.display())]
  Open { path: PathBuf, source: io::Error },
  #[error("changing log level: {0}")]
  Reload(#[from] reload::Error),
}

/// Sent through the appender channel to make the worker take the next
/// queued file. Lines queued before it still reach the previous file.
const SWITCH_MARKER: &[u8] = b"\0coffer-log-switch\0";

/// File sink that can be pointed at a different file at runtime. Writes are
/// dropped while no file is set.
#[derive(Clone, Default)]
struct SwitchableFile {
  current: Arc<Mutex<Option<File>>>,
  pending: Arc<Mutex<VecDeque<Option<File>>>>,
}

impl Write for SwitchableFile {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    if buf == SWITCH_MARKER {
      if let Some(next) = self.pending.lock().pop_front() {
        let mut current = self.current.lock();
        if let Some(f) = current.as_mut() {
          let _ = f.flush();
        }
        *current = next;
      }
      return Ok(buf.len());
    }
    match self.current.lock().as_mut() {
      Some(f) => f.write(buf),
      None => Ok(buf.len()),
    }
  }

  fn flush(&mut self) -> io::Result<()> {
    match self.current.lock().as_mut() {
      Some(f) => f.flush(),
      None => Ok(()),
    }
  }
}

/// Structured JSON logging whose destination follows the session: the
/// installer log while setup runs, the per-network log once configured.
pub struct Logger {
  file: SwitchableFile,
  writer: NonBlocking,
  current: Mutex<Option<PathBuf>>,
  level: reload::Handle<EnvFilter, Registry>,
  _guard: WorkerGuard,
}

impl Logger {
  /// Build the logger and its subscriber without installing it globally.
  pub fn build(level: LogLevel) -> (Logger, impl Subscriber + Send + Sync + 'static) {
    let file = SwitchableFile::default();
    // Non-blocking writer to avoid stalling on disk IO. Not lossy: a dropped
    // switch marker would leave the sink on the old file.
    let (nb_writer, guard): (NonBlocking, WorkerGuard) =
      NonBlockingBuilder::default().lossy(false).finish(file.clone());
    let writer = nb_writer.clone();
    let (filter, handle) = reload::Layer::new(EnvFilter::new(level.as_filter()));

    let json_layer = fmt::layer()
      .with_timer(ChronoUtc::rfc_3339())
      .json()
      .with_current_span(true)
      .with_span_list(true)
      .with_level(true)
      .with_target(false)
      .with_thread_ids(false)
      .with_thread_names(false)
      .with_writer(move || nb_writer.clone());

    let subscriber = Registry::default().with(filter).with(json_layer);
    let logger = Logger {
      file,
      writer,
      current: Mutex::new(None),
      level: handle,
      _guard: guard,
    };
    (logger, subscriber)
  }

  /// Build and install as the global default subscriber.
  pub fn install(level: LogLevel) -> Result<Logger, LoggingError> {
    let (logger, subscriber) = Self::build(level);
    set_global_default(subscriber).map_err(|_| LoggingError::AlreadyInstalled)?;
    Ok(logger)
  }

  /// Log to `<datadir>/installer.log`.
  pub fn set_installer_mode(&self, datadir: &Path) -> Result<(), LoggingError> {
    self.log_to_file(&installer_log_path(datadir))
  }

  /// Log to `<datadir>/<network>/coffer.log`.
  pub fn set_running_mode(&self, datadir: &Path, network: Network) -> Result<(), LoggingError> {
    self.log_to_file(&log_path(datadir, network))
  }

  pub fn set_level(&self, level: LogLevel) -> Result<(), LoggingError> {
    self.level.reload(EnvFilter::new(level.as_filter()))?;
    Ok(())
  }

  /// Delete the installer log once setup succeeded.
  pub fn remove_installer_log(&self, datadir: &Path) -> io::Result<()> {
    let path = installer_log_path(datadir);
    let mut current = self.current.lock();
    if current.as_deref() == Some(path.as_path()) {
      self.switch_sink(None);
      *current = None;
    }
    remove_if_exists(&path)
  }

  pub fn current_path(&self) -> Option<PathBuf> {
    self.current.lock().clone()
  }

  /// Point the sink at an arbitrary file, created in append mode.
  pub fn log_to_file(&self, path: &Path) -> Result<(), LoggingError> {
    if let Some(parent) = path.parent() {
      let _ = fs::create_dir_all(parent);
    }
    let file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .map_err(|source| LoggingError::Open {
        path: path.to_path_buf(),
        source,
      })?;
    self.switch_sink(Some(file));
    *self.current.lock() = Some(path.to_path_buf());
    info!(event = "logging_initialized", logs_path = %path.display(), "logging to file");
    Ok(())
  }

  /// Queue `next` behind everything already logged.
  fn switch_sink(&self, next: Option<File>) {
    self.file.pending.lock().push_back(next);
    let mut writer = self.writer.clone();
    if writer.write_all(SWITCH_MARKER).is_err() {
      // Worker gone: nothing is queued anymore, switch directly.
      if let Some(next) = self.file.pending.lock().pop_front() {
        *self.file.current.lock() = next;
      }
    }
  }
}
