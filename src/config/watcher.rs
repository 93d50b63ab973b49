//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself so that
//! editors which save by rename keep triggering reloads. A reload that parses
//! to the configuration already in effect is not forwarded.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::PlaygroundConfig;

/// Watches one configuration file and emits each new valid configuration.
pub struct ConfigWatcher {
    path: PathBuf,
    current: PlaygroundConfig,
    bind_override: Option<String>,
    update_tx: mpsc::UnboundedSender<PlaygroundConfig>,
}

impl ConfigWatcher {
    /// `current` is the configuration the server starts with.
    pub fn new(
        path: &Path,
        current: PlaygroundConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PlaygroundConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current,
            bind_override: None,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Keep a command-line listen address across reloads.
    ///
    /// Every reloaded file has its `listener.bind_address` replaced by
    /// `address` before it is compared and forwarded.
    pub fn with_bind_override(mut self, address: Option<String>) -> Self {
        self.bind_override = address;
        self
    }

    fn load(path: &Path, bind_override: Option<&str>) -> Result<PlaygroundConfig, ConfigError> {
        let mut config = load_config(path)?;
        if let Some(address) = bind_override {
            config.listener.bind_address = address.to_string();
        }
        Ok(config)
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for updates to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let Self {
            path,
            current,
            bind_override,
            update_tx,
        } = self;
        let file_name = path.file_name().map(|name| name.to_os_string());
        let last = Mutex::new(current);
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = %e, "Config watch error");
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                if !event.paths.iter().any(|p| p.file_name() == file_name.as_deref()) {
                    return;
                }

                let new_config = match Self::load(&watched, bind_override.as_deref()) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::error!(path = %watched.display(), error = %e, "Rejected config change, keeping current configuration");
                        return;
                    }
                };

                let Ok(mut last) = last.lock() else {
                    return;
                };
                if *last == new_config {
                    tracing::debug!(path = %watched.display(), "Config file touched without changes");
                    return;
                }
                *last = new_config.clone();

                tracing::info!(path = %watched.display(), "Config file changed, reloading");
                if update_tx.send(new_config).is_err() {
                    tracing::debug!("Config update receiver dropped");
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}
