//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. Keep the returned watcher alive for as long
    /// as updates should flow.
    ///
    /// The parent directory is watched rather than the file itself, so an
    /// editor that saves by writing a temp file and renaming it over the
    /// config keeps triggering reloads.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let file_name = self.path.file_name().map(|name| name.to_os_string());
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|name| name.to_os_string()) == file_name);
                    if !touches_config {
                        return;
                    }
                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    match load_config(&path) {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current routes");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_text(path: &str) -> String {
        format!("[[routes]]\nmethod = \"GET\"\npath = \"{path}\"\nhandler = \"hello\"\n")
    }

    /// Write a sibling temp file and rename it over `target`.
    fn atomic_save(target: &Path, contents: &str) {
        let tmp = target.with_extension("toml.tmp");
        fs::write(&tmp, contents).unwrap();
        fs::rename(&tmp, target).unwrap();
    }

    /// Wait for an update that carries `path` as its first route.
    async fn next_route(rx: &mut mpsc::UnboundedReceiver<RouterConfig>, path: &str) {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let config = rx.recv().await.unwrap();
                if config.routes.first().map(|r| r.path.as_str()) == Some(path) {
                    break;
                }
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_reload_survives_atomic_saves() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("router.toml");
        fs::write(&config_path, config_text("/r0")).unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&config_path);
        let _watcher = watcher.run().unwrap();

        atomic_save(&config_path, &config_text("/r1"));
        next_route(&mut rx, "/r1").await;

        // The rename replaced the watched inode; a second save must still be seen.
        atomic_save(&config_path, &config_text("/r2"));
        next_route(&mut rx, "/r2").await;
    }

    #[tokio::test]
    async fn test_ignores_other_files_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("router.toml");
        fs::write(&config_path, config_text("/r0")).unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&config_path);
        let _watcher = watcher.run().unwrap();

        fs::write(dir.path().join("other.txt"), "not a config").unwrap();
        let update = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(update.is_err(), "unrelated file triggered a reload");
    }
}
