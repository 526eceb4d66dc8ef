//! Config providers consulted once per request.
//!
//! `FileConfigStore` reloads the YAML file whenever its modification time
//! changes, so rules can be edited without a restart. A failed reload is
//! reported to the caller and the next request tries again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;

use hookrelay_core::error::{HookError, Result};

use super::{load_from_str, to_yaml, WebhookConfig};

/// Source of the current config snapshot.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn get_config(&self) -> Result<Arc<WebhookConfig>>;
}

/// Fixed config, for embedding and tests.
pub struct StaticConfig(Arc<WebhookConfig>);

impl StaticConfig {
    pub fn new(cfg: WebhookConfig) -> Self {
        Self(Arc::new(cfg))
    }
}

#[async_trait]
impl ConfigProvider for StaticConfig {
    async fn get_config(&self) -> Result<Arc<WebhookConfig>> {
        Ok(Arc::clone(&self.0))
    }
}

struct Cached {
    mtime: SystemTime,
    cfg: Arc<WebhookConfig>,
}

/// YAML file provider with mtime-keyed caching.
///
/// Requests that find the file unchanged share a read lock; only a reload or
/// the initial seed takes the write lock.
pub struct FileConfigStore {
    path: PathBuf,
    cache: RwLock<Option<Cached>>,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: RwLock::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and fully validate the config before serving. A freshly seeded
    /// default fails here, since its token is empty, and the error names the
    /// file to edit.
    pub async fn load_for_startup(&self) -> Result<Arc<WebhookConfig>> {
        let cfg = self.get_config().await?;
        cfg.validate().map_err(|e| {
            let detail = match e {
                HookError::Config(msg) => msg,
                other => other.to_string(),
            };
            HookError::Config(format!("{detail}; edit {} and restart", self.path.display()))
        })?;
        Ok(cfg)
    }

    /// Write the default config to a missing file and serve it until the
    /// file is edited. The default has auth enabled with an empty token, so
    /// every webhook is refused until an operator fills it in.
    async fn seed_default(&self) -> Result<Cached> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| HookError::Config(format!("create config dir failed: {e}")))?;
        }
        let cfg = WebhookConfig::default();
        tokio::fs::write(&self.path, to_yaml(&cfg)?)
            .await
            .map_err(|e| HookError::Config(format!("write default config failed: {e}")))?;
        let mtime = modified(&self.path)
            .await?
            .ok_or_else(|| HookError::Config("config vanished after seeding".into()))?;

        tracing::warn!(
            path = %self.path.display(),
            "config file missing; wrote defaults. Set bot.self_id and auth.token in it"
        );
        Ok(Cached { mtime, cfg: Arc::new(cfg) })
    }

    async fn load(&self, mtime: SystemTime) -> Result<Cached> {
        let s = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| HookError::Config(format!("read config failed: {e}")))?;
        let cfg = Arc::new(load_from_str(&s)?);
        tracing::info!(path = %self.path.display(), rules = cfg.rules.len(), "config loaded");
        Ok(Cached { mtime, cfg })
    }
}

/// Modification time, or `None` when the file does not exist.
async fn modified(path: &Path) -> Result<Option<SystemTime>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta
            .modified()
            .map(Some)
            .map_err(|e| HookError::Config(format!("config mtime unavailable: {e}"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HookError::Config(format!("stat config failed: {e}"))),
    }
}

#[async_trait]
impl ConfigProvider for FileConfigStore {
    async fn get_config(&self) -> Result<Arc<WebhookConfig>> {
        if let Some(mtime) = modified(&self.path).await? {
            let cache = self.cache.read().await;
            if let Some(c) = cache.as_ref().filter(|c| c.mtime == mtime) {
                return Ok(Arc::clone(&c.cfg));
            }
        }

        let mut cache = self.cache.write().await;
        // Another request may have reloaded or seeded while we waited.
        let cached = match modified(&self.path).await? {
            Some(mtime) => match cache.as_ref().filter(|c| c.mtime == mtime) {
                Some(c) => return Ok(Arc::clone(&c.cfg)),
                None => self.load(mtime).await?,
            },
            None => self.seed_default().await?,
        };
        let cfg = Arc::clone(&cached.cfg);
        *cache = Some(cached);
        Ok(cfg)
    }
}
