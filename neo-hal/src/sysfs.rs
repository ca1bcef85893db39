use crate::errors::{HalError, HalResult};
use crate::timeout::with_timeout;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::trace;

/// Access to kernel control files (GPIO, PWM, ADC attributes).
#[async_trait]
pub trait SysfsIo: Send + Sync {
    /// Overwrites an existing attribute. Attributes are never created.
    async fn write(&self, path: &Path, value: &str) -> HalResult<()>;

    async fn read(&self, path: &Path) -> HalResult<String>;
}

/// The real filesystem, with an optional per-access timeout.
#[derive(Debug, Default, Clone)]
pub struct Sysfs {
    timeout: Option<Duration>,
}

impl Sysfs {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

fn file_access(path: &Path) -> impl FnOnce(std::io::Error) -> HalError + '_ {
    move |source| HalError::FileAccess { path: path.to_path_buf(), source }
}

#[async_trait]
impl SysfsIo for Sysfs {
    async fn write(&self, path: &Path, value: &str) -> HalResult<()> {
        trace!("[sysfs] {} <- {}", path.display(), value);
        with_timeout(self.timeout, || format!("write to {}", path.display()), async {
            let mut file = tokio::fs::OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(path)
                .await
                .map_err(file_access(path))?;
            file.write_all(value.as_bytes()).await.map_err(file_access(path))?;
            file.flush().await.map_err(file_access(path))
        })
        .await
    }

    async fn read(&self, path: &Path) -> HalResult<String> {
        let content = with_timeout(self.timeout, || format!("read of {}", path.display()), async {
            tokio::fs::read_to_string(path).await.map_err(file_access(path))
        })
        .await?;
        trace!("[sysfs] {} -> {}", path.display(), content.trim_end());
        Ok(content)
    }
}

/// Parses a whole attribute as a decimal integer, ignoring surrounding whitespace.
pub fn parse_int(path: &Path, content: &str) -> HalResult<i64> {
    content.trim().parse().map_err(|_| HalError::Parse {
        path: path.to_path_buf(),
        content: content.to_string(),
    })
}

pub(crate) fn join(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |path, part| path.join(part))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Real filesystem access that records every write and can refuse chosen values.
    #[derive(Default)]
    pub struct RecordingSysfs {
        inner: Sysfs,
        refuse: Vec<String>,
        writes: Mutex<Vec<(PathBuf, String)>>,
    }

    impl RecordingSysfs {
        pub fn new() -> Self {
            Self::default()
        }

        /// Writes of exactly `value` fail with `EBUSY`.
        pub fn refusing(mut self, value: &str) -> Self {
            self.refuse.push(value.to_string());
            self
        }

        pub fn writes(&self) -> Vec<(PathBuf, String)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SysfsIo for RecordingSysfs {
        async fn write(&self, path: &Path, value: &str) -> HalResult<()> {
            self.writes
                .lock()
                .unwrap()
                .push((path.to_path_buf(), value.to_string()));
            if self.refuse.iter().any(|v| v == value) {
                return Err(HalError::FileAccess {
                    path: path.to_path_buf(),
                    source: std::io::Error::from_raw_os_error(16),
                });
            }
            self.inner.write(path, value).await
        }

        async fn read(&self, path: &Path) -> HalResult<String> {
            self.inner.read(path).await
        }
    }
}
