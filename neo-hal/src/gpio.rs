use crate::errors::{log_failure, HalError, HalResult};
use crate::pins::{KernelPin, LogicalPin, PinTable};
use crate::sysfs::{join, SysfsIo};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_BASE_PATH: &str = "/sys/class/gpio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "0",
            Level::High => "1",
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Outcome of a batch export/unexport. Failures are collected, never fatal.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub failures: Vec<(LogicalPin, HalError)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// GPIO control through `/sys/class/gpio`.
///
/// Operations on one kernel pin are serialized; different pins proceed
/// independently.
pub struct PinController {
    base_path: PathBuf,
    io: Arc<dyn SysfsIo>,
    locks: HashMap<KernelPin, Mutex<()>>,
}

impl PinController {
    pub fn new(base_path: impl Into<PathBuf>, io: Arc<dyn SysfsIo>) -> Self {
        let locks = PinTable::entries()
            .map(|(_, _, kernel)| (kernel, Mutex::new(())))
            .collect();
        Self {
            base_path: base_path.into(),
            io,
            locks,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn set_base_path(&mut self, base_path: impl Into<PathBuf>) {
        self.base_path = base_path.into();
        info!("[gpio] base path set to {}", self.base_path.display());
    }

    pub async fn export(&self, pin: LogicalPin) -> HalResult<()> {
        let result = self.write_control(pin, "export").await;
        report("export", pin, result)
    }

    pub async fn unexport(&self, pin: LogicalPin) -> HalResult<()> {
        let result = self.write_control(pin, "unexport").await;
        report("unexport", pin, result)
    }

    pub async fn export_all(&self) -> BatchReport {
        let mut batch = BatchReport::default();
        for (_, pin, _) in PinTable::entries() {
            batch.attempted += 1;
            if let Err(e) = self.export(pin).await {
                batch.failures.push((pin, e));
            }
        }
        info!("[gpio] exported {}/{} pins", batch.succeeded(), batch.attempted);
        batch
    }

    pub async fn unexport_all(&self) -> BatchReport {
        let mut batch = BatchReport::default();
        for (_, pin, _) in PinTable::entries() {
            batch.attempted += 1;
            if let Err(e) = self.unexport(pin).await {
                batch.failures.push((pin, e));
            }
        }
        info!("[gpio] unexported {}/{} pins", batch.succeeded(), batch.attempted);
        batch
    }

    pub async fn set_direction(&self, pin: LogicalPin, direction: Direction) -> HalResult<()> {
        let result = self.write_attribute(pin, "direction", direction.as_str()).await;
        report("set_direction", pin, result)
    }

    pub async fn write_digital(&self, pin: LogicalPin, level: Level) -> HalResult<()> {
        let result = self.write_attribute(pin, "value", level.as_str()).await;
        report("write_digital", pin, result)
    }

    pub async fn read_digital(&self, pin: LogicalPin) -> HalResult<Level> {
        let result = self.read_value(pin).await;
        report("read_digital", pin, result)
    }

    async fn read_value(&self, pin: LogicalPin) -> HalResult<Level> {
        let kernel = PinTable::kernel_pin(pin)?;
        let path = self.attribute_path(kernel, "value");
        let content = {
            let _guard = self.lock(kernel).await;
            self.io.read(&path).await?
        };
        match content.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            _ => Err(HalError::Parse { path, content }),
        }
    }

    async fn write_control(&self, pin: LogicalPin, file: &str) -> HalResult<()> {
        let kernel = PinTable::kernel_pin(pin)?;
        let _guard = self.lock(kernel).await;
        self.io
            .write(&self.base_path.join(file), &kernel.to_string())
            .await?;
        debug!("[gpio] {} pin {} (gpio{})", file, pin, kernel);
        Ok(())
    }

    async fn write_attribute(&self, pin: LogicalPin, attribute: &str, value: &str) -> HalResult<()> {
        let kernel = PinTable::kernel_pin(pin)?;
        let _guard = self.lock(kernel).await;
        self.io.write(&self.attribute_path(kernel, attribute), value).await?;
        debug!("[gpio] pin {} (gpio{}) {} = {}", pin, kernel, attribute, value);
        Ok(())
    }

    fn attribute_path(&self, kernel: KernelPin, attribute: &str) -> PathBuf {
        join(&self.base_path, &[format!("gpio{}", kernel).as_str(), attribute])
    }

    async fn lock(&self, kernel: KernelPin) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        let lock = self.locks.get(&kernel)?;
        Some(lock.lock().await)
    }
}

fn report<T>(operation: &str, pin: LogicalPin, result: HalResult<T>) -> HalResult<T> {
    log_failure("gpio", operation, pin, result)
}
