use super::{SensorDataFrame, SensorDriver};
use crate::errors::{HalError, HalResult};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
    Accelerometer,
    Magnetometer,
    Gyroscope,
}

impl MotionKind {
    pub fn name(&self) -> &'static str {
        match self {
            MotionKind::Accelerometer => "accelerometer",
            MotionKind::Magnetometer => "magnetometer",
            MotionKind::Gyroscope => "gyroscope",
        }
    }
}

/// Placeholder for the on-board motion sensors. Every operation reports
/// `Unsupported` until real drivers exist.
pub struct MotionSensor {
    id: String,
    kind: MotionKind,
}

impl MotionSensor {
    pub fn new(id: String, kind: MotionKind) -> Self {
        Self { id, kind }
    }

    pub fn kind(&self) -> MotionKind {
        self.kind
    }

    pub fn enable(&mut self) -> HalResult<()> {
        Err(self.unsupported("enable"))
    }

    pub fn disable(&mut self) -> HalResult<()> {
        Err(self.unsupported("disable"))
    }

    pub fn set_frequency(&mut self, _hz: u32) -> HalResult<()> {
        Err(self.unsupported("set_frequency"))
    }

    fn unsupported(&self, operation: &str) -> HalError {
        HalError::Unsupported {
            capability: format!("{} {}", self.kind.name(), operation),
        }
    }
}

#[async_trait]
impl SensorDriver for MotionSensor {
    async fn init(&mut self) -> HalResult<()> {
        Err(self.unsupported("init"))
    }

    async fn read(&self) -> HalResult<SensorDataFrame> {
        Err(self.unsupported("read"))
    }

    fn id(&self) -> &str {
        &self.id
    }
}
