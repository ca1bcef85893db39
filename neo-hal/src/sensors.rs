use crate::errors::HalResult;
use async_trait::async_trait;

pub mod lm75;
pub mod motion;
pub mod mpl3115a2;
pub mod tsl2561;

pub use lm75::Lm75;
pub use motion::{MotionKind, MotionSensor};
pub use mpl3115a2::Mpl3115a2;
pub use tsl2561::Tsl2561;

/// Decoded values from one `read`; each driver fills only what it measures.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SensorDataFrame {
    /// Degrees Celsius
    pub temperature: Option<f32>,
    /// Raw counts, broadband photodiode
    pub full_spectrum: Option<u16>,
    /// Raw counts, infrared photodiode
    pub infrared: Option<u16>,
    /// `full_spectrum - infrared`; negative when the IR channel saturates first
    pub visible: Option<i32>,
    /// Meters
    pub altitude: Option<f32>,
    /// Kilopascals
    pub pressure: Option<f32>,
}

#[async_trait]
pub trait SensorDriver: Send + Sync {
    async fn init(&mut self) -> HalResult<()>;
    async fn read(&self) -> HalResult<SensorDataFrame>;
    fn id(&self) -> &str;
}
