use super::{SensorDataFrame, SensorDriver};
use crate::bus::{BusTransport, SharedBus};
use crate::errors::HalResult;
use crate::timeout::with_timeout;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ADDRESS: u8 = 0x48;

// Register addresses for the LM75
const TEMP_REGISTER: u8 = 0x00;

/// LM75 digital thermometer.
///
/// The device powers up in continuous conversion mode; nothing is written to
/// its configuration register.
pub struct Lm75<B> {
    id: String,
    address: u8,
    bus: SharedBus<B>,
    timeout: Option<Duration>,
}

impl<B: BusTransport> Lm75<B> {
    pub fn new(id: String, address: u8, bus: SharedBus<B>) -> Self {
        Self { id, address, bus, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Reads the temperature register and returns degrees Celsius.
    pub async fn get_temperature(&self) -> HalResult<f32> {
        let raw = with_timeout(
            self.timeout,
            || format!("[{}] temperature read", self.id),
            async {
                let mut bus = self.bus.lock().await;
                bus.read_word(self.address, TEMP_REGISTER).await
            },
        )
        .await
        .map_err(|e| {
            warn!("[{}] temperature read failed: {}", self.id, e);
            e
        })?;

        let celsius = word_to_celsius(raw);
        debug!("[{}] raw={:#06x} temp={} °C", self.id, raw, celsius);
        Ok(celsius)
    }

    pub async fn get_temperature_fahrenheit(&self) -> HalResult<f32> {
        self.get_temperature().await.map(celsius_to_fahrenheit)
    }
}

/// Decodes an SMBus word read of the temperature register.
///
/// The device sends MSB first while SMBus words are little-endian, so the
/// bytes are swapped before scaling. The low 3 bits are don't-care; the result
/// has 0.125 °C resolution.
pub fn word_to_celsius(raw: u16) -> f32 {
    regdata_to_celsius(raw.swap_bytes())
}

/// Scales register content (MSB first, two's complement) to Celsius.
pub fn regdata_to_celsius(regdata: u16) -> f32 {
    (regdata as i16) as f32 / 32.0 / 8.0
}

pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * (9.0 / 5.0) + 32.0
}

#[async_trait]
impl<B: BusTransport> SensorDriver for Lm75<B> {
    async fn init(&mut self) -> HalResult<()> {
        debug!("[{}] LM75 at {:#04x} ready", self.id, self.address);
        Ok(())
    }

    async fn read(&self) -> HalResult<SensorDataFrame> {
        Ok(SensorDataFrame {
            temperature: Some(self.get_temperature().await?),
            ..Default::default()
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}
