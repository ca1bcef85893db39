use super::{SensorDataFrame, SensorDriver};
use crate::bus::{BusTransport, SharedBus};
use crate::errors::HalResult;
use crate::timeout::with_timeout;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ADDRESS: u8 = 0x60;

// Register addresses for the MPL3115A2
const STATUS: u8 = 0x00;
const PT_DATA_CFG: u8 = 0x13;
const CTRL_REG1: u8 = 0x26;

// CTRL_REG1: altimeter mode, OSR = 128, one-shot
const ALTIMETER_ONE_SHOT: u8 = 0xB9;
// CTRL_REG1: barometer mode, OSR = 128, one-shot
const BAROMETER_ONE_SHOT: u8 = 0x39;
// PT_DATA_CFG: data-ready events for pressure/altitude and temperature
const DATA_READY_EVENTS: u8 = 0x07;

/// Minimum wait between a one-shot trigger and reading its result.
pub const CONVERSION_DELAY: Duration = Duration::from_millis(100);

/// MPL3115A2 barometric pressure / altitude sensor.
///
/// Each getter is an independent one-shot transaction holding the bus for
/// trigger, conversion delay and result read.
pub struct Mpl3115a2<B> {
    id: String,
    address: u8,
    bus: SharedBus<B>,
    timeout: Option<Duration>,
}

impl<B: BusTransport> Mpl3115a2<B> {
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

    /// Altitude in meters.
    pub async fn get_altitude(&self) -> HalResult<f32> {
        let data = self.altimeter_sample().await?;
        Ok(altitude_from(&data))
    }

    /// Die temperature in degrees Celsius.
    pub async fn get_temperature(&self) -> HalResult<f32> {
        let data = self.altimeter_sample().await?;
        Ok(temperature_from(&data))
    }

    /// Pressure in kilopascals.
    pub async fn get_pressure(&self) -> HalResult<f32> {
        let data = self.barometer_transaction().await.map_err(|e| {
            warn!("[{}] pressure conversion failed: {}", self.id, e);
            e
        })?;

        let pressure = pressure_from(&data);
        debug!("[{}] pressure={} kPa", self.id, pressure);
        Ok(pressure)
    }

    /// Triggers an altimeter-mode conversion and returns the 6-byte result
    /// block (status, altitude MSB/CSB/LSB, temperature MSB/LSB).
    async fn altimeter_sample(&self) -> HalResult<[u8; 6]> {
        self.altimeter_transaction().await.map_err(|e| {
            warn!("[{}] altitude conversion failed: {}", self.id, e);
            e
        })
    }

    // The timeout bounds the bus transfers on either side of the conversion
    // delay, never the delay itself.
    async fn altimeter_transaction(&self) -> HalResult<[u8; 6]> {
        let mut bus = self.bus.lock().await;
        self.bounded("altitude trigger", trigger_altimeter(&mut *bus, self.address))
            .await?;
        tokio::time::sleep(CONVERSION_DELAY).await;
        let mut data = [0u8; 6];
        self.bounded("altitude read", bus.read_block(self.address, STATUS, &mut data))
            .await?;
        Ok(data)
    }

    async fn barometer_transaction(&self) -> HalResult<[u8; 4]> {
        let mut bus = self.bus.lock().await;
        self.bounded(
            "pressure trigger",
            bus.write_byte(self.address, CTRL_REG1, BAROMETER_ONE_SHOT),
        )
        .await?;
        tokio::time::sleep(CONVERSION_DELAY).await;
        let mut data = [0u8; 4];
        self.bounded("pressure read", bus.read_block(self.address, STATUS, &mut data))
            .await?;
        Ok(data)
    }

    async fn bounded<T, F>(&self, stage: &str, fut: F) -> HalResult<T>
    where
        F: Future<Output = HalResult<T>>,
    {
        with_timeout(self.timeout, || format!("[{}] {}", self.id, stage), fut).await
    }
}

async fn trigger_altimeter<B: BusTransport>(bus: &mut B, address: u8) -> HalResult<()> {
    bus.write_byte(address, CTRL_REG1, ALTIMETER_ONE_SHOT).await?;
    bus.write_byte(address, PT_DATA_CFG, DATA_READY_EVENTS).await?;
    bus.write_byte(address, CTRL_REG1, ALTIMETER_ONE_SHOT).await
}

/// Altitude from bytes 1..=3: signed Q16.4 meters.
pub fn altitude_from(data: &[u8; 6]) -> f32 {
    let raw = i32::from_be_bytes([data[1], data[2], data[3] & 0xF0, 0]) >> 12;
    raw as f32 / 16.0
}

/// Temperature from bytes 4..=5: signed Q8.4 degrees Celsius.
pub fn temperature_from(data: &[u8; 6]) -> f32 {
    let raw = i16::from_be_bytes([data[4], data[5] & 0xF0]) >> 4;
    raw as f32 / 16.0
}

/// Pressure from bytes 1..=3: unsigned Q18.2 pascals, scaled to kilopascals.
pub fn pressure_from(data: &[u8; 4]) -> f32 {
    let raw = ((data[1] as u32) << 16) | ((data[2] as u32) << 8) | (data[3] & 0xF0) as u32;
    (raw >> 4) as f32 / 4.0 / 1000.0
}

#[async_trait]
impl<B: BusTransport> SensorDriver for Mpl3115a2<B> {
    async fn init(&mut self) -> HalResult<()> {
        debug!("[{}] MPL3115A2 at {:#04x} ready", self.id, self.address);
        Ok(())
    }

    async fn read(&self) -> HalResult<SensorDataFrame> {
        let sample = self.altimeter_sample().await?;
        let pressure = self.get_pressure().await?;
        Ok(SensorDataFrame {
            temperature: Some(temperature_from(&sample)),
            altitude: Some(altitude_from(&sample)),
            pressure: Some(pressure),
            ..Default::default()
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}
