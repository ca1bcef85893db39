use super::{SensorDataFrame, SensorDriver};
use crate::bus::{BusTransport, SharedBus};
use crate::errors::{HalError, HalResult};
use crate::timeout::with_timeout;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_ADDRESS: u8 = 0x29;

// Register addresses for the TSL2561, always sent with the command bit set
const COMMAND_BIT: u8 = 0x80;
const CONTROL: u8 = 0x00;
const TIMING: u8 = 0x01;
const DATA0: u8 = 0x0C;
const DATA1: u8 = 0x0E;

const POWER_ON: u8 = 0x03;
const INTEGRATION_402MS: u8 = 0x02;

/// The first conversion cycle after power-up is invalid.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// TSL2561 light-to-digital converter.
///
/// Every getter re-reads both photodiode channels. Use `read` to get all
/// three values from a single pair of transfers.
pub struct Tsl2561<B> {
    id: String,
    address: u8,
    bus: SharedBus<B>,
    timeout: Option<Duration>,
    ready: bool,
}

impl<B: BusTransport> Tsl2561<B> {
    pub fn new(id: String, address: u8, bus: SharedBus<B>) -> Self {
        Self { id, address, bus, timeout: None, ready: false }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Constructs and powers up the sensor, returning once readings are valid.
    pub async fn open(id: String, address: u8, bus: SharedBus<B>) -> HalResult<Self> {
        let mut sensor = Self::new(id, address, bus);
        sensor.init().await?;
        Ok(sensor)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub async fn get_full_spectrum(&self) -> HalResult<u16> {
        Ok(self.channels().await?.0)
    }

    pub async fn get_infrared_spectrum(&self) -> HalResult<u16> {
        Ok(self.channels().await?.1)
    }

    pub async fn get_visible_spectrum(&self) -> HalResult<i32> {
        let (full, infrared) = self.channels().await?;
        Ok(visible(full, infrared))
    }

    /// Alias for the visible spectrum.
    pub async fn light(&self) -> HalResult<i32> {
        self.get_visible_spectrum().await
    }

    /// Reads (full spectrum, infrared) raw counts.
    async fn channels(&self) -> HalResult<(u16, u16)> {
        if !self.ready {
            return Err(HalError::NotInitialized { sensor: self.id.clone() });
        }

        let (data0, data1) = with_timeout(
            self.timeout,
            || format!("[{}] channel read", self.id),
            self.read_raw(),
        )
        .await
        .map_err(|e| {
            warn!("[{}] channel read failed: {}", self.id, e);
            e
        })?;

        let full = u16::from_le_bytes(data0);
        let infrared = u16::from_le_bytes(data1);
        debug!("[{}] full={} ir={}", self.id, full, infrared);
        Ok((full, infrared))
    }

    async fn read_raw(&self) -> HalResult<([u8; 2], [u8; 2])> {
        let mut bus = self.bus.lock().await;
        let mut data0 = [0u8; 2];
        bus.read_block(self.address, DATA0 | COMMAND_BIT, &mut data0).await?;
        let mut data1 = [0u8; 2];
        bus.read_block(self.address, DATA1 | COMMAND_BIT, &mut data1).await?;
        Ok((data0, data1))
    }

    async fn power_up(&self) -> HalResult<()> {
        let mut bus = self.bus.lock().await;
        bus.write_byte(self.address, CONTROL | COMMAND_BIT, POWER_ON).await?;
        bus.write_byte(self.address, TIMING | COMMAND_BIT, INTEGRATION_402MS).await
    }
}

/// Visible light counts; signed because the IR channel can exceed the
/// broadband one under saturation.
pub fn visible(full: u16, infrared: u16) -> i32 {
    full as i32 - infrared as i32
}

#[async_trait]
impl<B: BusTransport> SensorDriver for Tsl2561<B> {
    async fn init(&mut self) -> HalResult<()> {
        with_timeout(
            self.timeout,
            || format!("[{}] power-up", self.id),
            self.power_up(),
        )
        .await
        .map_err(|e| HalError::InitError {
            sensor: self.id.clone(),
            reason: e.to_string(),
        })?;

        tokio::time::sleep(SETTLE_DELAY).await;
        self.ready = true;
        info!("[{}] TSL2561 at {:#04x} powered up", self.id, self.address);
        Ok(())
    }

    async fn read(&self) -> HalResult<SensorDataFrame> {
        let (full, infrared) = self.channels().await?;
        Ok(SensorDataFrame {
            full_spectrum: Some(full),
            infrared: Some(infrared),
            visible: Some(visible(full, infrared)),
            ..Default::default()
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}
