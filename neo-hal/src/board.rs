use crate::adc::AnalogReader;
use crate::bus::{share, BusTransport, SharedBus};
use crate::config::BoardConfig;
use crate::errors::{HalError, HalResult};
use crate::gpio::PinController;
use crate::pins::{LogicalPin, PinTable, PwmTable};
use crate::pwm::PwmController;
use crate::sensors::{Lm75, MotionKind, MotionSensor, Mpl3115a2, SensorDriver, Tsl2561};
use crate::sysfs::{Sysfs, SysfsIo};
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "linux-hal")]
use crate::bus::I2CBus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Gpio,
    Pwm,
}

/// Every on-board peripheral, built from one `BoardConfig`.
///
/// The three bus sensors share a single bus connection.
pub struct Board<B> {
    pub temperature: Lm75<B>,
    pub light: Tsl2561<B>,
    pub barometric: Mpl3115a2<B>,
    pub gpio: PinController,
    pub pwm: PwmController,
    pub analog: AnalogReader,
    pub accelerometer: MotionSensor,
    pub magnetometer: MotionSensor,
    pub gyroscope: MotionSensor,
}

#[cfg(feature = "linux-hal")]
impl Board<I2CBus> {
    /// Opens the configured I2C bus and brings up every sensor on it.
    pub async fn open(config: &BoardConfig) -> HalResult<Self> {
        let bus = I2CBus::new(&config.bus.path)?;
        info!("[board] opened I2C bus {}", bus.path());
        Self::with_bus(config, share(bus)).await
    }
}

impl<B: BusTransport> Board<B> {
    /// Builds the board on an already open bus. Returns after the light
    /// sensor's settle delay.
    pub async fn with_bus(config: &BoardConfig, bus: SharedBus<B>) -> HalResult<Self> {
        let timeout = config.timeout();
        let io: Arc<dyn SysfsIo> = Arc::new(Sysfs::new(timeout));
        let addresses = &config.sensors;

        let mut board = Self {
            temperature: Lm75::new("temperature".to_string(), addresses.temperature_address, bus.clone())
                .with_timeout(timeout),
            light: Tsl2561::new("light".to_string(), addresses.light_address, bus.clone())
                .with_timeout(timeout),
            barometric: Mpl3115a2::new("barometric".to_string(), addresses.barometric_address, bus)
                .with_timeout(timeout),
            gpio: PinController::new(&config.gpio.base_path, io.clone()),
            pwm: PwmController::new(&config.pwm.base_path, io.clone()),
            analog: AnalogReader::new(&config.adc.base_path, config.adc.burst_size, io),
            accelerometer: MotionSensor::new("accelerometer".to_string(), MotionKind::Accelerometer),
            magnetometer: MotionSensor::new("magnetometer".to_string(), MotionKind::Magnetometer),
            gyroscope: MotionSensor::new("gyroscope".to_string(), MotionKind::Gyroscope),
        };

        board.temperature.init().await?;
        board.light.init().await?;
        board.barometric.init().await?;
        info!("[board] initialized");
        Ok(board)
    }

    /// The bus sensors, for callers that poll them uniformly.
    pub fn sensors(&self) -> [&dyn SensorDriver; 3] {
        [&self.temperature, &self.light, &self.barometric]
    }

    /// Exports `pin` through the GPIO or PWM interface.
    pub async fn export(&self, pin: LogicalPin, mode: PinMode) -> HalResult<()> {
        match mode {
            PinMode::Gpio => self.gpio.export(pin).await,
            PinMode::Pwm => self.pwm.export(pin).await,
        }
    }

    /// Releases `pin` from every interface that knows it.
    ///
    /// Both releases are attempted; the first failure is returned.
    pub async fn unexport(&self, pin: LogicalPin) -> HalResult<()> {
        let gpio = match PinTable::lookup(pin) {
            Some(_) => Some(self.gpio.unexport(pin).await),
            None => None,
        };
        let pwm = match PwmTable::lookup(pin) {
            Some(_) => Some(self.pwm.unexport(pin).await),
            None => None,
        };
        match (gpio, pwm) {
            (None, None) => Err(HalError::UnknownPin { kind: "GPIO/PWM", pin }),
            (gpio, pwm) => {
                gpio.unwrap_or(Ok(()))?;
                pwm.unwrap_or(Ok(()))
            }
        }
    }
}
