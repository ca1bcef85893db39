use crate::errors::{ConfigError, ConfigResult};
use crate::sensors::{lm75, mpl3115a2, tsl2561};
use crate::{adc, gpio, pwm};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Root board configuration. Every field has a default matching the board.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Upper bound for each bus transaction or sysfs access; unbounded when absent
    pub timeout_ms: Option<u64>,
    pub bus: BusSection,
    pub sensors: SensorSection,
    pub gpio: GpioSection,
    pub pwm: PwmSection,
    pub adc: AdcSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusSection {
    pub path: String,
}

impl Default for BusSection {
    fn default() -> Self {
        Self { path: "/dev/i2c-1".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorSection {
    pub temperature_address: u8,
    pub light_address: u8,
    pub barometric_address: u8,
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            temperature_address: lm75::DEFAULT_ADDRESS,
            light_address: tsl2561::DEFAULT_ADDRESS,
            barometric_address: mpl3115a2::DEFAULT_ADDRESS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GpioSection {
    pub base_path: PathBuf,
}

impl Default for GpioSection {
    fn default() -> Self {
        Self { base_path: PathBuf::from(gpio::DEFAULT_BASE_PATH) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PwmSection {
    pub base_path: PathBuf,
}

impl Default for PwmSection {
    fn default() -> Self {
        Self { base_path: PathBuf::from(pwm::DEFAULT_BASE_PATH) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdcSection {
    pub base_path: PathBuf,
    pub burst_size: usize,
}

impl Default for AdcSection {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(adc::HOST_BASE_PATH),
            burst_size: adc::DEFAULT_BURST_SIZE,
        }
    }
}

impl BoardConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let parsed: BoardConfig = toml::from_str(content)?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> ConfigResult<()> {
        let addresses = [
            ("sensors.temperature_address", self.sensors.temperature_address),
            ("sensors.light_address", self.sensors.light_address),
            ("sensors.barometric_address", self.sensors.barometric_address),
        ];
        for (field, address) in addresses {
            if address > 0x7F {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("{:#04x} is not a 7-bit address", address),
                });
            }
        }
        if self.adc.burst_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "adc.burst_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms".to_string(),
                reason: "must be positive; omit it to block indefinitely".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads board config from a TOML file
pub fn load_board_config(path: &str) -> ConfigResult<BoardConfig> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })?;
    BoardConfig::from_toml_str(&content)
}
