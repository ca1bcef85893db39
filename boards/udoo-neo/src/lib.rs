/// Board-specific constants and configuration for the UDOO Neo
///
/// On-board peripherals:
/// - LM75 temperature sensor (0x48)
/// - TSL2561 light sensor (0x29)
/// - MPL3115A2 barometer / altimeter (0x60)
/// - 46 header GPIOs, 8 PWM outputs, 6 ADC inputs

/// Embedded TOML configuration
pub const BOARD_TOML: &str = include_str!("../config/board.toml");

/// Configuration file in the source tree, read at startup when present
pub const CONFIG_FILE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/board.toml");

use neo_hal::{load_board_config, BoardConfig, ConfigError};
use std::path::Path;

/// Board name
pub const BOARD_NAME: &str = "UDOO Neo";

/// Get the configuration path (allow override via CONFIG_PATH env var)
pub fn get_config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| CONFIG_FILE.to_string())
}

/// Loads `path`, falling back to the embedded configuration when the file
/// does not exist.
pub fn load_config_from(path: &str) -> Result<BoardConfig, ConfigError> {
    if Path::new(path).exists() {
        load_board_config(path)
    } else {
        tracing::info!("[{}] {} not found, using embedded configuration", BOARD_NAME, path);
        BoardConfig::from_toml_str(BOARD_TOML)
    }
}
