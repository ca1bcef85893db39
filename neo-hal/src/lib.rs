// Public modules
pub mod adc;
pub mod board;
pub mod bus;
pub mod config;
pub mod errors;
pub mod gpio;
pub mod pins;
pub mod pwm;
pub mod sensors;
pub mod sysfs;

mod timeout;

// Re-export commonly used types
pub use adc::{AdcChannel, AnalogReader};
pub use board::{Board, PinMode};
pub use bus::{BusTransport, SharedBus};
pub use config::{load_board_config, BoardConfig};
pub use errors::{ConfigError, HalError, HalResult};
pub use gpio::{BatchReport, Direction, Level, PinController};
pub use pins::{Header, KernelPin, LogicalPin, PinTable, PwmChannel, PwmTable};
pub use pwm::{PwmController, PwmSettings};
pub use sensors::{SensorDataFrame, SensorDriver};

#[cfg(feature = "linux-hal")]
pub use bus::I2CBus;

use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}
