use super::BusTransport;
use crate::errors::{HalError, HalResult};
use async_trait::async_trait;

#[cfg(target_os = "linux")]
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use i2cdev::core::I2CDevice;
#[cfg(target_os = "linux")]
use i2cdev::linux::LinuxI2CDevice;

/// Linux `/dev/i2c-N` bus.
///
/// Each transfer runs on the blocking pool so a configured timeout can fire
/// even while the ioctl is stuck.
#[cfg(target_os = "linux")]
pub struct I2CBus {
    device: Arc<Mutex<LinuxI2CDevice>>,
    path: String,
}

#[cfg(not(target_os = "linux"))]
pub struct I2CBus {
    path: String,
}

impl I2CBus {
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(target_os = "linux")]
impl I2CBus {
    pub fn new(path: &str) -> HalResult<Self> {
        let device = LinuxI2CDevice::new(path, 0).map_err(|e| HalError::BusNotFound {
            bus: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            device: Arc::new(Mutex::new(device)),
            path: path.to_string(),
        })
    }

    /// Selects `address` and runs `op` against the device off the async runtime.
    async fn transfer<T, F>(&self, address: u8, op: F) -> HalResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut LinuxI2CDevice) -> Result<T, String> + Send + 'static,
    {
        let device = self.device.clone();
        tokio::task::spawn_blocking(move || {
            let mut device = device.lock().map_err(|_| "device lock poisoned".to_string())?;
            device
                .set_slave_address(address as u16)
                .map_err(|e| e.to_string())?;
            op(&mut *device)
        })
        .await
        .map_err(|e| HalError::Bus { address, reason: e.to_string() })?
        .map_err(|reason| HalError::Bus { address, reason })
    }
}

#[cfg(target_os = "linux")]
#[async_trait]
impl BusTransport for I2CBus {
    async fn read_byte(&mut self, address: u8, reg: u8) -> HalResult<u8> {
        self.transfer(address, move |dev| {
            dev.smbus_read_byte_data(reg).map_err(|e| e.to_string())
        })
        .await
    }

    async fn read_word(&mut self, address: u8, reg: u8) -> HalResult<u16> {
        self.transfer(address, move |dev| {
            dev.smbus_read_word_data(reg).map_err(|e| e.to_string())
        })
        .await
    }

    async fn read_block(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> HalResult<()> {
        let len = buf.len();
        if len == 0 || len > 32 {
            return Err(HalError::InvalidArgument {
                reason: format!("block read of {} bytes (SMBus allows 1..=32)", len),
            });
        }
        let data = self
            .transfer(address, move |dev| {
                dev.smbus_read_i2c_block_data(reg, len as u8)
                    .map_err(|e| e.to_string())
            })
            .await?;
        if data.len() != len {
            return Err(HalError::Bus {
                address,
                reason: format!("short block read: expected {} bytes, got {}", len, data.len()),
            });
        }
        buf.copy_from_slice(&data);
        Ok(())
    }

    async fn write_byte(&mut self, address: u8, reg: u8, value: u8) -> HalResult<()> {
        self.transfer(address, move |dev| {
            dev.smbus_write_byte_data(reg, value).map_err(|e| e.to_string())
        })
        .await
    }
}

#[cfg(not(target_os = "linux"))]
impl I2CBus {
    pub fn new(path: &str) -> HalResult<Self> {
        Err(HalError::BusNotFound {
            bus: path.to_string(),
            reason: "I2C is only supported on Linux".to_string(),
        })
    }
}

#[cfg(not(target_os = "linux"))]
#[async_trait]
impl BusTransport for I2CBus {
    async fn read_byte(&mut self, address: u8, _reg: u8) -> HalResult<u8> {
        Err(unsupported(address))
    }

    async fn read_word(&mut self, address: u8, _reg: u8) -> HalResult<u16> {
        Err(unsupported(address))
    }

    async fn read_block(&mut self, address: u8, _reg: u8, _buf: &mut [u8]) -> HalResult<()> {
        Err(unsupported(address))
    }

    async fn write_byte(&mut self, address: u8, _reg: u8, _value: u8) -> HalResult<()> {
        Err(unsupported(address))
    }
}

#[cfg(not(target_os = "linux"))]
fn unsupported(address: u8) -> HalError {
    HalError::Bus {
        address,
        reason: "I2C is only supported on Linux".to_string(),
    }
}
