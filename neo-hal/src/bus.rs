#[cfg(feature = "linux-hal")]
pub mod i2c;

#[cfg(test)]
pub(crate) mod mock;

use crate::errors::HalResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "linux-hal")]
pub use i2c::I2CBus;

/// Sequential two-wire register access, addressed per call.
///
/// Implementations perform no retries and do not interpret register contents;
/// every failure is surfaced to the caller as-is.
#[async_trait]
pub trait BusTransport: Send {
    async fn read_byte(&mut self, address: u8, reg: u8) -> HalResult<u8>;

    /// SMBus word read; the low byte on the wire lands in the low byte of the result.
    async fn read_word(&mut self, address: u8, reg: u8) -> HalResult<u16>;

    /// Fills `buf` from consecutive registers starting at `reg`.
    async fn read_block(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> HalResult<()>;

    async fn write_byte(&mut self, address: u8, reg: u8, value: u8) -> HalResult<()>;
}

/// A bus connection shared by every driver on it.
///
/// Drivers hold the lock for a whole transaction, so configure/sleep/read
/// sequences from different drivers never interleave.
pub type SharedBus<B> = Arc<Mutex<B>>;

pub fn share<B: BusTransport>(bus: B) -> SharedBus<B> {
    Arc::new(Mutex::new(bus))
}
