use super::BusTransport;
use crate::errors::{HalError, HalResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    ReadByte { address: u8, reg: u8 },
    ReadWord { address: u8, reg: u8 },
    ReadBlock { address: u8, reg: u8, len: usize },
    WriteByte { address: u8, reg: u8, value: u8 },
}

/// In-memory bus answering from a scripted register map.
#[derive(Default)]
pub struct MockBus {
    registers: HashMap<(u8, u8), Vec<u8>>,
    absent: Vec<u8>,
    stalled: Vec<u8>,
    pub log: Vec<(Instant, BusOp)>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(mut self, address: u8, reg: u8, data: &[u8]) -> Self {
        self.registers.insert((address, reg), data.to_vec());
        self
    }

    pub fn set_register(&mut self, address: u8, reg: u8, data: &[u8]) {
        self.registers.insert((address, reg), data.to_vec());
    }

    /// Every transfer to `address` fails as if the device NACKed.
    pub fn without_device(mut self, address: u8) -> Self {
        self.absent.push(address);
        self
    }

    /// Every transfer to `address` hangs until the caller gives up.
    pub fn stalling(mut self, address: u8) -> Self {
        self.stalled.push(address);
        self
    }

    pub fn ops(&self) -> Vec<BusOp> {
        self.log.iter().map(|(_, op)| *op).collect()
    }

    async fn record(&mut self, op: BusOp) -> HalResult<()> {
        let address = match op {
            BusOp::ReadByte { address, .. }
            | BusOp::ReadWord { address, .. }
            | BusOp::ReadBlock { address, .. }
            | BusOp::WriteByte { address, .. } => address,
        };
        self.log.push((Instant::now(), op));
        if self.absent.contains(&address) {
            return Err(HalError::Bus { address, reason: "NACK".to_string() });
        }
        if self.stalled.contains(&address) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn data(&self, address: u8, reg: u8, len: usize) -> HalResult<Vec<u8>> {
        let data = self.registers.get(&(address, reg)).cloned().unwrap_or_default();
        if data.len() < len {
            return Err(HalError::Bus {
                address,
                reason: format!("register {:#04x} holds {} bytes, {} requested", reg, data.len(), len),
            });
        }
        Ok(data[..len].to_vec())
    }
}

#[async_trait]
impl BusTransport for MockBus {
    async fn read_byte(&mut self, address: u8, reg: u8) -> HalResult<u8> {
        self.record(BusOp::ReadByte { address, reg }).await?;
        Ok(self.data(address, reg, 1)?[0])
    }

    async fn read_word(&mut self, address: u8, reg: u8) -> HalResult<u16> {
        self.record(BusOp::ReadWord { address, reg }).await?;
        let data = self.data(address, reg, 2)?;
        Ok(u16::from_le_bytes([data[0], data[1]]))
    }

    async fn read_block(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> HalResult<()> {
        self.record(BusOp::ReadBlock { address, reg, len: buf.len() }).await?;
        buf.copy_from_slice(&self.data(address, reg, buf.len())?);
        Ok(())
    }

    async fn write_byte(&mut self, address: u8, reg: u8, value: u8) -> HalResult<()> {
        self.record(BusOp::WriteByte { address, reg, value }).await
    }
}
