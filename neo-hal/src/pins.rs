//! Static pin maps for the UDOO Neo headers.
//!
//! Logical pins are the numbers printed next to the board connectors; kernel
//! pins are the SoC GPIO numbers the sysfs interface expects.

use crate::errors::{HalError, HalResult};

pub type LogicalPin = u8;
pub type KernelPin = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Header {
    J4In,
    J6In,
    J4Out,
    J6Out,
    J5Out,
    J7Out,
}

const J4_IN: &[(LogicalPin, KernelPin)] = &[
    (0, 178), (1, 179), (2, 104), (3, 143), (4, 142), (5, 141), (6, 140), (7, 149),
];

const J6_IN: &[(LogicalPin, KernelPin)] = &[
    (8, 105), (9, 148), (10, 146), (11, 147), (12, 100), (13, 102),
];

const J4_OUT: &[(LogicalPin, KernelPin)] = &[
    (16, 106), (17, 107), (18, 180), (19, 181), (20, 172), (21, 173), (22, 182), (23, 24),
];

const J6_OUT: &[(LogicalPin, KernelPin)] = &[
    (24, 25), (25, 22), (26, 14), (27, 15), (28, 16),
    (29, 17), (30, 18), (31, 19), (32, 20), (33, 21),
];

const J5_OUT: &[(LogicalPin, KernelPin)] = &[
    (34, 203), (35, 202), (36, 177), (37, 176), (38, 175), (39, 174),
];

const J7_OUT: &[(LogicalPin, KernelPin)] = &[
    (40, 119), (41, 124), (42, 127), (43, 116), (44, 7), (45, 6), (46, 5), (47, 4),
];

const HEADERS: &[(Header, &[(LogicalPin, KernelPin)])] = &[
    (Header::J4In, J4_IN),
    (Header::J6In, J6_IN),
    (Header::J4Out, J4_OUT),
    (Header::J6Out, J6_OUT),
    (Header::J5Out, J5_OUT),
    (Header::J7Out, J7_OUT),
];

/// Union of the six header tables. Immutable and collision-free.
pub struct PinTable;

impl PinTable {
    /// Every (header, logical pin, kernel pin) record.
    pub fn entries() -> impl Iterator<Item = (Header, LogicalPin, KernelPin)> {
        HEADERS.iter().flat_map(|(header, table)| {
            table.iter().map(move |&(logical, kernel)| (*header, logical, kernel))
        })
    }

    pub fn lookup(pin: LogicalPin) -> Option<KernelPin> {
        Self::entries()
            .find(|&(_, logical, _)| logical == pin)
            .map(|(_, _, kernel)| kernel)
    }

    pub fn kernel_pin(pin: LogicalPin) -> HalResult<KernelPin> {
        Self::lookup(pin).ok_or(HalError::UnknownPin { kind: "GPIO", pin })
    }

    pub fn header_of(pin: LogicalPin) -> Option<Header> {
        Self::entries()
            .find(|&(_, logical, _)| logical == pin)
            .map(|(header, _, _)| header)
    }

    pub fn len() -> usize {
        HEADERS.iter().map(|(_, table)| table.len()).sum()
    }
}

/// A PWM output as (chip, channel) with chip in 0..=1 and channel in 0..=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PwmChannel {
    pub chip: u8,
    pub channel: u8,
}

impl PwmChannel {
    /// Number written to the PWM export/unexport files.
    pub fn export_index(&self) -> u32 {
        self.chip as u32 * 4 + self.channel as u32
    }
}

const fn pwm(chip: u8, channel: u8) -> PwmChannel {
    PwmChannel { chip, channel }
}

// PWM1..PWM8 in board order
const PWM_PINS: &[(LogicalPin, PwmChannel)] = &[
    (3, pwm(0, 0)),
    (4, pwm(0, 1)),
    (5, pwm(0, 2)),
    (6, pwm(0, 3)),
    (7, pwm(1, 0)),
    (9, pwm(1, 1)),
    (11, pwm(1, 2)),
    (10, pwm(1, 3)),
];

pub struct PwmTable;

impl PwmTable {
    pub fn entries() -> impl Iterator<Item = (LogicalPin, PwmChannel)> {
        PWM_PINS.iter().copied()
    }

    pub fn lookup(pin: LogicalPin) -> Option<PwmChannel> {
        PWM_PINS
            .iter()
            .find(|&&(logical, _)| logical == pin)
            .map(|&(_, channel)| channel)
    }

    pub fn channel(pin: LogicalPin) -> HalResult<PwmChannel> {
        Self::lookup(pin).ok_or(HalError::UnknownPin { kind: "PWM", pin })
    }
}
