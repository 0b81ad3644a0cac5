//! MAX31865 RTD-to-digital converter over `embedded-hal` 1.0 SPI.
//!
//! Runs the converter in one-shot mode: the bias is switched on only for
//! the duration of a conversion to limit self-heating of the probe.
//!
//! # Timing
//!
//! A read takes about 75 ms: 10 ms bias settle plus a 65 ms conversion
//! (60 Hz filter, the 50 Hz filter needs marginally less).
//!
//! # Example
//!
//! ```ignore
//! use rs_roaster::config::{MainsFilter, RtdWires};
//! use rs_roaster::hal::Max31865;
//! use rs_roaster::traits::RtdSensor;
//!
//! let mut rtd = Max31865::new(spi_device, delay, RtdWires::Three, MainsFilter::Hz60)?;
//! let code = rtd.read_rtd()?;
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Operation, SpiDevice};

use crate::config::{MainsFilter, RtdWires};
use crate::traits::{RtdFault, RtdSensor};

/// Register addresses. Writes set bit 7.
mod reg {
    pub const CONFIG: u8 = 0x00;
    pub const RTD_MSB: u8 = 0x01;
    pub const HIGH_FAULT_MSB: u8 = 0x03;
    pub const LOW_FAULT_MSB: u8 = 0x05;
    pub const FAULT_STATUS: u8 = 0x07;
    pub const WRITE: u8 = 0x80;
}

/// Configuration register bits.
mod cfg {
    pub const BIAS: u8 = 0x80;
    pub const ONE_SHOT: u8 = 0x20;
    pub const THREE_WIRE: u8 = 0x10;
    /// Fault detection cycle control bits, written as 0 when clearing.
    pub const FAULT_CYCLE: u8 = 0x0C;
    pub const FAULT_CLEAR: u8 = 0x02;
    pub const FILTER_50HZ: u8 = 0x01;
}

const BIAS_SETTLE_MS: u32 = 10;
const CONVERSION_MS: u32 = 65;

/// MAX31865 driver.
///
/// `SPI` must be configured for mode 1 or 3, at most 5 MHz.
pub struct Max31865<SPI, D> {
    spi: SPI,
    delay: D,
}

impl<SPI, D> Max31865<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Configures wiring and filter, opens the fault thresholds to the full
    /// code range, and clears any latched fault.
    pub fn new(
        spi: SPI,
        delay: D,
        wires: RtdWires,
        filter: MainsFilter,
    ) -> Result<Self, SPI::Error> {
        let mut rtd = Self { spi, delay };

        let mut config = 0;
        if wires == RtdWires::Three {
            config |= cfg::THREE_WIRE;
        }
        if filter == MainsFilter::Hz50 {
            config |= cfg::FILTER_50HZ;
        }
        rtd.write_register(reg::CONFIG, config)?;
        rtd.write_thresholds(0x0000, 0xFFFF)?;
        rtd.clear_fault()?;

        tracing::trace!(?wires, ?filter, "max31865 configured");
        Ok(rtd)
    }

    /// Sets the low/high fault thresholds (15-bit codes, left-aligned on the wire).
    pub fn write_thresholds(&mut self, low: u16, high: u16) -> Result<(), SPI::Error> {
        let [low_msb, low_lsb] = low.to_be_bytes();
        let [high_msb, high_lsb] = high.to_be_bytes();
        self.spi.write(&[reg::LOW_FAULT_MSB | reg::WRITE, low_msb, low_lsb])?;
        self.spi.write(&[reg::HIGH_FAULT_MSB | reg::WRITE, high_msb, high_lsb])
    }

    /// Releases the SPI device and delay.
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    fn set_bias(&mut self, on: bool) -> Result<(), SPI::Error> {
        let mut config = self.read_register(reg::CONFIG)?;
        if on {
            config |= cfg::BIAS;
        } else {
            config &= !cfg::BIAS;
        }
        self.write_register(reg::CONFIG, config)
    }

    fn read_register(&mut self, addr: u8) -> Result<u8, SPI::Error> {
        let mut buf = [0u8; 1];
        self.spi.transaction(&mut [
            Operation::Write(&[addr & !reg::WRITE]),
            Operation::Read(&mut buf),
        ])?;
        Ok(buf[0])
    }

    fn read_register16(&mut self, addr: u8) -> Result<u16, SPI::Error> {
        let mut buf = [0u8; 2];
        self.spi.transaction(&mut [
            Operation::Write(&[addr & !reg::WRITE]),
            Operation::Read(&mut buf),
        ])?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), SPI::Error> {
        self.spi.write(&[addr | reg::WRITE, value])
    }
}

impl<SPI, D> RtdSensor for Max31865<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    type Error = SPI::Error;

    fn read_rtd(&mut self) -> Result<u16, Self::Error> {
        self.clear_fault()?;
        self.set_bias(true)?;
        self.delay.delay_ms(BIAS_SETTLE_MS);

        let config = self.read_register(reg::CONFIG)?;
        self.write_register(reg::CONFIG, config | cfg::ONE_SHOT)?;
        self.delay.delay_ms(CONVERSION_MS);

        let raw = self.read_register16(reg::RTD_MSB);
        // Bias off even when the read failed
        let bias = self.set_bias(false);
        let raw = raw?;
        bias?;

        // Bit 0 is the fault flag, reported through `read_fault`
        Ok(raw >> 1)
    }

    fn read_fault(&mut self) -> Result<RtdFault, Self::Error> {
        self.read_register(reg::FAULT_STATUS).map(RtdFault::from_bits)
    }

    fn clear_fault(&mut self) -> Result<(), Self::Error> {
        let mut config = self.read_register(reg::CONFIG)?;
        config &= !(cfg::ONE_SHOT | cfg::FAULT_CYCLE);
        config |= cfg::FAULT_CLEAR;
        self.write_register(reg::CONFIG, config)
    }
}
