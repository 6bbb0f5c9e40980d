//! Register map and register access for the VEML7700.
use embedded_hal::i2c::I2c;
use num_enum::IntoPrimitive;

/// The default I2C address of the device.
pub const DEFAULT_ADDR: u8 = 0x10;

/// The 16-bit command registers of the device.
#[derive(IntoPrimitive)]
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Register {
    AlsConf0 = 0x00,
    AlsHighThreshold = 0x01,
    AlsLowThreshold = 0x02,
    PowerSaving = 0x03,
    Als = 0x04,
    White = 0x05,
    AlsInt = 0x06,
}

/// A bit field within a 16-bit register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Field {
    pub register: Register,
    pub offset: u8,
    pub width: u8,
}

impl Field {
    const fn new(register: Register, offset: u8, width: u8) -> Self {
        Self {
            register,
            offset,
            width,
        }
    }

    fn mask(self) -> u16 {
        (((1u32 << self.width) - 1) as u16) << self.offset
    }
}

/// ALS shutdown, set to power the sensor down.
pub const SHUTDOWN: Field = Field::new(Register::AlsConf0, 0, 1);
/// Threshold interrupt enable.
pub const INTERRUPT_ENABLE: Field = Field::new(Register::AlsConf0, 1, 1);
/// Integration time code, see [`crate::IntegrationTime`].
pub const INTEGRATION_TIME: Field = Field::new(Register::AlsConf0, 6, 4);
/// Gain code, see [`crate::Gain`].
pub const GAIN: Field = Field::new(Register::AlsConf0, 11, 2);
/// Power saving enable.
pub const POWER_SAVING_ENABLE: Field = Field::new(Register::PowerSaving, 0, 1);
/// Power saving mode code, see [`crate::PowerSavingMode`].
pub const POWER_SAVING_MODE: Field = Field::new(Register::PowerSaving, 1, 2);
/// High threshold exceeded. Cleared when the register is read.
pub const INTERRUPT_HIGH: Field = Field::new(Register::AlsInt, 14, 1);
/// Low threshold exceeded. Cleared when the register is read.
pub const INTERRUPT_LOW: Field = Field::new(Register::AlsInt, 15, 1);

/// Access to the device's 16-bit registers.
///
/// Implementors only provide whole-register transfers. Bit fields are handled with a
/// read-modify-write on top of them.
pub trait RegisterInterface {
    type Error;

    /// Read a whole register.
    fn read_u16(&mut self, register: Register) -> Result<u16, Self::Error>;

    /// Write a whole register.
    fn write_u16(&mut self, register: Register, value: u16) -> Result<(), Self::Error>;

    /// Read a bit field, shifted down to bit 0.
    fn read_bits(&mut self, field: Field) -> Result<u16, Self::Error> {
        let value = self.read_u16(field.register)?;
        Ok((value & field.mask()) >> field.offset)
    }

    /// Replace a bit field, leaving the rest of the register untouched.
    ///
    /// # Note
    /// Bits of `bits` beyond the field width are discarded.
    fn write_bits(&mut self, field: Field, bits: u16) -> Result<(), Self::Error> {
        let value = self.read_u16(field.register)?;
        let value = (value & !field.mask()) | ((bits << field.offset) & field.mask());
        self.write_u16(field.register, value)
    }
}

/// A [`RegisterInterface`] over an I2C bus. Registers are transferred LSB first.
#[derive(Clone, Debug)]
pub struct I2cInterface<T> {
    addr: u8,
    device: T,
}

impl<T> I2cInterface<T> {
    /// Use the device on [`DEFAULT_ADDR`].
    pub fn new(device: T) -> Self {
        Self::with_address(device, DEFAULT_ADDR)
    }

    /// Use the device on a non-default address.
    pub fn with_address(device: T, addr: u8) -> Self {
        Self { addr, device }
    }

    /// Release the underlying bus.
    pub fn release(self) -> T {
        self.device
    }
}

impl<T> RegisterInterface for I2cInterface<T>
where
    T: I2c,
{
    type Error = T::Error;

    fn read_u16(&mut self, register: Register) -> Result<u16, Self::Error> {
        let mut bytes = [0u8; 2];
        self.device
            .write_read(self.addr, &[register.into()], &mut bytes[..])?;
        Ok(u16::from_le_bytes(bytes))
    }

    fn write_u16(&mut self, register: Register, value: u16) -> Result<(), Self::Error> {
        let [lsb, msb] = value.to_le_bytes();
        self.device.write(self.addr, &[register.into(), lsb, msb])
    }
}
