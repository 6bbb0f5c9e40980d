//! A platform agnostic Rust driver for the Vishay VEML7700 ambient light sensor based on the
//! [`embedded-hal`](https://github.com/rust-embedded/embedded-hal) traits.
//!
//! ## Overview
//!
//! The VEML7700 is a high accuracy ambient light sensor with a 16-bit dynamic range, a white
//! channel, programmable gain and integration time, threshold interrupts and a power saving mode.
//!
//! * [Datasheet](https://www.vishay.com/docs/84286/veml7700.pdf)
//!
//! ## Usage
//!
//! ### Creation
//!
//! The driver needs a bus, a delay provider and a monotonic clock. Any
//! `FnMut() -> core::time::Duration` closure can serve as the clock:
//! ```no_run
//! use linux_embedded_hal as hal;
//!
//! use hal::{Delay, I2cdev};
//! use veml7700::Veml7700;
//!
//! # fn main() {
//! let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! let start = std::time::Instant::now();
//! let mut veml7700 = Veml7700::new(dev, Delay, move || start.elapsed()).unwrap();
//! # }
//! ```
//!
//! ### Measurement
//! [`Veml7700::lux`] converts the latest ALS count with the current settings. [`Veml7700::autolux`]
//! adjusts gain and integration time until the count is usable and corrects for the sensor's
//! non-linearity in bright light.
//!
//!```no_run
//! use linux_embedded_hal as hal;
//!
//! use hal::{Delay, I2cdev};
//! use veml7700::Veml7700;
//!
//! # fn main() {
//! # let dev = I2cdev::new("/dev/i2c-1").unwrap();
//! # let start = std::time::Instant::now();
//! # let mut veml7700 = Veml7700::new(dev, Delay, move || start.elapsed()).unwrap();
//! loop {
//!     let lux = veml7700.autolux().unwrap();
//!     println!("Ambient light: {lux:.2} lx");
//!
//!     veml7700.wait_autolux(1.0);
//! }
//! # }
//! ```
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod interface;
pub mod settings;

use core::time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

pub use interface::{I2cInterface, Register, RegisterInterface, DEFAULT_ADDR};
pub use settings::{Gain, IntegrationTime, InterruptStatus, PowerSavingMode};

use interface::{
    GAIN, INTEGRATION_TIME, INTERRUPT_ENABLE, INTERRUPT_HIGH, INTERRUPT_LOW, POWER_SAVING_ENABLE,
    POWER_SAVING_MODE, SHUTDOWN,
};

/// Lux per count at gain x2 and 800ms integration time.
const RESOLUTION_AT_MAX: f32 = 0.0042;

/// Attempts made to enable the sensor during construction.
const ENABLE_ATTEMPTS: usize = 3;

/// Longest single call made to the delay provider.
const MAX_DELAY_CHUNK: Duration = Duration::from_secs(1);

/// `autolux` raises sensitivity while the count is at or below this value.
const AUTOLUX_LOW_COUNT: u16 = 100;

/// `autolux` lowers the integration time while the count is above this value.
const AUTOLUX_HIGH_COUNT: u16 = 10_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<T> {
    /// An error with the usage of the register interface occurred.
    Interface(T),

    /// The sensor could not be enabled during construction. Contains the last interface error.
    EnableFailed(T),

    /// The device reported an integration time code that is not documented.
    UnknownIntegrationTime(u8),
}

impl<T> From<T> for Error<T> {
    fn from(e: T) -> Self {
        Self::Interface(e)
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed epoch.
    fn now(&mut self) -> Duration;
}

impl<F> Clock for F
where
    F: FnMut() -> Duration,
{
    fn now(&mut self) -> Duration {
        self()
    }
}

/// Settings latched in the device, and the time of the last guarded ALS read.
#[derive(Debug, Copy, Clone, PartialEq)]
struct SensorState {
    gain: Gain,
    integration_time: IntegrationTime,
    last_read: Duration,
}

/// A VEML7700 on a register interface `R`, using delay `D` and monotonic clock `C` to pace ALS
/// reads.
pub struct Veml7700<R, D, C> {
    interface: R,
    delay: D,
    clock: C,
    state: SensorState,
}

impl<T, D, C> Veml7700<I2cInterface<T>, D, C>
where
    T: I2c,
    D: DelayNs,
    C: Clock,
{
    /// Construct the driver on the default I2C address, set the lowest gain and enable the sensor.
    pub fn new(device: T, delay: D, clock: C) -> Result<Self, Error<T::Error>> {
        Self::with_interface(I2cInterface::new(device), delay, clock)
    }
}

impl<R, D, C> Veml7700<R, D, C>
where
    R: RegisterInterface,
    D: DelayNs,
    C: Clock,
{
    /// Construct the driver on an arbitrary register interface, set the lowest gain and enable the
    /// sensor.
    ///
    /// # Note
    /// Enabling is attempted up to three times. Only interface errors are retried.
    pub fn with_interface(
        mut interface: R,
        delay: D,
        mut clock: C,
    ) -> Result<Self, Error<R::Error>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::enable(&mut interface) {
                Ok(()) => break,
                Err(Error::Interface(e)) if attempt >= ENABLE_ATTEMPTS => {
                    warn!("enable failed after {} attempts", attempt);
                    return Err(Error::EnableFailed(e));
                }
                Err(Error::Interface(_)) => {
                    debug!("enable attempt {} failed, retrying", attempt);
                }
                Err(e) => return Err(e),
            }
        }

        let integration_time = read_integration_time(&mut interface)?;
        let last_read = clock.now();

        Ok(Self {
            interface,
            delay,
            clock,
            state: SensorState {
                gain: Gain::OneEighth,
                integration_time,
                last_read,
            },
        })
    }

    fn enable(interface: &mut R) -> Result<(), Error<R::Error>> {
        interface.write_bits(GAIN, u8::from(Gain::OneEighth).into())?;
        interface.write_bits(SHUTDOWN, 0)?;
        Ok(())
    }

    /// Destroy the driver and return the register interface, delay and clock.
    pub fn destroy(self) -> (R, D, C) {
        (self.interface, self.delay, self.clock)
    }

    /// The current gain setting.
    pub fn gain(&self) -> Gain {
        self.state.gain
    }

    /// Program the gain.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<R::Error>> {
        self.interface.write_bits(GAIN, u8::from(gain).into())?;
        self.state.gain = gain;
        Ok(())
    }

    /// The current integration time setting.
    pub fn integration_time(&self) -> IntegrationTime {
        self.state.integration_time
    }

    /// Program the integration time.
    ///
    /// # Note
    /// Guarded reads wait twice the integration time between conversions.
    pub fn set_integration_time(
        &mut self,
        integration_time: IntegrationTime,
    ) -> Result<(), Error<R::Error>> {
        self.interface
            .write_bits(INTEGRATION_TIME, u8::from(integration_time).into())?;
        self.state.integration_time = integration_time;
        Ok(())
    }

    /// Check whether the ALS is shut down.
    pub fn is_shutdown(&mut self) -> Result<bool, Error<R::Error>> {
        Ok(self.interface.read_bits(SHUTDOWN)? != 0)
    }

    /// Shut down (`true`) or enable (`false`) the ALS.
    pub fn set_shutdown(&mut self, shutdown: bool) -> Result<(), Error<R::Error>> {
        self.interface.write_bits(SHUTDOWN, shutdown.into())?;
        Ok(())
    }

    /// Check whether the threshold interrupt is enabled.
    pub fn interrupt_enabled(&mut self) -> Result<bool, Error<R::Error>> {
        Ok(self.interface.read_bits(INTERRUPT_ENABLE)? != 0)
    }

    /// Enable or disable the threshold interrupt.
    pub fn set_interrupt_enabled(&mut self, enabled: bool) -> Result<(), Error<R::Error>> {
        self.interface.write_bits(INTERRUPT_ENABLE, enabled.into())?;
        Ok(())
    }

    /// The ALS count above which the high threshold interrupt fires.
    pub fn high_threshold(&mut self) -> Result<u16, Error<R::Error>> {
        Ok(self.interface.read_u16(Register::AlsHighThreshold)?)
    }

    /// Set the high threshold, in raw ALS counts.
    pub fn set_high_threshold(&mut self, threshold: u16) -> Result<(), Error<R::Error>> {
        self.interface
            .write_u16(Register::AlsHighThreshold, threshold)?;
        Ok(())
    }

    /// The ALS count below which the low threshold interrupt fires.
    pub fn low_threshold(&mut self) -> Result<u16, Error<R::Error>> {
        Ok(self.interface.read_u16(Register::AlsLowThreshold)?)
    }

    /// Set the low threshold, in raw ALS counts.
    pub fn set_low_threshold(&mut self, threshold: u16) -> Result<(), Error<R::Error>> {
        self.interface
            .write_u16(Register::AlsLowThreshold, threshold)?;
        Ok(())
    }

    /// Read the threshold interrupt flags.
    ///
    /// # Note
    /// The device clears the flags when the status register is read.
    pub fn interrupt_status(&mut self) -> Result<InterruptStatus, Error<R::Error>> {
        let status = self.interface.read_u16(Register::AlsInt)?;
        Ok(InterruptStatus {
            high: status & (1 << INTERRUPT_HIGH.offset) != 0,
            low: status & (1 << INTERRUPT_LOW.offset) != 0,
        })
    }

    /// Check whether power saving mode is enabled.
    pub fn power_saving_enabled(&mut self) -> Result<bool, Error<R::Error>> {
        Ok(self.interface.read_bits(POWER_SAVING_ENABLE)? != 0)
    }

    /// Enable or disable power saving mode.
    pub fn set_power_saving_enabled(&mut self, enabled: bool) -> Result<(), Error<R::Error>> {
        self.interface
            .write_bits(POWER_SAVING_ENABLE, enabled.into())?;
        Ok(())
    }

    /// The configured power saving mode.
    pub fn power_saving_mode(&mut self) -> Result<PowerSavingMode, Error<R::Error>> {
        let code = self.interface.read_bits(POWER_SAVING_MODE)? as u8;
        // The field is two bits wide and every code is a valid mode.
        Ok(PowerSavingMode::try_from(code).unwrap_or(PowerSavingMode::Mode1))
    }

    /// Select the power saving mode. It only takes effect while power saving is enabled.
    pub fn set_power_saving_mode(&mut self, mode: PowerSavingMode) -> Result<(), Error<R::Error>> {
        self.interface
            .write_bits(POWER_SAVING_MODE, u8::from(mode).into())?;
        Ok(())
    }

    /// Read the raw ALS count without waiting for a fresh conversion.
    pub fn read_raw_light(&mut self) -> Result<u16, Error<R::Error>> {
        Ok(self.interface.read_u16(Register::Als)?)
    }

    /// Read the raw white channel count.
    pub fn read_raw_white(&mut self) -> Result<u16, Error<R::Error>> {
        Ok(self.interface.read_u16(Register::White)?)
    }

    /// Lux represented by one ALS count at the current gain and integration time.
    pub fn resolution(&self) -> f32 {
        let gain = self.state.gain;
        let integration_time = self.state.integration_time;
        if gain == Gain::Two && integration_time == IntegrationTime::Ms800 {
            return RESOLUTION_AT_MAX;
        }

        RESOLUTION_AT_MAX
            * (800.0 / integration_time.millis() as f32)
            * (Gain::Two.value() / gain.value())
    }

    /// Convert a raw count to lux at the current settings.
    ///
    /// # Note
    /// The correction compensates the sensor's non-linearity in bright light. It is only
    /// meaningful at low gain or short integration times.
    pub fn compute_lux(&self, raw: u16, use_correction: bool) -> f32 {
        let lux = self.resolution() * raw as f32;
        if use_correction {
            (((6.0135e-13 * lux - 9.3924e-9) * lux + 8.1488e-5) * lux + 1.0023) * lux
        } else {
            lux
        }
    }

    /// Measure the ambient light level in lux at the current settings, without correction.
    pub fn lux(&mut self) -> Result<f32, Error<R::Error>> {
        let light = self.read_raw_light()?;
        Ok(self.compute_lux(light, false))
    }

    /// Measure the white channel level in lux at the current settings.
    pub fn white_lux(&mut self) -> Result<f32, Error<R::Error>> {
        let white = self.read_raw_white()?;
        Ok(self.compute_lux(white, false))
    }

    /// Read the ALS count, first blocking until two integration periods have passed since the
    /// previous guarded read.
    pub fn read_als_wait(&mut self) -> Result<u16, Error<R::Error>> {
        let min_spacing =
            Duration::from_millis(2 * u64::from(self.state.integration_time.millis()));
        let elapsed = self.clock.now().saturating_sub(self.state.last_read);
        if elapsed < min_spacing {
            let remaining = min_spacing - elapsed;
            trace!("waiting {} ns for a fresh ALS conversion", remaining.as_nanos());
            self.block_for(remaining);
        }

        self.state.last_read = self.clock.now();
        self.read_raw_light()
    }

    /// Block for the requested time in seconds, but never shorter than the integration time.
    ///
    /// # Note
    /// Negative and NaN requests count as zero. Requests too large for a `Duration` block for
    /// `Duration::MAX`.
    pub fn wait_autolux(&mut self, requested_secs: f32) {
        let requested = if requested_secs > 0.0 {
            Duration::try_from_secs_f32(requested_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        let integration =
            Duration::from_millis(u64::from(self.state.integration_time.millis()));
        self.block_for(requested.max(integration));
    }

    /// Block on the delay provider for the full duration, in chunks that fit its `u32` arguments.
    fn block_for(&mut self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() {
            let chunk = remaining.min(MAX_DELAY_CHUNK);
            self.delay.delay_ns(chunk.as_nanos() as u32);
            remaining -= chunk;
        }
    }

    /// Measure the ambient light level in lux, adjusting gain and integration time to keep the raw
    /// count inside a usable range.
    ///
    /// # Note
    /// Starts at the lowest gain and 100ms. Dim readings raise the gain and then the integration
    /// time until the count exceeds 100 or both are at their maximum. Bright readings shorten the
    /// integration time until the count is at most 10000 or it is at its minimum, and are
    /// corrected for non-linearity.
    pub fn autolux(&mut self) -> Result<f32, Error<R::Error>> {
        let last_gain = Gain::ASCENDING.len() - 1;
        let last_it = IntegrationTime::ASCENDING.len() - 1;

        let mut gain_index = 0;
        let mut it_index = 2;
        let mut use_correction = false;

        self.set_gain(Gain::ASCENDING[gain_index])?;
        self.set_integration_time(IntegrationTime::ASCENDING[it_index])?;

        let mut als = self.read_als_wait()?;
        debug!("autolux: initial count {}", als);

        if als <= AUTOLUX_LOW_COUNT {
            while als <= AUTOLUX_LOW_COUNT && !(gain_index == last_gain && it_index == last_it) {
                if gain_index < last_gain {
                    gain_index += 1;
                    self.set_gain(Gain::ASCENDING[gain_index])?;
                } else if it_index < last_it {
                    it_index += 1;
                    self.set_integration_time(IntegrationTime::ASCENDING[it_index])?;
                }

                als = self.read_als_wait()?;
                debug!(
                    "autolux: raised to {:?} {:?}, count {}",
                    self.state.gain,
                    self.state.integration_time,
                    als
                );
            }
        } else {
            use_correction = true;
            while als > AUTOLUX_HIGH_COUNT && it_index > 0 {
                it_index -= 1;
                self.set_integration_time(IntegrationTime::ASCENDING[it_index])?;

                als = self.read_als_wait()?;
                debug!(
                    "autolux: lowered to {:?}, count {}",
                    self.state.integration_time,
                    als
                );
            }
        }

        Ok(self.compute_lux(als, use_correction))
    }
}

fn read_integration_time<R: RegisterInterface>(
    interface: &mut R,
) -> Result<IntegrationTime, Error<R::Error>> {
    let code = interface.read_bits(INTEGRATION_TIME)? as u8;
    IntegrationTime::try_from(code).map_err(|_| Error::UnknownIntegrationTime(code))
}
