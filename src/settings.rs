//! Measurement settings of the VEML7700 and their register encodings.
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Ambient light gain.
#[derive(IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Gain {
    /// Gain x1
    One = 0b00,
    /// Gain x2
    Two = 0b01,
    /// Gain x1/8
    OneEighth = 0b10,
    /// Gain x1/4
    OneQuarter = 0b11,
}

impl Gain {
    /// All gains, ordered from least to most sensitive.
    pub const ASCENDING: [Gain; 4] = [Gain::OneEighth, Gain::OneQuarter, Gain::One, Gain::Two];

    /// The multiplier applied to the sensor response.
    pub fn value(self) -> f32 {
        match self {
            Gain::OneEighth => 0.125,
            Gain::OneQuarter => 0.25,
            Gain::One => 1.0,
            Gain::Two => 2.0,
        }
    }
}

/// Ambient light integration time.
///
/// # Note
/// The register codes are not monotonic in the integration time. Use
/// [`IntegrationTime::ASCENDING`] to step through the settings in order.
#[derive(IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 25ms
    Ms25 = 0xC,
    /// 50ms
    Ms50 = 0x8,
    /// 100ms
    Ms100 = 0x0,
    /// 200ms
    Ms200 = 0x1,
    /// 400ms
    Ms400 = 0x2,
    /// 800ms
    Ms800 = 0x3,
}

impl IntegrationTime {
    /// All integration times, ordered from shortest to longest.
    pub const ASCENDING: [IntegrationTime; 6] = [
        IntegrationTime::Ms25,
        IntegrationTime::Ms50,
        IntegrationTime::Ms100,
        IntegrationTime::Ms200,
        IntegrationTime::Ms400,
        IntegrationTime::Ms800,
    ];

    /// The integration time in milliseconds.
    pub fn millis(self) -> u16 {
        match self {
            IntegrationTime::Ms25 => 25,
            IntegrationTime::Ms50 => 50,
            IntegrationTime::Ms100 => 100,
            IntegrationTime::Ms200 => 200,
            IntegrationTime::Ms400 => 400,
            IntegrationTime::Ms800 => 800,
        }
    }
}

/// Power saving mode. Higher modes trade refresh rate for lower supply current.
#[derive(IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum PowerSavingMode {
    /// 500ms refresh
    Mode1 = 0b00,
    /// 1000ms refresh
    Mode2 = 0b01,
    /// 2000ms refresh
    Mode3 = 0b10,
    /// 4000ms refresh
    Mode4 = 0b11,
}

impl PowerSavingMode {
    /// The refresh time in milliseconds.
    pub fn refresh_millis(self) -> u16 {
        match self {
            PowerSavingMode::Mode1 => 500,
            PowerSavingMode::Mode2 => 1000,
            PowerSavingMode::Mode3 => 2000,
            PowerSavingMode::Mode4 => 4000,
        }
    }
}

/// Threshold interrupt flags.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct InterruptStatus {
    /// The ALS count exceeded the high threshold.
    pub high: bool,
    /// The ALS count fell below the low threshold.
    pub low: bool,
}
