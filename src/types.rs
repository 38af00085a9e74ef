//! This module defines range-checked types for the values carried in the
//! CP Plus status frames, meant to simplify correct usage of the API.

use snafu::{ensure, Snafu};

use core::ops::{Deref, RangeInclusive};
use core::time::Duration;

/// Error type for this module
#[derive(Debug, Snafu, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The temperature can't be represented for this kind of target.
    #[snafu(display("Invalid temperature"))]
    InvalidTemperature,
    /// The electric power level isn't one the heater supports.
    #[snafu(display("Invalid electric power level"))]
    InvalidPowerLevel,
    /// The time of day is out of range.
    #[snafu(display("Invalid time of day"))]
    InvalidTime,
}

const fn invalid_temperature() -> InvalidTemperatureSnafu {
    InvalidTemperatureSnafu
}

const fn invalid_power_level() -> InvalidPowerLevelSnafu {
    InvalidPowerLevelSnafu
}

const fn invalid_time() -> InvalidTimeSnafu {
    InvalidTimeSnafu
}

/// Offset between the wire code (tenths of a kelvin) and tenths of a degree Celsius.
const KELVIN_OFFSET_DECI: i32 = 2730;

const ROOM_RANGE: RangeInclusive<f32> = 5.0..=30.0;
const AIRCON_RANGE: RangeInclusive<f32> = 16.0..=30.0;

/// Check that a temperature entered by the user is a number.
/// # Errors
/// Returns [`Error::InvalidTemperature`] for NaN and infinities.
pub(crate) fn finite(celsius: f32) -> Result<f32, Error> {
    ensure!(celsius.is_finite(), invalid_temperature());
    Ok(celsius)
}

/// `TempCode` is a temperature as transmitted by the CP Plus: tenths of a
/// kelvin in a little endian u16. The code zero means "off".
///
/// ## Example
/// ```
/// use truma_inetbox::TempCode;
/// let t = TempCode::from_celsius(19.4);
/// assert_eq!(t.code(), 0x0B6C);
/// assert_eq!(t.to_decicelsius(), Some(194));
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash, Default)]
#[repr(transparent)]
pub struct TempCode(u16);

/// Create a new [`TempCode`] from whole degrees Celsius, usable in const context.
pub const fn celsius(c: i16) -> TempCode {
    let code = (c as i32 + 273) * 10;
    if code <= 0 || code > u16::MAX as i32 {
        panic!("Temperature out of range.")
    }
    TempCode(code as u16)
}

impl TempCode {
    /// Target switched off.
    pub const OFF: TempCode = TempCode(0);
    /// Water heating in eco mode (40 °C).
    pub const WATER_ECO: TempCode = celsius(40);
    /// Water heating in high mode (60 °C).
    pub const WATER_HIGH: TempCode = celsius(60);
    /// Water heating in boost mode. The panel uses a marker code above the
    /// physical range.
    pub const WATER_BOOST: TempCode = celsius(90);

    /// Wrap a raw wire code.
    pub const fn from_code(code: u16) -> Self {
        Self(code)
    }

    /// The raw wire code.
    pub const fn code(self) -> u16 {
        self.0
    }

    pub const fn is_off(self) -> bool {
        self.0 == 0
    }

    /// Convert degrees Celsius into a wire code, rounding to the nearest tenth.
    /// Values below absolute zero saturate to [`TempCode::OFF`].
    pub fn from_celsius(celsius: f32) -> Self {
        let code = ((celsius + 273.0) * 10.0).round();
        if code <= 0.0 {
            Self::OFF
        } else if code >= u16::MAX as f32 {
            Self(u16::MAX)
        } else {
            Self(code as u16)
        }
    }

    /// Degrees Celsius, or `None` if the code means "off".
    pub fn to_celsius(self) -> Option<f32> {
        self.to_decicelsius().map(|d| d as f32 / 10.0)
    }

    /// Tenths of a degree Celsius, or `None` if the code means "off".
    pub fn to_decicelsius(self) -> Option<i32> {
        if self.is_off() {
            None
        } else {
            Some(i32::from(self.0) - KELVIN_OFFSET_DECI)
        }
    }

    /// Signed offsets (like the configured sensor offset) use the same
    /// encoding but zero is a valid value there.
    pub fn to_offset_decicelsius(self) -> i32 {
        i32::from(self.0) - KELVIN_OFFSET_DECI
    }

    /// Target room temperature. Anything below 5 °C switches the heater off,
    /// anything above 30 °C is clamped. NaN and infinities mean off.
    pub fn room(celsius: f32) -> Self {
        if !celsius.is_finite() || celsius < *ROOM_RANGE.start() {
            Self::OFF
        } else {
            Self::from_celsius(celsius.min(*ROOM_RANGE.end()))
        }
    }

    /// Target water temperature. The heater only knows off, eco, high and boost,
    /// so the value is rounded down to the closest of those. NaN and
    /// infinities mean off.
    pub fn water(celsius: f32) -> Self {
        if !celsius.is_finite() || celsius < 40.0 {
            Self::OFF
        } else if celsius < 60.0 {
            Self::WATER_ECO
        } else if celsius < 90.0 {
            Self::WATER_HIGH
        } else {
            Self::WATER_BOOST
        }
    }

    /// Target air-con temperature, checking that it is in \[16, 30\] °C.
    /// # Errors
    /// Returns [`Error::InvalidTemperature`] if `celsius` is out of range.
    pub fn aircon(celsius: f32) -> Result<Self, Error> {
        ensure!(AIRCON_RANGE.contains(&celsius), invalid_temperature());
        Ok(Self::from_celsius(celsius))
    }
}

impl Deref for TempCode {
    type Target = u16;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u16> for TempCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl From<TempCode> for u16 {
    fn from(t: TempCode) -> Self {
        t.0
    }
}


/// A point on the caller's monotonic clock, in microseconds.
///
/// The protocol never reads a clock itself; every entry point takes `now`,
/// which keeps all timeouts pure functions of their inputs.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash, Default)]
#[repr(transparent)]
pub struct Instant(u64);

impl Instant {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1000)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    /// `true` if strictly more than `timeout` has passed since `since`.
    pub fn has_elapsed(self, since: Instant, timeout: Duration) -> bool {
        self.saturating_duration_since(since) > timeout
    }
}

impl core::ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        let micros = u64::try_from(rhs.as_micros()).unwrap_or(u64::MAX);
        Instant(self.0.saturating_add(micros))
    }
}


/// Generates a byte-sized protocol enum with an `Unknown` fallback, so that
/// values we haven't seen yet survive a decode/encode cycle untouched.
macro_rules! byte_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value not known to this implementation.
            Unknown(u8),
        }

        impl From<u8> for $name {
            fn from(byte: u8) -> Self {
                match byte {
                    $( $value => Self::$variant, )+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                match value {
                    $( $name::$variant => $value, )+
                    $name::Unknown(other) => other,
                }
            }
        }
    };
}

byte_enum! {
    /// Heater fan mode. Combi heaters use eco/high/boost, VarioHeat uses night/auto.
    pub enum HeatingMode {
        Off = 0x00,
        Eco = 0x01,
        VarioHeatNight = 0x02,
        VarioHeatAuto = 0x03,
        High = 0x0A,
        Boost = 0x0B,
    }
}

impl Default for HeatingMode {
    fn default() -> Self {
        Self::Off
    }
}

byte_enum! {
    /// Energy source used by the heater.
    pub enum EnergyMix {
        None = 0x00,
        Gas = 0x01,
        Electricity = 0x02,
        Mix = 0x03,
    }
}

impl Default for EnergyMix {
    fn default() -> Self {
        Self::None
    }
}

byte_enum! {
    /// Air-con operating mode.
    pub enum AirconMode {
        Off = 0x00,
        Ventilation = 0x04,
        Cooling = 0x05,
        Heating = 0x06,
        Auto = 0x07,
    }
}

impl Default for AirconMode {
    fn default() -> Self {
        Self::Off
    }
}

byte_enum! {
    /// How the panel displays the time.
    pub enum ClockMode {
        H24 = 0x00,
        H12 = 0x01,
    }
}

impl Default for ClockMode {
    fn default() -> Self {
        Self::H24
    }
}

byte_enum! {
    /// Who last set the panel clock.
    pub enum ClockSource {
        None = 0x00,
        Display = 0x01,
        InetBox = 0x02,
    }
}

impl Default for ClockSource {
    fn default() -> Self {
        Self::None
    }
}

byte_enum! {
    /// Panel display language.
    pub enum Language {
        German = 0x00,
        English = 0x01,
        French = 0x02,
        Italian = 0x03,
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::German
    }
}

byte_enum! {
    /// Result code of a write acknowledgement.
    pub enum AckResult {
        Okay = 0x00,
        InvalidMessage = 0x02,
        InvalidMessageType = 0x03,
    }
}

impl Default for AckResult {
    fn default() -> Self {
        Self::Okay
    }
}

/// Electric heating power in watts, restricted to the levels the heaters accept.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash, Default)]
#[repr(transparent)]
pub struct PowerLevel(u16);

impl PowerLevel {
    pub const OFF: PowerLevel = PowerLevel(0);
    pub const W900: PowerLevel = PowerLevel(900);
    pub const W1800: PowerLevel = PowerLevel(1800);

    /// Create a new power level, checking that it is 0, 900 or 1800 W.
    /// # Errors
    /// Returns [`Error::InvalidPowerLevel`] for any other wattage.
    pub fn new(watts: u16) -> Result<Self, Error> {
        ensure!(matches!(watts, 0 | 900 | 1800), invalid_power_level());
        Ok(Self(watts))
    }

    /// Round an arbitrary wattage down to the nearest supported level.
    pub const fn nearest(watts: u16) -> Self {
        if watts >= 1800 {
            Self::W1800
        } else if watts >= 900 {
            Self::W900
        } else {
            Self::OFF
        }
    }

    /// Wrap a value read from the bus without checking it.
    pub(crate) const fn from_wire(watts: u16) -> Self {
        Self(watts)
    }

    pub const fn watts(self) -> u16 {
        self.0
    }
}

impl Deref for PowerLevel {
    type Target = u16;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Hours and minutes, used for timer start and stop times.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash, Default)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// # Errors
    /// Returns [`Error::InvalidTime`] if `hour` or `minute` is out of range.
    pub fn new(hour: u8, minute: u8) -> Result<Self, Error> {
        ensure!(hour < 24 && minute < 60, invalid_time());
        Ok(Self { hour, minute })
    }

    pub(crate) const fn from_wire(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub const fn hour(self) -> u8 {
        self.hour
    }

    pub const fn minute(self) -> u8 {
        self.minute
    }
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn test_byte_enum() {
        assert_eq!(HeatingMode::from(0x0A), HeatingMode::High);
        assert_eq!(u8::from(HeatingMode::Boost), 0x0B);
        assert_eq!(EnergyMix::from(0x42), EnergyMix::Unknown(0x42));
        assert_eq!(u8::from(EnergyMix::Unknown(0x42)), 0x42);
    }

    #[test]
    fn test_power_level() {
        assert_eq!(PowerLevel::new(900), Ok(PowerLevel::W900));
        assert_eq!(PowerLevel::new(1000), Err(Error::InvalidPowerLevel));
        assert_eq!(PowerLevel::nearest(1000), PowerLevel::W900);
        assert_eq!(PowerLevel::nearest(5000), PowerLevel::W1800);
    }

    #[test]
    fn test_time_of_day() {
        assert!(TimeOfDay::new(23, 59).is_ok());
        assert_eq!(TimeOfDay::new(24, 0), Err(Error::InvalidTime));
        assert!(TimeOfDay::new(12, 60).is_err());
    }
}
