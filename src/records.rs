//! Payload records of the status frames. Each record has a fixed layout and
//! is identified on the wire by its `(message type, length)` pair.
//!
//! Bytes whose meaning is unknown are kept in `reserved*` fields so that a
//! decoded record can be written back unchanged.

use nom::IResult;

use crate::buffer::FrameBuffer;
use crate::frame::Record;
use crate::nom_parser;
use crate::types::{
    AckResult, AirconMode, ClockMode, ClockSource, EnergyMix, HeatingMode, Language, PowerLevel,
    TempCode, TimeOfDay,
};

/// Heating targets as they appear at the start of the heater and timer records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct HeatingTargets {
    pub target_temp_room: TempCode,
    pub heating_mode: HeatingMode,
    pub reserved: u8,
    pub el_power_level_a: PowerLevel,
    pub target_temp_water: TempCode,
    pub el_power_level_b: PowerLevel,
    pub energy_mix_a: EnergyMix,
    pub energy_mix_b: EnergyMix,
}

impl HeatingTargets {
    /// Targets for a write request. The panel expects both energy/power pairs
    /// to carry the same value.
    pub fn new(
        target_temp_room: TempCode,
        target_temp_water: TempCode,
        heating_mode: HeatingMode,
        energy_mix: EnergyMix,
        el_power_level: PowerLevel,
    ) -> Self {
        Self {
            target_temp_room,
            heating_mode,
            reserved: 0,
            el_power_level_a: el_power_level,
            target_temp_water,
            el_power_level_b: el_power_level,
            energy_mix_a: energy_mix,
            energy_mix_b: energy_mix,
        }
    }

    /// Copy the `a` energy/power values into the `b` slot.
    pub(crate) fn mirror(&mut self) {
        self.el_power_level_b = self.el_power_level_a;
        self.energy_mix_b = self.energy_mix_a;
    }

    fn write(&self, out: &mut FrameBuffer) {
        out.push_u16(self.target_temp_room.code());
        out.push(self.heating_mode.into());
        out.push(self.reserved);
        out.push_u16(self.el_power_level_a.watts());
        out.push_u16(self.target_temp_water.code());
        out.push_u16(self.el_power_level_b.watts());
        out.push(self.energy_mix_a.into());
        out.push(self.energy_mix_b.into());
    }
}

/// Heater status broadcast by the panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Heater {
    pub targets: HeatingTargets,
    pub current_temp_water: TempCode,
    pub current_temp_room: TempCode,
    pub operating_status: u8,
    pub error_code_low: u8,
    pub error_code_high: u8,
    pub reserved: u8,
}

impl Heater {
    /// The error code as shown on the panel, e.g. `E 517` for high 5, low 17.
    pub fn error_code(&self) -> u16 {
        u16::from(self.error_code_high) * 100 + u16::from(self.error_code_low)
    }
}

impl Record for Heater {
    const MESSAGE_TYPE: u8 = 0x33;
    const LEN: usize = 20;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::heater(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        self.targets.write(out);
        out.push_u16(self.current_temp_water.code());
        out.push_u16(self.current_temp_room.code());
        out.push(self.operating_status);
        out.push(self.error_code_low);
        out.push(self.error_code_high);
        out.push(self.reserved);
    }
}

/// Heater write request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct HeaterUpdate {
    pub targets: HeatingTargets,
}

impl From<&Heater> for HeaterUpdate {
    fn from(status: &Heater) -> Self {
        let mut targets = status.targets;
        targets.reserved = 0;
        Self { targets }
    }
}

impl Record for HeaterUpdate {
    const MESSAGE_TYPE: u8 = Heater::MESSAGE_TYPE - 1;
    const LEN: usize = 12;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::heater_update(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        self.targets.write(out);
    }
}

/// When the timer is active and the period it covers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TimerSchedule {
    pub active: bool,
    pub start: TimeOfDay,
    pub stop: TimeOfDay,
}

impl TimerSchedule {
    fn write(&self, out: &mut FrameBuffer) {
        out.push(u8::from(self.active));
        out.push(self.start.minute());
        out.push(self.start.hour());
        out.push(self.stop.minute());
        out.push(self.stop.hour());
    }
}

/// Timer status broadcast by the panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Timer {
    /// Targets applied while the timer runs.
    pub targets: HeatingTargets,
    /// Echo of the last timer write, all zero after the panel applied it.
    pub requested: TimerSchedule,
    pub reserved: [u8; 2],
    pub schedule: TimerSchedule,
}

impl Record for Timer {
    const MESSAGE_TYPE: u8 = 0x3D;
    const LEN: usize = 24;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::timer(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        self.targets.write(out);
        self.requested.write(out);
        out.write(&self.reserved);
        self.schedule.write(out);
    }
}

/// Timer write request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TimerUpdate {
    pub targets: HeatingTargets,
    pub schedule: TimerSchedule,
}

impl From<&Timer> for TimerUpdate {
    fn from(status: &Timer) -> Self {
        let mut targets = status.targets;
        targets.reserved = 0;
        Self {
            targets,
            schedule: status.schedule,
        }
    }
}

impl Record for TimerUpdate {
    const MESSAGE_TYPE: u8 = Timer::MESSAGE_TYPE - 1;
    const LEN: usize = 17;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::timer_update(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        self.targets.write(out);
        self.schedule.write(out);
    }
}

/// Air-con settings shared by the manual status and its write request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AirconTargets {
    pub mode: AirconMode,
    pub reserved: u8,
    /// Fan/operation byte, passed through as received.
    pub operation: u8,
    pub energy_mix: EnergyMix,
    pub target_temp: TempCode,
}

impl AirconTargets {
    fn write(&self, out: &mut FrameBuffer) {
        out.push(self.mode.into());
        out.push(self.reserved);
        out.push(self.operation);
        out.push(self.energy_mix.into());
        out.push_u16(self.target_temp.code());
    }
}

/// Air-con status in manual mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AirconManual {
    pub targets: AirconTargets,
    pub reserved_1: u16,
    pub current_temp: TempCode,
    pub reserved_2: [u8; 6],
    pub reserved_3: u16,
}

impl Record for AirconManual {
    const MESSAGE_TYPE: u8 = 0x35;
    const LEN: usize = 18;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::aircon_manual(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        self.targets.write(out);
        out.push_u16(self.reserved_1);
        out.push_u16(self.current_temp.code());
        out.write(&self.reserved_2);
        out.push_u16(self.reserved_3);
    }
}

/// Air-con write request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct AirconManualUpdate {
    pub targets: AirconTargets,
}

impl From<&AirconManual> for AirconManualUpdate {
    fn from(status: &AirconManual) -> Self {
        Self {
            targets: status.targets,
        }
    }
}

impl Record for AirconManualUpdate {
    const MESSAGE_TYPE: u8 = AirconManual::MESSAGE_TYPE - 1;
    const LEN: usize = 6;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::aircon_manual_update(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        self.targets.write(out);
    }
}

/// Panel clock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Clock {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub display: [u8; 3],
    pub mode: ClockMode,
    pub source: ClockSource,
    pub reserved: [u8; 2],
}

impl Record for Clock {
    const MESSAGE_TYPE: u8 = 0x15;
    const LEN: usize = 10;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::clock(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        out.push(self.hour);
        out.push(self.minute);
        out.push(self.second);
        out.write(&self.display);
        out.push(self.mode.into());
        out.push(self.source.into());
        out.write(&self.reserved);
    }
}

/// Clock write request. The time is read from the time source at the moment
/// the frame is built.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ClockUpdate {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub mode: ClockMode,
}

impl Record for ClockUpdate {
    const MESSAGE_TYPE: u8 = Clock::MESSAGE_TYPE - 1;
    const LEN: usize = 10;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::clock_update(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        Clock {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            display: [0x01, 0x01, 0x00],
            mode: self.mode,
            source: ClockSource::None,
            reserved: [0; 2],
        }
        .write(out);
    }
}

/// Panel configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PanelConfig {
    pub display_brightness: u8,
    pub language: Language,
    pub reserved_1: u16,
    /// Room sensor offset. Zero degrees is a valid offset here, see
    /// [`TempCode::to_offset_decicelsius`].
    pub temp_offset: TempCode,
    pub reserved_2: [u8; 4],
}

impl Record for PanelConfig {
    const MESSAGE_TYPE: u8 = 0x17;
    const LEN: usize = 10;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::config(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        out.push(self.display_brightness);
        out.push(self.language.into());
        out.push_u16(self.reserved_1);
        out.push_u16(self.temp_offset.code());
        out.write(&self.reserved_2);
    }
}

/// One entry of the device enumeration. The panel sends one frame per
/// registered device, itself included.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Device {
    pub device_count: u8,
    /// Zero based index of this device.
    pub device_id: u8,
    pub reserved_1: u8,
    /// Always zero in every capture so far.
    pub reserved_2: u8,
    pub hardware_revision_major: u16,
    pub hardware_revision_minor: u8,
    /// Device class followed by the version, e.g. `H2.00.01`.
    pub software_revision: [u8; 3],
    pub reserved_3: [u8; 2],
}

impl Record for Device {
    const MESSAGE_TYPE: u8 = 0x0B;
    const LEN: usize = 12;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::device(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        out.push(self.device_count);
        out.push(self.device_id);
        out.push(self.reserved_1);
        out.push(self.reserved_2);
        out.push_u16(self.hardware_revision_major);
        out.push(self.hardware_revision_minor);
        out.write(&self.software_revision);
        out.write(&self.reserved_3);
    }
}

/// The panel's verdict on a write request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ResponseAck {
    pub result: AckResult,
    pub reserved: u8,
}

impl Record for ResponseAck {
    const MESSAGE_TYPE: u8 = 0x0D;
    const LEN: usize = 2;

    fn parse(buf: &[u8]) -> IResult<&[u8], Self> {
        nom_parser::response_ack(buf)
    }

    fn write(&self, out: &mut FrameBuffer) {
        out.push(self.result.into());
        out.push(self.reserved);
    }
}
