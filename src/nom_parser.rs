use nom::bytes::complete::take;
use nom::combinator::map;
use nom::number::complete::{le_u16, u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::frame::Header;
use crate::records::*;
use crate::types::{PowerLevel, TempCode, TimeOfDay};

type Buf = [u8];

pub(crate) fn header(buf: &Buf) -> IResult<&Buf, (Header, [u8; 2])> {
    let (buf, (service_identifier, _preamble, tag)) =
        tuple((u8, bytes::<10>, bytes::<2>))(buf)?;
    let (buf, (message_length, message_type, command_counter, checksum)) =
        tuple((u8, u8, u8, u8))(buf)?;
    Ok((
        buf,
        (
            Header {
                service_identifier,
                message_length,
                message_type,
                command_counter,
                checksum,
            },
            tag,
        ),
    ))
}

fn bytes<const N: usize>(buf: &Buf) -> IResult<&Buf, [u8; N]> {
    map(take(N), |s: &Buf| {
        let mut out = [0; N];
        out.copy_from_slice(s);
        out
    })(buf)
}

fn byte_as<T: From<u8>>(buf: &Buf) -> IResult<&Buf, T> {
    map(u8, T::from)(buf)
}

fn temp(buf: &Buf) -> IResult<&Buf, TempCode> {
    map(le_u16, TempCode::from_code)(buf)
}

fn power(buf: &Buf) -> IResult<&Buf, PowerLevel> {
    map(le_u16, PowerLevel::from_wire)(buf)
}

/// Minutes first, then hours.
fn time_of_day(buf: &Buf) -> IResult<&Buf, TimeOfDay> {
    map(tuple((u8, u8)), |(minute, hour)| TimeOfDay::from_wire(hour, minute))(buf)
}

fn flag(buf: &Buf) -> IResult<&Buf, bool> {
    map(u8, |b| b != 0)(buf)
}

/// The heating targets shared by the heater and timer records.
fn heating_targets(buf: &Buf) -> IResult<&Buf, HeatingTargets> {
    map(
        tuple((temp, byte_as, u8, power, temp, power, byte_as, byte_as)),
        |(
            target_temp_room,
            heating_mode,
            reserved,
            el_power_level_a,
            target_temp_water,
            el_power_level_b,
            energy_mix_a,
            energy_mix_b,
        )| HeatingTargets {
            target_temp_room,
            heating_mode,
            reserved,
            el_power_level_a,
            target_temp_water,
            el_power_level_b,
            energy_mix_a,
            energy_mix_b,
        },
    )(buf)
}

pub(crate) fn heater(buf: &Buf) -> IResult<&Buf, Heater> {
    map(
        tuple((heating_targets, temp, temp, u8, u8, u8, u8)),
        |(
            targets,
            current_temp_water,
            current_temp_room,
            operating_status,
            error_code_low,
            error_code_high,
            reserved,
        )| Heater {
            targets,
            current_temp_water,
            current_temp_room,
            operating_status,
            error_code_low,
            error_code_high,
            reserved,
        },
    )(buf)
}

pub(crate) fn heater_update(buf: &Buf) -> IResult<&Buf, HeaterUpdate> {
    map(heating_targets, |targets| HeaterUpdate { targets })(buf)
}

pub(crate) fn timer(buf: &Buf) -> IResult<&Buf, Timer> {
    map(
        tuple((
            heating_targets,
            timer_schedule,
            bytes::<2>,
            timer_schedule,
        )),
        |(targets, requested, reserved, schedule)| Timer {
            targets,
            requested,
            reserved,
            schedule,
        },
    )(buf)
}

fn timer_schedule(buf: &Buf) -> IResult<&Buf, TimerSchedule> {
    map(
        tuple((flag, time_of_day, time_of_day)),
        |(active, start, stop)| TimerSchedule {
            active,
            start,
            stop,
        },
    )(buf)
}

pub(crate) fn timer_update(buf: &Buf) -> IResult<&Buf, TimerUpdate> {
    map(
        tuple((heating_targets, timer_schedule)),
        |(targets, schedule)| TimerUpdate { targets, schedule },
    )(buf)
}

pub(crate) fn aircon_manual(buf: &Buf) -> IResult<&Buf, AirconManual> {
    map(
        tuple((
            aircon_targets,
            le_u16,
            temp,
            bytes::<6>,
            le_u16,
        )),
        |(targets, reserved_1, current_temp, reserved_2, reserved_3)| AirconManual {
            targets,
            reserved_1,
            current_temp,
            reserved_2,
            reserved_3,
        },
    )(buf)
}

fn aircon_targets(buf: &Buf) -> IResult<&Buf, AirconTargets> {
    map(
        tuple((byte_as, u8, u8, byte_as, temp)),
        |(mode, reserved, operation, energy_mix, target_temp)| AirconTargets {
            mode,
            reserved,
            operation,
            energy_mix,
            target_temp,
        },
    )(buf)
}

pub(crate) fn aircon_manual_update(buf: &Buf) -> IResult<&Buf, AirconManualUpdate> {
    map(aircon_targets, |targets| AirconManualUpdate { targets })(buf)
}

pub(crate) fn clock(buf: &Buf) -> IResult<&Buf, Clock> {
    map(
        tuple((u8, u8, u8, bytes::<3>, byte_as, byte_as, bytes::<2>)),
        |(hour, minute, second, display, mode, source, reserved)| Clock {
            hour,
            minute,
            second,
            display,
            mode,
            source,
            reserved,
        },
    )(buf)
}

pub(crate) fn clock_update(buf: &Buf) -> IResult<&Buf, ClockUpdate> {
    map(clock, |clock| ClockUpdate {
        hour: clock.hour,
        minute: clock.minute,
        second: clock.second,
        mode: clock.mode,
    })(buf)
}

pub(crate) fn config(buf: &Buf) -> IResult<&Buf, PanelConfig> {
    map(
        tuple((u8, byte_as, le_u16, temp, bytes::<4>)),
        |(display_brightness, language, reserved_1, temp_offset, reserved_2)| PanelConfig {
            display_brightness,
            language,
            reserved_1,
            temp_offset,
            reserved_2,
        },
    )(buf)
}

pub(crate) fn device(buf: &Buf) -> IResult<&Buf, Device> {
    map(
        tuple((u8, u8, u8, u8, le_u16, u8, bytes::<3>, bytes::<2>)),
        |(
            device_count,
            device_id,
            reserved_1,
            reserved_2,
            hardware_revision_major,
            hardware_revision_minor,
            software_revision,
            reserved_3,
        )| Device {
            device_count,
            device_id,
            reserved_1,
            reserved_2,
            hardware_revision_major,
            hardware_revision_minor,
            software_revision,
            reserved_3,
        },
    )(buf)
}

pub(crate) fn response_ack(buf: &Buf) -> IResult<&Buf, ResponseAck> {
    map(tuple((byte_as, u8)), |(result, reserved)| ResponseAck {
        result,
        reserved,
    })(buf)
}
