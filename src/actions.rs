//! Write requests towards the panel.
//!
//! The `request_*` methods replace a domain's pending write as a whole. The
//! other methods edit a single setting: they start from the current status,
//! so everything else keeps its present value, and they fail until a status
//! for the domain has been received.

use snafu::{ensure, OptionExt, ResultExt, Snafu};

use crate::diag::Domain;
use crate::node::InetBox;
use crate::records::{
    AirconManualUpdate, AirconTargets, HeaterUpdate, HeatingTargets, TimerSchedule, TimerUpdate,
};
use crate::registry::DeviceClass;
use crate::types::{
    finite, AirconMode, ClockMode, EnergyMix, Error as TypeError, HeatingMode, PowerLevel, TempCode,
    TimeOfDay,
};

/// Error type for this module
#[derive(Debug, Snafu, PartialEq)]
#[non_exhaustive]
pub enum ActionError {
    /// Nothing has been received for this domain since the last reset.
    #[snafu(display("No valid {:?} status received yet", domain))]
    StatusNotValid { domain: Domain },
    /// Clock writes need a time source.
    #[snafu(display("No time source configured"))]
    NoTimeSource,
    /// The time source doesn't know the time yet.
    #[snafu(display("Time source has no time"))]
    TimeUnavailable,
    #[snafu(display("Invalid value: {}", source))]
    InvalidValue { source: TypeError },
}

/// Fan mode for a heating target, given what the user asked for and the heater model.
fn heating_mode_for(room: TempCode, wanted: HeatingMode, heater: Option<DeviceClass>) -> HeatingMode {
    use HeatingMode::*;
    if room.is_off() {
        return Off;
    }
    if heater == Some(DeviceClass::HeaterVario) {
        match wanted {
            VarioHeatNight | VarioHeatAuto | Boost => wanted,
            _ => VarioHeatNight,
        }
    } else {
        match wanted {
            Eco | High | Boost => wanted,
            _ => Eco,
        }
    }
}

/// Apply a room temperature (with optional fan mode) to heating targets.
fn set_room(
    targets: &mut HeatingTargets,
    celsius: f32,
    mode: Option<HeatingMode>,
    heater: Option<DeviceClass>,
) {
    targets.target_temp_room = TempCode::room(celsius);
    targets.heating_mode = heating_mode_for(
        targets.target_temp_room,
        mode.unwrap_or(targets.heating_mode),
        heater,
    );
    default_to_gas(targets);
}

fn default_to_gas(targets: &mut HeatingTargets) {
    if targets.energy_mix_a == EnergyMix::None {
        targets.energy_mix_a = EnergyMix::Gas;
    }
    targets.mirror();
}

impl InetBox {
    fn ensure_valid(&self, domain: Domain) -> Result<(), ActionError> {
        let valid = match domain {
            Domain::Heater => self.heater.status().is_valid(),
            Domain::Timer => self.timer.status().is_valid(),
            Domain::AirconManual => self.aircon_manual.status().is_valid(),
            Domain::Clock => self.clock.is_valid(),
            Domain::Config => self.panel_config.is_valid(),
        };
        ensure!(valid, StatusNotValidSnafu { domain });
        Ok(())
    }

    /// Replace the pending heater write.
    pub fn request_heater_update(
        &mut self,
        target_temp_room: TempCode,
        target_temp_water: TempCode,
        heating_mode: HeatingMode,
        energy_mix: EnergyMix,
        el_power_level: PowerLevel,
    ) {
        self.heater.request_write(HeaterUpdate {
            targets: HeatingTargets::new(
                target_temp_room,
                target_temp_water,
                heating_mode,
                energy_mix,
                el_power_level,
            ),
        });
    }

    /// Replace the pending timer write.
    pub fn request_timer_update(
        &mut self,
        schedule: TimerSchedule,
        target_temp_room: TempCode,
        target_temp_water: TempCode,
        heating_mode: HeatingMode,
        energy_mix: EnergyMix,
        el_power_level: PowerLevel,
    ) {
        self.timer.request_write(TimerUpdate {
            targets: HeatingTargets::new(
                target_temp_room,
                target_temp_water,
                heating_mode,
                energy_mix,
                el_power_level,
            ),
            schedule,
        });
    }

    /// Replace the pending air-con write. The operation byte is kept from
    /// the current status.
    pub fn request_aircon_manual_update(
        &mut self,
        mode: AirconMode,
        target_temp: TempCode,
        energy_mix: EnergyMix,
    ) {
        let operation = self.aircon_manual.status().value().targets.operation;
        self.aircon_manual.request_write(AirconManualUpdate {
            targets: AirconTargets {
                mode,
                reserved: 0,
                operation,
                energy_mix,
                target_temp,
            },
        });
    }

    /// Write the current time to the panel and switch its display to `mode`.
    ///
    /// The time itself is read from the time source when the panel collects
    /// the write.
    /// # Errors
    /// Returns [`ActionError::NoTimeSource`] if the node has no time source.
    pub fn request_clock_mode(&mut self, mode: ClockMode) -> Result<(), ActionError> {
        ensure!(self.time_source.is_some(), NoTimeSourceSnafu);
        self.clock_write = Some(mode);
        Ok(())
    }

    /// Write the current time to the panel, keeping its display mode.
    pub fn write_time(&mut self) -> Result<(), ActionError> {
        self.ensure_valid(Domain::Clock)?;
        let source = self.time_source.as_ref().context(NoTimeSourceSnafu)?;
        ensure!(source.now().is_some(), TimeUnavailableSnafu);
        self.clock_write = Some(self.clock.value().mode);
        Ok(())
    }

    /// Set the room temperature. Below 5 °C the heating is switched off.
    ///
    /// `mode` picks the fan mode; without one, the current mode is kept if
    /// the heater supports it.
    pub fn heater_room(&mut self, celsius: f32, mode: Option<HeatingMode>) -> Result<(), ActionError> {
        let celsius = finite(celsius).context(InvalidValueSnafu)?;
        self.ensure_valid(Domain::Heater)?;
        let heater = self.registry.heater();
        set_room(&mut self.heater.prepare().targets, celsius, mode, heater);
        self.heater.submit();
        Ok(())
    }

    /// Set the water temperature, rounded down to off/eco/high/boost.
    pub fn heater_water(&mut self, celsius: f32) -> Result<(), ActionError> {
        let celsius = finite(celsius).context(InvalidValueSnafu)?;
        self.ensure_valid(Domain::Heater)?;
        let targets = &mut self.heater.prepare().targets;
        targets.target_temp_water = TempCode::water(celsius);
        default_to_gas(targets);
        self.heater.submit();
        Ok(())
    }

    /// Set the electric power level. Electric power on a gas-only setup
    /// switches to mixed operation; zero power on an electric setup falls
    /// back to gas.
    pub fn heater_electric_power_level(&mut self, watts: u16) -> Result<(), ActionError> {
        self.ensure_valid(Domain::Heater)?;
        let targets = &mut self.heater.prepare().targets;
        let power = PowerLevel::nearest(watts);
        targets.el_power_level_a = power;
        targets.energy_mix_a = match (power == PowerLevel::OFF, targets.energy_mix_a) {
            (false, EnergyMix::None) | (false, EnergyMix::Gas) => EnergyMix::Mix,
            (true, EnergyMix::Electricity) | (true, EnergyMix::Mix) => EnergyMix::Gas,
            (_, mix) => mix,
        };
        targets.mirror();
        self.heater.submit();
        Ok(())
    }

    /// Set the energy source. Gas turns electric heating off. Electricity
    /// and mixed operation use `power`, or the current level, or 900 W.
    pub fn heater_energy_mix(
        &mut self,
        energy_mix: EnergyMix,
        power: Option<PowerLevel>,
    ) -> Result<(), ActionError> {
        self.ensure_valid(Domain::Heater)?;
        let targets = &mut self.heater.prepare().targets;
        match energy_mix {
            EnergyMix::None | EnergyMix::Gas => {
                targets.energy_mix_a = EnergyMix::Gas;
                targets.el_power_level_a = PowerLevel::OFF;
            }
            EnergyMix::Electricity | EnergyMix::Mix => {
                targets.energy_mix_a = energy_mix;
                targets.el_power_level_a = match (power, targets.el_power_level_a) {
                    (Some(power), _) if power != PowerLevel::OFF => power,
                    (_, PowerLevel::OFF) => PowerLevel::W900,
                    (_, current) => current,
                };
            }
            EnergyMix::Unknown(_) => targets.energy_mix_a = energy_mix,
        }
        targets.mirror();
        self.heater.submit();
        Ok(())
    }

    pub fn timer_disable(&mut self) -> Result<(), ActionError> {
        self.ensure_valid(Domain::Timer)?;
        self.timer.prepare().schedule.active = false;
        self.timer.submit();
        Ok(())
    }

    /// Activate the timer for `start..stop` with the given heating targets.
    pub fn timer_activate(
        &mut self,
        start: TimeOfDay,
        stop: TimeOfDay,
        room_celsius: f32,
        mode: Option<HeatingMode>,
        water_celsius: f32,
    ) -> Result<(), ActionError> {
        let room_celsius = finite(room_celsius).context(InvalidValueSnafu)?;
        let water_celsius = finite(water_celsius).context(InvalidValueSnafu)?;
        self.ensure_valid(Domain::Timer)?;
        let heater = self.registry.heater();
        let update = self.timer.prepare();
        update.schedule = TimerSchedule {
            active: true,
            start,
            stop,
        };
        update.targets.target_temp_water = TempCode::water(water_celsius);
        set_room(&mut update.targets, room_celsius, mode, heater);
        self.timer.submit();
        Ok(())
    }

    pub fn aircon_mode(&mut self, mode: AirconMode) -> Result<(), ActionError> {
        self.ensure_valid(Domain::AirconManual)?;
        self.aircon_manual.prepare().targets.mode = mode;
        self.aircon_manual.submit();
        Ok(())
    }

    /// Set the air-con target temperature, 16 to 30 °C.
    pub fn aircon_temperature(&mut self, celsius: f32) -> Result<(), ActionError> {
        let target_temp = TempCode::aircon(celsius).context(InvalidValueSnafu)?;
        self.ensure_valid(Domain::AirconManual)?;
        self.aircon_manual.prepare().targets.target_temp = target_temp;
        self.aircon_manual.submit();
        Ok(())
    }
}
