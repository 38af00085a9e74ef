//! What the panel told us about the devices registered with it.

use arrayvec::ArrayVec;

use crate::records::Device;

/// Most devices a CP Plus enumerates: the panel itself, a heater and an air-con,
/// with room to spare.
pub const MAX_DEVICES: usize = 8;

/// Device class, the first byte of the software revision in the enumeration.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum DeviceClass {
    Aircon,
    HeaterCombi4,
    HeaterVario,
    CpPlusCombi,
    CpPlusVario,
    HeaterCombi6D,
    Unknown(u8),
}

impl From<u8> for DeviceClass {
    fn from(byte: u8) -> Self {
        match byte {
            0x01 => Self::Aircon,
            0x02 => Self::HeaterCombi4,
            0x03 => Self::HeaterVario,
            0x04 => Self::CpPlusCombi,
            0x05 => Self::CpPlusVario,
            0x06 => Self::HeaterCombi6D,
            other => Self::Unknown(other),
        }
    }
}

impl DeviceClass {
    pub fn of(device: &Device) -> Self {
        device.software_revision[0].into()
    }

    pub fn is_heater(self) -> bool {
        matches!(
            self,
            Self::HeaterCombi4 | Self::HeaterVario | Self::HeaterCombi6D
        )
    }

    pub fn is_panel(self) -> bool {
        matches!(self, Self::CpPlusCombi | Self::CpPlusVario)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// Devices seen in the panel's enumeration since the last reset.
#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    heater: Option<DeviceClass>,
    panel: Option<DeviceClass>,
    aircon: bool,
    devices: ArrayVec<Device, MAX_DEVICES>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an enumeration entry. Returns `false` if the entry didn't fit.
    pub(crate) fn register(&mut self, device: Device) -> bool {
        let class = DeviceClass::of(&device);
        if class.is_heater() {
            self.heater = Some(class);
        } else if class.is_panel() {
            self.panel = Some(class);
        } else if class == DeviceClass::Aircon {
            self.aircon = true;
        }

        match self
            .devices
            .iter_mut()
            .find(|d| d.device_id == device.device_id)
        {
            Some(entry) => {
                *entry = device;
                true
            }
            None => self.devices.try_push(device).is_ok(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The heater model, once it was enumerated.
    pub fn heater(&self) -> Option<DeviceClass> {
        self.heater
    }

    /// The panel family, once it was enumerated.
    pub fn panel(&self) -> Option<DeviceClass> {
        self.panel
    }

    pub fn has_aircon(&self) -> bool {
        self.aircon
    }

    /// The enumeration entry with the given zero based index.
    pub fn device(&self, device_id: u8) -> Option<&Device> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }
}
