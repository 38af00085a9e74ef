//! Deferred diagnostics.
//!
//! The bus callbacks must not log, so they push [`Diagnostic`] events into a
//! bounded queue instead. [`InetBox::tick`](crate::InetBox::tick) drains the
//! queue into the `log` facade.

use arrayvec::ArrayVec;
use log::{debug, error, info, warn};

use crate::frame::FrameError;
use crate::types::AckResult;

pub(crate) const LOG_TARGET: &str = "truma_inetbox";

const QUEUE_LEN: usize = 16;

/// Status domains of the panel.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum Domain {
    Heater,
    Timer,
    AirconManual,
    Clock,
    Config,
}

/// Something the hot path wants to report.
#[derive(PartialEq, Debug, Clone)]
#[non_exhaustive]
pub enum Diagnostic {
    /// A frame failed validation and was dropped without a response.
    FrameRejected(FrameError),
    /// A well-formed frame whose type/length pair isn't known.
    UnknownMessage { message_type: u8, message_length: u8 },
    /// A status frame was decoded.
    StatusReceived(Domain),
    /// A frame known to carry data we don't decode.
    Ignored { message_type: u8 },
    /// One entry of the device enumeration.
    DeviceEnumerated {
        device_id: u8,
        device_count: u8,
        software_revision: [u8; 3],
        hardware_revision: (u16, u8),
    },
    /// The enumeration entry has a device class or field we don't know.
    UnknownDeviceInfo { device_id: u8, class: u8, reserved: u8 },
    /// The enumeration held more devices than we can track.
    RegistryFull { device_id: u8 },
    /// The panel answered a write.
    WriteAcknowledged { command_counter: u8, result: AckResult },
    /// The panel asked for our state buffer.
    InitRequested,
    UpdateSent(Domain),
    /// The panel asked for our state buffer but nothing was pending.
    NothingToSend,
    /// A clock write was pending but the time source had no time.
    TimeUnavailable,
    /// A rejected write discarded the session state.
    SessionReset,
}

impl Diagnostic {
    fn log(&self) {
        match self {
            Diagnostic::FrameRejected(e) => error!(target: LOG_TARGET, "Dropped frame: {}", e),
            Diagnostic::UnknownMessage {
                message_type,
                message_length,
            } => warn!(
                target: LOG_TARGET,
                "Unknown message type {:02X} (length {})", message_type, message_length
            ),
            Diagnostic::StatusReceived(domain) => {
                info!(target: LOG_TARGET, "Status frame {:?}", domain)
            }
            Diagnostic::Ignored { message_type } => {
                info!(target: LOG_TARGET, "Ignored status frame {:02X}", message_type)
            }
            Diagnostic::DeviceEnumerated {
                device_id,
                device_count,
                software_revision: [class, major, minor],
                hardware_revision: (hw_major, hw_minor),
            } => debug!(
                target: LOG_TARGET,
                "Device {}/{} - {}.{:02}.{:02} {:04X}.{:02X}",
                u16::from(*device_id) + 1,
                device_count,
                class,
                major,
                minor,
                hw_major,
                hw_minor
            ),
            Diagnostic::UnknownDeviceInfo {
                device_id,
                class,
                reserved,
            } => warn!(
                target: LOG_TARGET,
                "Unknown information in device {} (class {:02X}, reserved {:02X})",
                device_id,
                class,
                reserved
            ),
            Diagnostic::RegistryFull { device_id } => warn!(
                target: LOG_TARGET,
                "No room to register device {}", device_id
            ),
            Diagnostic::WriteAcknowledged {
                command_counter,
                result: AckResult::Okay,
            } => info!(target: LOG_TARGET, "Write {:02X} acknowledged", command_counter),
            Diagnostic::WriteAcknowledged {
                command_counter,
                result,
            } => warn!(
                target: LOG_TARGET,
                "Write {:02X} rejected: {:?}", command_counter, result
            ),
            Diagnostic::InitRequested => debug!(target: LOG_TARGET, "Requested read: sending init"),
            Diagnostic::UpdateSent(domain) => {
                debug!(target: LOG_TARGET, "Requested read: sending {:?} update", domain)
            }
            Diagnostic::NothingToSend => warn!(
                target: LOG_TARGET,
                "Requested read: the panel asks for an update, but there is none"
            ),
            Diagnostic::TimeUnavailable => warn!(
                target: LOG_TARGET,
                "Clock write skipped: time source has no time"
            ),
            Diagnostic::SessionReset => {
                warn!(target: LOG_TARGET, "Session reset, pending writes discarded")
            }
        }
    }
}

/// Bounded queue of diagnostics. When full, new events are counted and dropped.
#[derive(Debug, Default)]
pub struct DiagQueue {
    events: ArrayVec<Diagnostic, QUEUE_LEN>,
    dropped: usize,
}

impl DiagQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: Diagnostic) {
        if self.events.try_push(event).is_err() {
            self.dropped += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Remove all events, oldest first, without logging them.
    pub fn take(&mut self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.dropped = 0;
        self.events.drain(..)
    }

    /// Log and remove all queued events.
    pub fn flush(&mut self) {
        if self.dropped > 0 {
            warn!(
                target: LOG_TARGET,
                "{} diagnostics dropped, queue full", self.dropped
            );
        }
        for event in self.take() {
            event.log();
        }
    }
}
