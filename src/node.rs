//! See [`InetBox`] for more details.

use crate::buffer::FrameBuffer;
use crate::clock::TimeSource;
use crate::config::Config;
use crate::diag::{DiagQueue, Diagnostic, Domain, LOG_TARGET};
use crate::frame::{self, FrameError, Header, Record};
use crate::handshake::Handshake;
use crate::records::{
    AirconManual, AirconManualUpdate, Clock, ClockUpdate, Device, Heater, HeaterUpdate,
    PanelConfig, ResponseAck, Timer, TimerUpdate,
};
use crate::registry::{DeviceClass, DeviceRegistry};
use crate::storage::{StatusStore, UpdateStaging};
use crate::types::{AckResult, ClockMode, Instant};
use crate::{
    LIN_PID_TRUMA_INET_BOX, LIN_SID_FILL_STATE_BUFFER, LIN_SID_READ_STATE_BUFFER,
    LIN_SID_RESPONSE,
};

/// Answer to the node's poll PID: "alive", byte 0 tells if there is data.
const POLL_RESPONSE: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
const POLL_NOTHING_TO_SEND: u8 = 0xFE;

/// Service identifier of the frames we put into the state buffer.
const SID_STATE_BUFFER_RESPONSE: u8 = LIN_SID_READ_STATE_BUFFER | LIN_SID_RESPONSE;

/// Read-by-identifier: product identification.
const IDENTITY_PRODUCT: u8 = 0x00;
/// Read-by-identifier: product details shown on the panel.
const IDENTITY_PANEL_DISPLAY: u8 = 0x20;
/// Read-by-identifier: content unknown, but the panel's init fails without an answer.
const IDENTITY_UNKNOWN_22: u8 = 0x22;

/// The callbacks a LIN transport drives. The transport handles the bus
/// framing and hands complete messages to the node.
pub trait LinNode {
    /// The master polled `pid`. Returns the 8 byte answer, or `None` if the
    /// PID isn't ours.
    fn handle_poll(&mut self, pid: u8, now: Instant) -> Option<[u8; 8]>;

    /// A complete (reassembled) diagnostic message. Returns the response to
    /// send, or `None` to stay silent.
    fn handle_message(&mut self, message: &[u8], now: Instant) -> Option<FrameBuffer>;

    /// Read-by-identifier request. Returns the 5 data bytes, or `None` to
    /// reject the identifier.
    fn handle_identity_read(&mut self, identifier: u8) -> Option<[u8; 5]>;
}

/// What the next "read state buffer" request gets answered with.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum Pending {
    /// Ask the panel for its initial data.
    Init,
    Heater,
    Timer,
    AirconManual,
    Clock,
}

/// An emulated Truma iNet Box.
///
/// The node is sans-io: the transport calls the [`LinNode`] methods from the
/// bus callback, and the application calls [`tick`](Self::tick) from its main
/// loop. Every call gets the current time on a monotonic clock.
///
/// The [`LinNode`] methods don't log or allocate. Their diagnostics are
/// queued and written to the `log` facade by `tick`, which also notifies the
/// status listeners.
///
/// # Example
///
/// ```
/// use truma_inetbox::{Config, InetBox, Instant, LinNode, LIN_PID_TRUMA_INET_BOX};
///
/// let mut node = InetBox::new(Config::default());
/// let now = Instant::from_millis(0);
///
/// // The first poll asks the panel to collect our init request ...
/// let answer = node.handle_poll(LIN_PID_TRUMA_INET_BOX, now).unwrap();
/// assert_eq!(answer[0], 0x00);
///
/// // ... which it does with a "read state buffer" request.
/// let read = [0xBA, 0x00, 0x1F, 0x00, 0x1E, 0x00, 0x00, 0x22, 0xFF, 0xFF, 0xFF];
/// let frame = node.handle_message(&read, now).unwrap();
/// assert_eq!(frame[14], 0x0A);
///
/// node.tick(now);
/// ```
pub struct InetBox {
    pub(crate) config: Config,
    pub(crate) time_source: Option<Box<dyn TimeSource + Send>>,
    pub(crate) handshake: Handshake,
    pub(crate) registry: DeviceRegistry,
    pub(crate) heater: UpdateStaging<Heater, HeaterUpdate>,
    pub(crate) timer: UpdateStaging<Timer, TimerUpdate>,
    pub(crate) aircon_manual: UpdateStaging<AirconManual, AirconManualUpdate>,
    pub(crate) clock: StatusStore<Clock>,
    pub(crate) panel_config: StatusStore<PanelConfig>,
    /// Clock write waiting for the panel, with the display mode to set.
    pub(crate) clock_write: Option<ClockMode>,
    clock_sync_done: bool,
    diagnostics: DiagQueue,
}

impl InetBox {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            time_source: None,
            handshake: Handshake::new(),
            registry: DeviceRegistry::new(),
            heater: UpdateStaging::default(),
            timer: UpdateStaging::default(),
            aircon_manual: UpdateStaging::default(),
            clock: StatusStore::default(),
            panel_config: StatusStore::default(),
            clock_write: None,
            clock_sync_done: false,
            diagnostics: DiagQueue::new(),
        }
    }

    /// Use `source` for writing the time to the panel.
    #[must_use]
    pub fn with_time_source(mut self, source: impl TimeSource + Send + 'static) -> Self {
        self.time_source = Some(Box::new(source));
        self
    }

    /// The next thing to put into the state buffer.
    ///
    /// The init request comes first, then the pending writes in the fixed order
    /// heater, timer, air-con, clock. The poll answer and the state buffer
    /// both go through here so they can't disagree.
    pub fn next_pending(&self) -> Option<Pending> {
        if !self.handshake.is_initialized() {
            Some(Pending::Init)
        } else if self.heater.is_unsubmitted() {
            Some(Pending::Heater)
        } else if self.timer.is_unsubmitted() {
            Some(Pending::Timer)
        } else if self.aircon_manual.is_unsubmitted() {
            Some(Pending::AirconManual)
        } else if self.clock_write.is_some() && self.time_source.is_some() {
            Some(Pending::Clock)
        } else {
            None
        }
    }

    /// Whether the idle poll answer should tell the panel we have data.
    /// Called from the bus callback, so it neither logs nor queues diagnostics.
    pub fn should_offer_update(&mut self, now: Instant) -> bool {
        let has_pending = self.next_pending().is_some();
        self.handshake
            .should_offer_update(now, has_pending, &self.config)
    }

    /// Forget everything learned from the panel and discard all pending
    /// writes. The init handshake starts over.
    pub fn reset(&mut self, now: Instant) {
        self.registry.reset();
        self.heater.reset();
        self.timer.reset();
        self.aircon_manual.reset();
        self.clock.reset();
        self.panel_config.reset();
        self.clock_write = None;
        self.handshake.reset(now);
    }

    /// The transport saw the master address us.
    pub fn heartbeat(&mut self, now: Instant) {
        self.handshake.device_registered_at = Some(now);
    }

    /// Periodic housekeeping, call this from the main loop.
    ///
    /// Logs the queued diagnostics, calls the listeners of every status that
    /// changed since the last tick and, once per node lifetime, schedules the
    /// automatic clock write.
    pub fn tick(&mut self, now: Instant) {
        self.diagnostics.flush();

        self.heater.status_mut().notify();
        self.timer.status_mut().notify();
        self.aircon_manual.status_mut().notify();
        self.clock.notify();
        self.panel_config.notify();

        self.sync_clock(now);
    }

    fn sync_clock(&mut self, now: Instant) {
        if !self.config.auto_clock_sync || self.clock_sync_done || self.time_source.is_none() {
            return;
        }
        match self.handshake.init_received_at {
            Some(received) if now.has_elapsed(received, self.config.clock_sync_delay) => {
                self.clock_sync_done = true;
                if let Err(e) = self.write_time() {
                    log::warn!(target: LOG_TARGET, "Automatic clock write failed: {}", e);
                }
            }
            _ => {}
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn heater(&self) -> &StatusStore<Heater> {
        self.heater.status()
    }

    pub fn timer(&self) -> &StatusStore<Timer> {
        self.timer.status()
    }

    pub fn aircon_manual(&self) -> &StatusStore<AirconManual> {
        self.aircon_manual.status()
    }

    pub fn clock(&self) -> &StatusStore<Clock> {
        &self.clock
    }

    /// The panel's own configuration (language, sensor offset, ...).
    pub fn panel_config(&self) -> &StatusStore<PanelConfig> {
        &self.panel_config
    }

    pub fn heater_staging(&self) -> &UpdateStaging<Heater, HeaterUpdate> {
        &self.heater
    }

    pub fn timer_staging(&self) -> &UpdateStaging<Timer, TimerUpdate> {
        &self.timer
    }

    pub fn aircon_manual_staging(&self) -> &UpdateStaging<AirconManual, AirconManualUpdate> {
        &self.aircon_manual
    }

    pub fn is_clock_write_pending(&self) -> bool {
        self.clock_write.is_some()
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Diagnostics queued since the last [`tick`](Self::tick).
    pub fn diagnostics(&self) -> &DiagQueue {
        &self.diagnostics
    }

    /// Take the queued diagnostics instead of logging them on the next tick.
    pub fn take_diagnostics(&mut self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.diagnostics.take()
    }

    pub fn on_heater_change(&mut self, listener: impl FnMut(&Heater) + Send + 'static) {
        self.heater.status_mut().add_listener(listener);
    }

    pub fn on_timer_change(&mut self, listener: impl FnMut(&Timer) + Send + 'static) {
        self.timer.status_mut().add_listener(listener);
    }

    pub fn on_aircon_manual_change(
        &mut self,
        listener: impl FnMut(&AirconManual) + Send + 'static,
    ) {
        self.aircon_manual.status_mut().add_listener(listener);
    }

    pub fn on_clock_change(&mut self, listener: impl FnMut(&Clock) + Send + 'static) {
        self.clock.add_listener(listener);
    }

    pub fn on_panel_config_change(&mut self, listener: impl FnMut(&PanelConfig) + Send + 'static) {
        self.panel_config.add_listener(listener);
    }

    /// Answer a "read state buffer" request with the most urgent pending frame.
    fn answer_read(&mut self) -> Option<FrameBuffer> {
        let frame = match self.next_pending() {
            None => {
                self.diagnostics.push(Diagnostic::NothingToSend);
                return None;
            }
            Some(Pending::Init) => {
                self.diagnostics.push(Diagnostic::InitRequested);
                return Some(frame::encode_init_request(
                    SID_STATE_BUFFER_RESPONSE,
                    self.handshake.next_counter(),
                ));
            }
            Some(Pending::Heater) => {
                let update = self.heater.mark_sent();
                self.encode_update(Domain::Heater, &update)
            }
            Some(Pending::Timer) => {
                let update = self.timer.mark_sent();
                self.encode_update(Domain::Timer, &update)
            }
            Some(Pending::AirconManual) => {
                let update = self.aircon_manual.mark_sent();
                self.encode_update(Domain::AirconManual, &update)
            }
            Some(Pending::Clock) => {
                let mode = self.clock_write.take().unwrap_or_default();
                // the time is read at the last moment
                match self.time_source.as_ref().and_then(|source| source.now()) {
                    Some(time) => {
                        let update = ClockUpdate {
                            hour: time.hour,
                            minute: time.minute,
                            second: time.second,
                            mode,
                        };
                        self.encode_update(Domain::Clock, &update)
                    }
                    None => {
                        self.diagnostics.push(Diagnostic::TimeUnavailable);
                        return None;
                    }
                }
            }
        };
        Some(frame)
    }

    fn encode_update<R: Record>(&mut self, domain: Domain, update: &R) -> FrameBuffer {
        self.handshake.update_sent();
        self.diagnostics.push(Diagnostic::UpdateSent(domain));
        frame::encode_frame(SID_STATE_BUFFER_RESPONSE, self.handshake.next_counter(), update)
    }

    /// Decode the record of an already validated frame, queuing the error on failure.
    fn decode<R: Record>(&mut self, payload: &[u8]) -> Option<R> {
        frame::decode_record(payload)
            .map_err(|e| self.diagnostics.push(Diagnostic::FrameRejected(e)))
            .ok()
    }

    fn on_device(&mut self, device: Device, now: Instant) {
        self.handshake.init_received(now);
        self.diagnostics.push(Diagnostic::DeviceEnumerated {
            device_id: device.device_id,
            device_count: device.device_count,
            software_revision: device.software_revision,
            hardware_revision: (
                device.hardware_revision_major,
                device.hardware_revision_minor,
            ),
        });

        if !DeviceClass::of(&device).is_known() || device.reserved_2 != 0 {
            self.diagnostics.push(Diagnostic::UnknownDeviceInfo {
                device_id: device.device_id,
                class: device.software_revision[0],
                reserved: device.reserved_2,
            });
        }

        if !self.registry.register(device) {
            self.diagnostics.push(Diagnostic::RegistryFull {
                device_id: device.device_id,
            });
        }
    }

    fn on_response_ack(&mut self, header: &Header, ack: ResponseAck, now: Instant) {
        self.diagnostics.push(Diagnostic::WriteAcknowledged {
            command_counter: header.command_counter,
            result: ack.result,
        });
        if ack.result != AckResult::Okay {
            self.reset(now);
            self.diagnostics.push(Diagnostic::SessionReset);
        }
    }

    /// Handle a validated status frame. Returns `None` if the payload didn't decode.
    fn on_status_frame(&mut self, message: &[u8], header: &Header, now: Instant) -> Option<()> {
        let payload = frame::payload(message, header);
        let domain = if header.is::<Heater>() {
            let status = self.decode(payload)?;
            self.heater.apply(status);
            Domain::Heater
        } else if header.is::<Timer>() {
            let status = self.decode(payload)?;
            self.timer.apply(status);
            Domain::Timer
        } else if header.is::<AirconManual>() {
            let status = self.decode(payload)?;
            self.aircon_manual.apply(status);
            Domain::AirconManual
        } else if header.is::<Clock>() {
            let status = self.decode(payload)?;
            self.clock.apply(status);
            Domain::Clock
        } else if header.is::<PanelConfig>() {
            let status = self.decode(payload)?;
            self.panel_config.apply(status);
            Domain::Config
        } else if header.is::<Device>() {
            let device = self.decode(payload)?;
            self.on_device(device, now);
            return Some(());
        } else if header.is::<ResponseAck>() {
            let ack = self.decode(payload)?;
            self.on_response_ack(header, ack, now);
            return Some(());
        } else if is_ignored(header) {
            self.diagnostics.push(Diagnostic::Ignored {
                message_type: header.message_type,
            });
            return Some(());
        } else {
            self.diagnostics.push(Diagnostic::UnknownMessage {
                message_type: header.message_type,
                message_length: header.message_length,
            });
            return Some(());
        };
        self.diagnostics.push(Diagnostic::StatusReceived(domain));
        Some(())
    }
}

/// Frames the panel sends that we acknowledge without decoding.
fn is_ignored(header: &Header) -> bool {
    let key = (header.message_type, usize::from(header.message_length));
    key == (frame::MESSAGE_TYPE_AIRCON_AUTO, frame::MESSAGE_LEN_AIRCON_AUTO)
        || key == (frame::MESSAGE_TYPE_AIRCON_MANUAL_INIT, frame::MESSAGE_LEN_AIRCON_MANUAL_INIT)
        || key == (frame::MESSAGE_TYPE_AIRCON_AUTO_INIT, frame::MESSAGE_LEN_AIRCON_AUTO_INIT)
}

impl LinNode for InetBox {
    fn handle_poll(&mut self, pid: u8, now: Instant) -> Option<[u8; 8]> {
        if pid != LIN_PID_TRUMA_INET_BOX {
            return None;
        }
        let mut response = POLL_RESPONSE;
        if !self.should_offer_update(now) {
            response[0] = POLL_NOTHING_TO_SEND;
        }
        Some(response)
    }

    fn handle_message(&mut self, message: &[u8], now: Instant) -> Option<FrameBuffer> {
        // Anything without our preamble is for some other service.
        frame::check_preamble(message).ok()?;

        if message[0] == LIN_SID_READ_STATE_BUFFER {
            return self.answer_read();
        }

        let header = match frame::decode_header(message) {
            Ok(header) => header,
            Err(FrameError::TooShort { .. }) | Err(FrameError::Truncated { .. })
                if message[0] != LIN_SID_FILL_STATE_BUFFER =>
            {
                return None;
            }
            Err(e) => {
                self.diagnostics.push(Diagnostic::FrameRejected(e));
                return None;
            }
        };

        self.on_status_frame(message, &header, now)?;
        Some(FrameBuffer::from_byte(
            header.service_identifier | LIN_SID_RESPONSE,
        ))
    }

    fn handle_identity_read(&mut self, identifier: u8) -> Option<[u8; 5]> {
        let [a, b, c, d] = self.config.identifier;
        match identifier {
            IDENTITY_PRODUCT => Some([a, b, c, d, self.config.variant]),
            // the panel only displays the first three bytes
            IDENTITY_PANEL_DISPLAY => Some([a, b, c, 0xFF, 0xFF]),
            IDENTITY_UNKNOWN_22 => Some([0xFF; 5]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::LocalTime;
    use core::time::Duration;

    const READ: [u8; 11] = [
        0xBA, 0x00, 0x1F, 0x00, 0x1E, 0x00, 0x00, 0x22, 0xFF, 0xFF, 0xFF,
    ];

    fn initialized(now: Instant) -> InetBox {
        let mut node = InetBox::new(Config::default());
        let device = Device {
            device_count: 1,
            software_revision: [0x04, 0x03, 0x02],
            ..Device::default()
        };
        let frame = frame::encode_frame(LIN_SID_FILL_STATE_BUFFER, 0, &device);
        assert_eq!(node.handle_message(&frame, now).as_deref(), Some(&[0xFB][..]));
        node
    }

    #[test]
    fn test_poll_other_pid() {
        let mut node = InetBox::new(Config::default());
        assert_eq!(node.handle_poll(0x19, Instant::default()), None);
    }

    #[test]
    fn test_identity_read() {
        let mut node = InetBox::new(Config::default());
        assert_eq!(
            node.handle_identity_read(0x00),
            Some([0x17, 0x46, 0x00, 0x1F, 0x01])
        );
        assert_eq!(
            node.handle_identity_read(0x20),
            Some([0x17, 0x46, 0x00, 0xFF, 0xFF])
        );
        assert!(node.handle_identity_read(0x22).is_some());
        assert_eq!(node.handle_identity_read(0x21), None);
    }

    #[test]
    fn test_init_until_enumerated() {
        let now = Instant::from_millis(1);
        let mut node = InetBox::new(Config::default());
        assert_eq!(node.next_pending(), Some(Pending::Init));

        let frame = node.handle_message(&READ, now).unwrap();
        assert_eq!(frame[0], SID_STATE_BUFFER_RESPONSE);
        assert_eq!(frame[14], frame::MESSAGE_TYPE_INIT_REQUEST);
        // counter advances with every frame
        let frame = node.handle_message(&READ, now).unwrap();
        assert_eq!(frame[15], 1);

        let mut node = initialized(now);
        assert_eq!(node.next_pending(), None);
        assert_eq!(node.handle_message(&READ, now), None);
        assert!(node
            .diagnostics()
            .iter()
            .any(|d| *d == Diagnostic::NothingToSend));
    }

    #[test]
    fn test_reject_wrong_preamble() {
        let mut node = InetBox::new(Config::default());
        let mut read = READ;
        read[4] = 0x00;
        assert_eq!(node.handle_message(&read, Instant::default()), None);
        assert_eq!(node.handle_message(&READ[..5], Instant::default()), None);
        assert!(node.diagnostics().is_empty());
    }

    #[test]
    fn test_reject_short_fill() {
        let now = Instant::default();
        let mut node = InetBox::new(Config::default());
        let frame = frame::encode_frame(LIN_SID_FILL_STATE_BUFFER, 0, &Heater::default());
        assert_eq!(node.handle_message(&frame[..frame.len() - 1], now), None);
        assert!(matches!(
            node.diagnostics().iter().next(),
            Some(Diagnostic::FrameRejected(FrameError::Truncated { .. }))
        ));
        assert!(!node.heater().is_valid());
    }

    #[test]
    fn test_clock_write_needs_time_source() {
        let now = Instant::default();
        let mut node = initialized(now);
        node.clock_write = Some(ClockMode::H12);
        assert_eq!(node.next_pending(), None);

        let mut node = initialized(now).with_time_source(|| {
            Some(LocalTime {
                hour: 7,
                minute: 8,
                second: 9,
            })
        });
        node.clock_write = Some(ClockMode::H12);
        assert_eq!(node.next_pending(), Some(Pending::Clock));
        let frame = node.handle_message(&READ, now).unwrap();
        assert_eq!(&frame[14..15], &[ClockUpdate::MESSAGE_TYPE]);
        assert_eq!(&frame[17..24], &[7, 8, 9, 1, 1, 0, 1]);
        assert!(!node.is_clock_write_pending());
    }

    #[test]
    fn test_clock_sync_once() {
        let t0 = Instant::from_millis(100);
        let mut node = initialized(t0).with_time_source(|| Some(LocalTime::default()));
        let clock = Clock {
            hour: 1,
            mode: ClockMode::H12,
            ..Clock::default()
        };
        let frame = frame::encode_frame(LIN_SID_FILL_STATE_BUFFER, 0, &clock);
        node.handle_message(&frame, t0).unwrap();

        node.tick(t0 + Duration::from_secs(30));
        assert!(!node.is_clock_write_pending());
        node.tick(t0 + Duration::from_secs(31));
        assert_eq!(node.clock_write, Some(ClockMode::H12));

        node.handle_message(&READ, t0 + Duration::from_secs(32)).unwrap();
        node.tick(t0 + Duration::from_secs(100));
        assert!(!node.is_clock_write_pending());
    }

    #[test]
    fn test_heartbeat() {
        let mut node = InetBox::new(Config::default());
        node.heartbeat(Instant::from_millis(5));
        assert_eq!(
            node.handshake().device_registered_at,
            Some(Instant::from_millis(5))
        );
    }
}
