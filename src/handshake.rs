//! Timing of the init handshake and of the "I have updates" announcements.

use crate::config::Config;
use crate::types::Instant;

/// Session timestamps. `None` means "never".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Last time the node was (re)registered with the panel.
    pub device_registered_at: Option<Instant>,
    /// Last time we asked the panel for its initial data.
    pub init_requested_at: Option<Instant>,
    /// Last device enumeration frame from the panel.
    pub init_received_at: Option<Instant>,
    /// Last time a pending write was announced.
    pub update_notified_at: Option<Instant>,
    /// Command counter of the next outbound frame.
    pub message_counter: u8,
}

impl Handshake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether the idle poll answer should announce data.
    ///
    /// The first call asks for the panel's initial data. Until the device
    /// enumeration arrives the request is repeated every `init_retry`.
    /// After that, pending writes are announced and re-announced every
    /// `update_retry` until the panel collects them.
    pub fn should_offer_update(&mut self, now: Instant, has_pending: bool, config: &Config) -> bool {
        match (self.init_requested_at, self.init_received_at) {
            (None, _) => {
                self.init_requested_at = Some(now);
                true
            }
            (Some(requested), None) => {
                if now.has_elapsed(requested, config.init_retry) {
                    self.init_requested_at = Some(now);
                    true
                } else {
                    false
                }
            }
            (Some(_), Some(_)) if has_pending => match self.update_notified_at {
                Some(notified) if !now.has_elapsed(notified, config.update_retry) => false,
                _ => {
                    self.update_notified_at = Some(now);
                    true
                }
            },
            _ => false,
        }
    }

    /// The panel sent its device enumeration.
    pub fn init_received(&mut self, now: Instant) {
        self.init_received_at = Some(now);
    }

    pub fn is_initialized(&self) -> bool {
        self.init_received_at.is_some()
    }

    /// A write was collected by the panel, the next one gets announced right away.
    pub fn update_sent(&mut self) {
        self.update_notified_at = None;
    }

    /// Counter value for the next outbound frame.
    pub fn next_counter(&mut self) -> u8 {
        let counter = self.message_counter;
        self.message_counter = self.message_counter.wrapping_add(1);
        counter
    }

    /// Restart the handshake from the beginning.
    pub fn reset(&mut self, now: Instant) {
        *self = Self {
            device_registered_at: Some(now),
            ..Self::default()
        };
    }
}
