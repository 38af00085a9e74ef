//! Sans-io implementation of the Truma iNet Box side of the CP Plus LIN protocol.
//!
//! The CP Plus panel is the LIN master. It polls the iNet Box with PID
//! [`LIN_PID_TRUMA_INET_BOX`], broadcasts status frames (heater, timer,
//! air-con, clock, configuration) with the "fill state buffer" service, and
//! collects our write requests with the "read state buffer" service.
//!
//! [`InetBox`] implements [`LinNode`], the three callbacks a LIN transport
//! needs. The transport itself (UART, break detection, LIN checksums and
//! multi-frame reassembly) is not part of this crate.
//!
//! ```
//! use truma_inetbox::{Config, InetBox, Instant, LinNode};
//!
//! let mut node = InetBox::new(Config::default());
//! node.on_heater_change(|heater| {
//!     println!("room {:?}", heater.current_temp_room.to_celsius());
//! });
//! # let now = Instant::from_millis(0);
//! // from the bus callback:
//! assert!(node.handle_identity_read(0x00).is_some());
//! // from the main loop:
//! node.tick(now);
//! ```

mod actions;
mod buffer;
pub mod clock;
mod config;
pub mod diag;
pub mod frame;
pub mod handshake;
mod node;
mod nom_parser;
pub mod records;
pub mod registry;
pub mod storage;
pub mod types;

pub use actions::ActionError;
pub use buffer::{FrameBuffer, MAX_FRAME_LEN};
pub use clock::{LocalTime, TimeSource};
pub use config::{Config, INET_BOX_IDENTIFIER, INET_BOX_VARIANT};
pub use frame::FrameError;
pub use node::{InetBox, LinNode, Pending};
pub use types::{
    AckResult, AirconMode, ClockMode, ClockSource, EnergyMix, HeatingMode, Instant, Language,
    PowerLevel, TempCode, TimeOfDay,
};

/// PID the panel polls the iNet Box with.
pub const LIN_PID_TRUMA_INET_BOX: u8 = 0x18;
/// Service identifier of the panel collecting our state buffer.
pub const LIN_SID_READ_STATE_BUFFER: u8 = 0xBA;
/// Service identifier of the panel's status broadcasts.
pub const LIN_SID_FILL_STATE_BUFFER: u8 = 0xBB;
/// Set in the service identifier of a positive response. This is the LIN
/// positive-response offset (RSID = SID + 0x40), so `0xBB` is answered with `0xFB`.
pub const LIN_SID_RESPONSE: u8 = 0x40;
