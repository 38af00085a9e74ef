#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use truma_inetbox::frame::{encode_frame, Record};
use truma_inetbox::{
    Instant, LinNode, LocalTime, TimeSource, LIN_PID_TRUMA_INET_BOX, LIN_SID_FILL_STATE_BUFFER,
};

/// Frames captured from a CP Plus, as printed by a bus sniffer.
pub mod captures {
    pub const HEATER: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.14.33.00.12.00.00.00.00.00.00.00.00.00.00.01.01.CC.0B.6C.0B.00.00.00.00";
    pub const TIMER: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.18.3D.00.1D.18.0B.01.00.00.00.00.00.00.00.01.01.00.00.00.00.00.00.00.01.00.08.00.09";
    pub const AIRCON_MANUAL: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.12.35.00.4B.05.00.71.01.4A.0B.00.00.8B.0B.00.00.00.00.00.00.AA.0A";
    pub const AIRCON_MANUAL_INIT: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.16.3F.00.E2.00.00.71.01.00.00.00.00.00.00.00.00.00.00.00.00.00.00.00.00.00.00";
    pub const AIRCON_AUTO: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.12.37.00.BF.01.00.01.00.00.00.00.00.00.00.00.00.00.00.49.0B.40.0B";
    pub const AIRCON_AUTO_INIT: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.14.41.00.53.01.00.01.00.00.00.00.00.00.00.00.00.00.00.00.00.00.00.00.00";
    pub const CLOCK: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0A.15.00.2B.16.1F.28.01.01.00.00.01.00.00";
    pub const CONFIG: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0A.17.00.41.06.01.B4.0A.78.0A.00.00.00.00";
    /// Rejected write (result 0x02).
    pub const ACK_FAILED: &str = "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.02.0D.01.98.02.00";

    /// Combi 4 setup: panel and heater.
    pub const DEVICES_COMBI4: [&str; 2] = [
        "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0C.0B.00.79.02.00.01.00.50.00.00.04.03.02.AD.10",
        "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0C.0B.00.27.02.01.01.00.40.03.22.02.00.01.00.00",
    ];
    /// VarioHeat Comfort without E-Kit.
    pub const DEVICES_VARIO: [&str; 2] = [
        "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0C.0B.00.C2.02.00.01.00.51.00.00.05.01.00.66.10",
        "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0C.0B.00.64.02.01.01.00.20.06.02.03.00.00.00.00",
    ];
    /// Combi 6DE with a Saphir Compact air-con.
    pub const DEVICES_COMBI6D_AIRCON: [&str; 3] = [
        "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0C.0B.00.C7.03.00.01.00.50.00.00.04.03.00.60.10",
        "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0C.0B.00.71.03.01.01.00.10.03.02.06.00.02.00.00",
        "BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.0C.0B.00.7C.03.02.01.00.01.0C.00.01.02.01.00.00",
    ];

    pub const ALL: [&str; 16] = [
        HEATER,
        TIMER,
        AIRCON_MANUAL,
        AIRCON_MANUAL_INIT,
        AIRCON_AUTO,
        AIRCON_AUTO_INIT,
        CLOCK,
        CONFIG,
        ACK_FAILED,
        DEVICES_COMBI4[0],
        DEVICES_COMBI4[1],
        DEVICES_VARIO[0],
        DEVICES_VARIO[1],
        DEVICES_COMBI6D_AIRCON[0],
        DEVICES_COMBI6D_AIRCON[1],
        DEVICES_COMBI6D_AIRCON[2],
    ];
}

/// "Read state buffer" request of the panel.
pub const READ_STATE_BUFFER: [u8; 11] = [
    0xBA, 0x00, 0x1F, 0x00, 0x1E, 0x00, 0x00, 0x22, 0xFF, 0xFF, 0xFF,
];

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parse a dotted hex capture like `BB.00.1F`.
pub fn parse_capture(capture: &str) -> Vec<u8> {
    capture
        .split('.')
        .map(|b| u8::from_str_radix(b, 16).expect("Invalid hex in capture"))
        .collect()
}

/// A status broadcast as the panel would send it.
pub fn status_frame<R: Record>(record: &R) -> Vec<u8> {
    encode_frame(LIN_SID_FILL_STATE_BUFFER, 0, record).to_vec()
}

pub fn secs(s: u64) -> Instant {
    Instant::from_millis(s * 1000)
}

/// Time source whose time the test sets.
#[derive(Clone, Default)]
pub struct FakeClock(Arc<Mutex<Option<LocalTime>>>);

impl FakeClock {
    pub fn set(&self, hour: u8, minute: u8, second: u8) {
        *self.0.lock().unwrap() = Some(LocalTime {
            hour,
            minute,
            second,
        });
    }
}

impl TimeSource for FakeClock {
    fn now(&self) -> Option<LocalTime> {
        *self.0.lock().unwrap()
    }
}

/// The master side of the bus, driving a node the way a CP Plus does.
pub struct Panel<'a> {
    node: &'a mut dyn LinNode,
    pub now: Instant,
}

impl<'a> Panel<'a> {
    pub fn new(node: &'a mut dyn LinNode, now: Instant) -> Self {
        Panel { node, now }
    }

    /// Poll the node. Returns `true` if it signals data to collect.
    pub fn poll(&mut self) -> bool {
        let answer = self
            .node
            .handle_poll(LIN_PID_TRUMA_INET_BOX, self.now)
            .expect("Node didn't answer its PID");
        answer[0] == 0x00
    }

    /// Collect the node's state buffer.
    pub fn read(&mut self) -> Option<Vec<u8>> {
        self.node
            .handle_message(&READ_STATE_BUFFER, self.now)
            .map(|f| f.to_vec())
    }

    /// Send a frame, returning the node's answer.
    pub fn send(&mut self, frame: &[u8]) -> Option<Vec<u8>> {
        self.node.handle_message(frame, self.now).map(|f| f.to_vec())
    }

    pub fn send_capture(&mut self, capture: &str) -> Option<Vec<u8>> {
        self.send(&parse_capture(capture))
    }

    /// Enumerate the given devices, checking every frame gets acknowledged.
    pub fn enumerate(&mut self, devices: &[&str]) {
        for device in devices {
            assert_eq!(self.send_capture(device), Some(vec![0xFB]));
        }
    }
}
