use arrayvec::ArrayVec;
use core::ops::Deref;

/// Largest frame the node ever puts on the bus: header plus the biggest payload,
/// rounded up to the transport's buffer size.
pub const MAX_FRAME_LEN: usize = 48;

/// Fixed-capacity buffer for an outbound response. Building a response never
/// allocates, so it is safe to do from the bus callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    data: ArrayVec<u8, MAX_FRAME_LEN>,
}

impl FrameBuffer {
    pub fn new() -> FrameBuffer {
        FrameBuffer {
            data: ArrayVec::new(),
        }
    }

    /// A single byte response, like the plain acknowledgement.
    pub fn from_byte(byte: u8) -> FrameBuffer {
        let mut buf = FrameBuffer::new();
        buf.push(byte);
        buf
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }

    pub(crate) fn push(&mut self, byte: u8) {
        self.data.push(byte); // push panics on overflow
    }

    pub(crate) fn push_u16(&mut self, value: u16) {
        self.write(&value.to_le_bytes());
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) {
        self.data
            .try_extend_from_slice(bytes)
            .expect("BUG: Frame buffer too small.");
    }
}

impl Deref for FrameBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for FrameBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
