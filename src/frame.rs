//! Status frame layer: the checksum, the fixed header and the generic
//! encode/decode of payload records.
//!
//! ```text
//! SID<---------PREAMBLE---------->|<---MSG_HEAD---->|payload...
//! BB.00.1F.00.1E.00.00.22.FF.FF.FF.54.01.14.33.00.12.00.00...
//!                                  T  01 len typ cnt chk
//! ```

use nom::combinator::all_consuming;
use nom::IResult;
use snafu::{ensure, Snafu};

use crate::buffer::FrameBuffer;
use crate::nom_parser;

/// Bytes every status frame starts with. Byte 0 is the service identifier and
/// is not compared.
pub const PREAMBLE: [u8; 11] = [
    0x00, 0x00, 0x1F, 0x00, 0x1E, 0x00, 0x00, 0x22, 0xFF, 0xFF, 0xFF,
];
/// The two tag bytes following the preamble.
pub const HEADER_TAG: [u8; 2] = [b'T', 0x01];
/// Preamble, tag, length, type, counter and checksum.
pub const HEADER_LEN: usize = 17;

const CHECKSUM_START: usize = 10;
const CHECKSUM_POS: usize = 16;
const CHECKSUM_OK: u8 = 0xFF;

/// Message type of the "send me your initial data" request. It has no payload.
pub const MESSAGE_TYPE_INIT_REQUEST: u8 = 0x0A;
/// Air-con auto status, acknowledged but not decoded.
pub const MESSAGE_TYPE_AIRCON_AUTO: u8 = 0x37;
pub const MESSAGE_LEN_AIRCON_AUTO: usize = 18;
/// Air-con manual init data, acknowledged but not decoded.
pub const MESSAGE_TYPE_AIRCON_MANUAL_INIT: u8 = 0x3F;
pub const MESSAGE_LEN_AIRCON_MANUAL_INIT: usize = 22;
/// Air-con auto init data, acknowledged but not decoded.
pub const MESSAGE_TYPE_AIRCON_AUTO_INIT: u8 = 0x41;
pub const MESSAGE_LEN_AIRCON_AUTO_INIT: usize = 20;

/// Error type for this module
#[derive(Debug, Snafu, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum FrameError {
    /// The message is shorter than the fixed header.
    #[snafu(display("Frame too short: {} bytes", len))]
    TooShort { len: usize },
    /// A preamble byte doesn't match.
    #[snafu(display("Invalid preamble at byte {}", position))]
    InvalidPreamble { position: usize },
    /// The tag bytes after the preamble don't match.
    #[snafu(display("Invalid header tag"))]
    InvalidTag,
    /// The header declares more payload than was received.
    #[snafu(display("Frame truncated: {} payload bytes declared, {} received", declared, received))]
    Truncated { declared: usize, received: usize },
    /// The frame checksum doesn't add up.
    #[snafu(display("Checksum mismatch (sum {:#04x})", sum))]
    ChecksumMismatch { sum: u8 },
    /// The payload length doesn't match the record layout.
    #[snafu(display("Payload length {} doesn't match record length {}", actual, expected))]
    LengthMismatch { expected: usize, actual: usize },
    /// The payload couldn't be parsed.
    #[snafu(display("Malformed payload"))]
    Malformed,
}

/// One's-complement byte sum: a carry out of the top bit is added back in.
///
/// A frame is valid when the sum over everything from the last preamble byte
/// to the end of the payload, checksum byte included, is `0xFF`.
pub fn checksum(bytes: &[u8], seed: u8) -> u8 {
    bytes.iter().fold(seed, |acc, &byte| {
        let (sum, carry) = acc.overflowing_add(byte);
        sum + u8::from(carry)
    })
}

/// Check the checksum of a complete frame, header included.
pub fn verify_checksum(frame: &[u8]) -> bool {
    frame.len() > CHECKSUM_POS && checksum(&frame[CHECKSUM_START..], 0) == CHECKSUM_OK
}

/// Fill in the checksum byte of a complete frame, header included.
pub(crate) fn stamp_checksum(frame: &mut [u8]) {
    frame[CHECKSUM_POS] = 0;
    let sum = checksum(&frame[CHECKSUM_START..], 0);
    frame[CHECKSUM_POS] = CHECKSUM_OK - sum;
}

/// The decoded fixed header of a status frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub service_identifier: u8,
    pub message_length: u8,
    pub message_type: u8,
    pub command_counter: u8,
    pub checksum: u8,
}

impl Header {
    /// Total frame length according to the header.
    pub fn frame_len(&self) -> usize {
        HEADER_LEN + usize::from(self.message_length)
    }

    /// `true` if this header announces a record of type `R`.
    pub fn is<R: Record>(&self) -> bool {
        self.message_type == R::MESSAGE_TYPE && usize::from(self.message_length) == R::LEN
    }
}

/// Check that `bytes` starts with the preamble, ignoring the service identifier.
pub fn check_preamble(bytes: &[u8]) -> Result<(), FrameError> {
    ensure!(
        bytes.len() >= PREAMBLE.len(),
        TooShortSnafu { len: bytes.len() }
    );
    match (1..PREAMBLE.len()).find(|&i| bytes[i] != PREAMBLE[i]) {
        Some(position) => InvalidPreambleSnafu { position }.fail(),
        None => Ok(()),
    }
}

/// Decode and validate the header of a status frame.
///
/// Fails if the buffer is shorter than the header or the payload it declares,
/// if the preamble or tag bytes are wrong, or if the checksum doesn't match.
pub fn decode_header(bytes: &[u8]) -> Result<Header, FrameError> {
    ensure!(bytes.len() >= HEADER_LEN, TooShortSnafu { len: bytes.len() });
    check_preamble(bytes)?;

    let (_, (header, tag)) = nom_parser::header(bytes).map_err(|_| FrameError::Malformed)?;
    ensure!(tag == HEADER_TAG, InvalidTagSnafu);

    let received = bytes.len() - HEADER_LEN;
    ensure!(
        received >= usize::from(header.message_length),
        TruncatedSnafu {
            declared: usize::from(header.message_length),
            received,
        }
    );

    let sum = checksum(&bytes[CHECKSUM_START..header.frame_len()], 0);
    ensure!(sum == CHECKSUM_OK, ChecksumMismatchSnafu { sum });

    Ok(header)
}

/// The payload slice of a frame whose header was decoded by [`decode_header`].
pub fn payload<'a>(bytes: &'a [u8], header: &Header) -> &'a [u8] {
    &bytes[HEADER_LEN..header.frame_len()]
}

/// A fixed-layout payload record, keyed by its message type and length.
pub trait Record: Sized {
    const MESSAGE_TYPE: u8;
    const LEN: usize;

    /// Parse the record from exactly `LEN` payload bytes.
    fn parse(buf: &[u8]) -> IResult<&[u8], Self>;

    /// Append the record's `LEN` bytes to `out`.
    fn write(&self, out: &mut FrameBuffer);
}

/// Decode a payload into a record of type `R`.
pub fn decode_record<R: Record>(payload: &[u8]) -> Result<R, FrameError> {
    ensure!(
        payload.len() == R::LEN,
        LengthMismatchSnafu {
            expected: R::LEN,
            actual: payload.len(),
        }
    );
    let (_, record) = all_consuming(R::parse)(payload).map_err(|_| FrameError::Malformed)?;
    Ok(record)
}

fn write_header(
    out: &mut FrameBuffer,
    service_identifier: u8,
    message_type: u8,
    message_length: usize,
    command_counter: u8,
) {
    out.push(service_identifier);
    out.write(&PREAMBLE[1..]);
    out.write(&HEADER_TAG);
    out.push(message_length as u8);
    out.push(message_type);
    out.push(command_counter);
    out.push(0); // checksum, stamped last
}

/// Build a complete, checksummed status frame carrying `record`.
pub fn encode_frame<R: Record>(service_identifier: u8, command_counter: u8, record: &R) -> FrameBuffer {
    let mut out = FrameBuffer::new();
    write_header(&mut out, service_identifier, R::MESSAGE_TYPE, R::LEN, command_counter);
    record.write(&mut out);
    debug_assert_eq!(out.len(), HEADER_LEN + R::LEN);
    stamp_checksum(out.as_mut_slice());
    out
}

/// Build the payload-less frame asking the panel for its initial data.
pub fn encode_init_request(service_identifier: u8, command_counter: u8) -> FrameBuffer {
    let mut out = FrameBuffer::new();
    write_header(
        &mut out,
        service_identifier,
        MESSAGE_TYPE_INIT_REQUEST,
        0,
        command_counter,
    );
    stamp_checksum(out.as_mut_slice());
    out
}
