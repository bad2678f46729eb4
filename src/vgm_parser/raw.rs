//! Raw packet capture format
//!
//! A byte-per-write dump of the same song a VGM file describes, one length-prefixed packet per
//! playback tick. It carries no waits, so it serves as an independent reference for the VGM
//! frame builder.
//!
//! Layout:
//! ```text
//! [headerLen][rate][count lo][count hi][minutes][seconds] ...   (headerLen + 1 bytes)
//! [titleLen][title][authorLen][author]
//! count x [len][bytes]
//! [0x00][0xFF]
//! ```

use super::{FormatParser, Frame};
use crate::{Result, Sn76489Error};
use nom::bytes::complete::{tag, take};
use nom::multi::{count, length_data};
use nom::number::complete::{le_u16, u8 as byte};
use nom::sequence::tuple;
use nom::IResult;

/// Trailer that must follow the last packet
pub const RAW_SENTINEL: [u8; 2] = [0x00, 0xFF];

/// Header length written by [`RawCapture::to_bytes`]
pub const RAW_HEADER_LEN: u8 = 5;

/// Decoded raw capture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCapture {
    /// Playback rate in Hz
    pub rate: u8,
    /// Song length, minutes part
    pub minutes: u8,
    /// Song length, seconds part
    pub seconds: u8,
    /// Title bytes as text
    pub title: String,
    /// Author bytes as text
    pub author: String,
    /// One frame per packet
    pub frames: Vec<Frame>,
}

struct Preamble<'a> {
    rate: u8,
    packets: u16,
    minutes: u8,
    seconds: u8,
    title: &'a [u8],
    author: &'a [u8],
}

fn preamble(input: &[u8]) -> IResult<&[u8], Preamble<'_>> {
    let (rest, header_len) = byte(input)?;
    let (after_header, header) = take(header_len as usize)(rest)?;
    let (_, (rate, packets, minutes, seconds)) = tuple((byte, le_u16, byte, byte))(header)?;
    let (rest, title) = length_data(byte)(after_header)?;
    let (rest, author) = length_data(byte)(rest)?;
    Ok((
        rest,
        Preamble {
            rate,
            packets,
            minutes,
            seconds,
            title,
            author,
        },
    ))
}

fn packets(input: &[u8], n: usize) -> IResult<&[u8], Vec<&[u8]>> {
    count(length_data(byte), n)(input)
}

impl RawCapture {
    /// Decode a capture image
    pub fn parse(data: &[u8]) -> Result<Self> {
        let (rest, pre) = preamble(data).map_err(|_| {
            Sn76489Error::FormatError("Raw capture too small for header".into())
        })?;

        let (rest, body) = packets(rest, pre.packets as usize).map_err(|_| {
            Sn76489Error::FormatError(format!(
                "Raw capture declares {} packets but the data ends early",
                pre.packets
            ))
        })?;

        let sentinel: IResult<&[u8], &[u8]> = tag(&RAW_SENTINEL[..])(rest);
        if sentinel.is_err() {
            return Err(Sn76489Error::FormatError(format!(
                "Raw capture sentinel missing after {} packets (found {:02X?})",
                pre.packets,
                &rest[..rest.len().min(2)]
            )));
        }

        Ok(RawCapture {
            rate: pre.rate,
            minutes: pre.minutes,
            seconds: pre.seconds,
            title: String::from_utf8_lossy(pre.title).into_owned(),
            author: String::from_utf8_lossy(pre.author).into_owned(),
            frames: body.into_iter().map(|p| p.to_vec()).collect(),
        })
    }

    /// Encode to the capture layout
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let packets = u16::try_from(self.frames.len()).map_err(|_| {
            Sn76489Error::FormatError(format!("{} packets exceed u16", self.frames.len()))
        })?;
        let short = |what: &str, len: usize| {
            Sn76489Error::FormatError(format!("{} of {} bytes exceeds 255", what, len))
        };

        let mut out = vec![RAW_HEADER_LEN, self.rate];
        out.extend_from_slice(&packets.to_le_bytes());
        out.extend_from_slice(&[self.minutes, self.seconds]);
        for text in [&self.title, &self.author] {
            let len = u8::try_from(text.len()).map_err(|_| short("text field", text.len()))?;
            out.push(len);
            out.extend_from_slice(text.as_bytes());
        }
        for frame in &self.frames {
            let len = u8::try_from(frame.len()).map_err(|_| short("packet", frame.len()))?;
            out.push(len);
            out.extend_from_slice(frame);
        }
        out.extend_from_slice(&RAW_SENTINEL);
        Ok(out)
    }
}

/// Raw capture [`FormatParser`]
pub struct RawParser;

impl RawParser {
    /// Create a new raw capture parser
    pub fn new() -> Self {
        RawParser
    }
}

impl Default for RawParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatParser for RawParser {
    fn parse(&self, data: &[u8]) -> Result<Vec<Frame>> {
        Ok(RawCapture::parse(data)?.frames)
    }

    fn name(&self) -> &str {
        "Raw Packet Capture Parser"
    }
}
