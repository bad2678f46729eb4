//! VGM command stream scanner
//!
//! Only the opcodes that drive a single SN76489 are accepted. Everything else, including the
//! Game Gear stereo byte and the short-wait range, is rejected so that a stream the renderer
//! cannot reproduce never decodes silently.

use crate::{Result, Sn76489Error};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::Serialize;

/// Supported opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum Opcode {
    /// `0x50 dd`: write `dd` to the PSG
    PsgWrite = 0x50,
    /// `0x61 nnnn`: wait `nnnn` samples
    Wait = 0x61,
    /// `0x62`: wait 735 samples (one 60 Hz frame)
    Wait60Hz = 0x62,
    /// `0x63`: wait 882 samples (one 50 Hz frame)
    Wait50Hz = 0x63,
    /// `0x66`: end of sound data
    EndOfStream = 0x66,
    /// `0x67 0x66 tt ssssssss`: data block
    DataBlock = 0x67,
}

impl Opcode {
    /// Fixed operand bytes following the opcode
    ///
    /// Data blocks report their fixed prefix; the payload length is read from it.
    pub const fn operand_len(self) -> usize {
        match self {
            Opcode::PsgWrite => 1,
            Opcode::Wait => 2,
            Opcode::Wait60Hz | Opcode::Wait50Hz | Opcode::EndOfStream => 0,
            Opcode::DataBlock => 6,
        }
    }
}

/// Samples waited by `0x62`
pub const SAMPLES_60HZ: u32 = 735;
/// Samples waited by `0x63`
pub const SAMPLES_50HZ: u32 = 882;

/// Which fixed-length wait was used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StandardWait {
    /// 735 samples
    Hz60,
    /// 882 samples
    Hz50,
}

impl StandardWait {
    /// Samples covered by this wait
    pub fn samples(self) -> u32 {
        match self {
            StandardWait::Hz60 => SAMPLES_60HZ,
            StandardWait::Hz50 => SAMPLES_50HZ,
        }
    }

    /// Playback rate this wait implies
    pub fn rate(self) -> u32 {
        match self {
            StandardWait::Hz60 => 60,
            StandardWait::Hz50 => 50,
        }
    }
}

/// One decoded command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Byte written to the PSG write port
    RegisterWrite(u8),
    /// Explicit wait in 44.1 kHz samples
    WaitExplicit(u16),
    /// Fixed 50/60 Hz wait
    WaitStandard(StandardWait),
    /// Auxiliary data block, kept but unused by the PSG
    DataBlock {
        /// Block type byte
        kind: u8,
        /// Payload
        data: Vec<u8>,
    },
    /// End of sound data
    EndOfStream,
}

impl Command {
    /// Samples this command waits, if it is a wait
    pub fn wait_samples(&self) -> Option<u32> {
        match self {
            Command::WaitExplicit(n) => Some(*n as u32),
            Command::WaitStandard(w) => Some(w.samples()),
            _ => None,
        }
    }
}

fn truncated(opcode: u8, offset: usize) -> Sn76489Error {
    Sn76489Error::FormatError(format!(
        "truncated operand for command 0x{:02X} at offset 0x{:X}",
        opcode, offset
    ))
}

/// Decode one command at `pos`, returning it and the position after it
pub fn decode_command(data: &[u8], pos: usize) -> Result<(Command, usize)> {
    let byte = data[pos];
    let opcode = Opcode::from_u8(byte).ok_or_else(|| {
        Sn76489Error::FormatError(format!(
            "unsupported command 0x{:02X} at offset 0x{:X}",
            byte, pos
        ))
    })?;

    let start = pos + 1;
    let end = start + opcode.operand_len();
    let operands = data.get(start..end).ok_or_else(|| truncated(byte, pos))?;

    let command = match opcode {
        Opcode::PsgWrite => Command::RegisterWrite(operands[0]),
        Opcode::Wait => Command::WaitExplicit(u16::from_le_bytes([operands[0], operands[1]])),
        Opcode::Wait60Hz => Command::WaitStandard(StandardWait::Hz60),
        Opcode::Wait50Hz => Command::WaitStandard(StandardWait::Hz50),
        Opcode::EndOfStream => Command::EndOfStream,
        Opcode::DataBlock => {
            if operands[0] != Opcode::EndOfStream as u8 {
                return Err(Sn76489Error::FormatError(format!(
                    "data block at offset 0x{:X} lacks its 0x66 guard byte",
                    pos
                )));
            }
            let kind = operands[1];
            let size =
                u32::from_le_bytes([operands[2], operands[3], operands[4], operands[5]]) as usize;
            let payload = end
                .checked_add(size)
                .and_then(|stop| data.get(end..stop))
                .ok_or_else(|| truncated(byte, pos))?;
            return Ok((
                Command::DataBlock {
                    kind,
                    data: payload.to_vec(),
                },
                end + size,
            ));
        }
    };
    Ok((command, end))
}

/// Scan a whole command region
///
/// Scanning stops after [`Command::EndOfStream`] or at the end of `data`.
pub fn decode_commands(data: &[u8]) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let (command, next) = decode_command(data, pos)?;
        let done = command == Command::EndOfStream;
        commands.push(command);
        if done {
            break;
        }
        pos = next;
    }
    Ok(commands)
}

/// Encode commands back into stream bytes
pub fn encode_commands(commands: &[Command]) -> Vec<u8> {
    let mut out = Vec::new();
    for command in commands {
        match command {
            Command::RegisterWrite(b) => out.extend_from_slice(&[Opcode::PsgWrite as u8, *b]),
            Command::WaitExplicit(n) => {
                out.push(Opcode::Wait as u8);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Command::WaitStandard(StandardWait::Hz60) => out.push(Opcode::Wait60Hz as u8),
            Command::WaitStandard(StandardWait::Hz50) => out.push(Opcode::Wait50Hz as u8),
            Command::DataBlock { kind, data } => {
                out.extend_from_slice(&[Opcode::DataBlock as u8, Opcode::EndOfStream as u8, *kind]);
                out.extend_from_slice(&(data.len() as u32).to_le_bytes());
                out.extend_from_slice(data);
            }
            Command::EndOfStream => out.push(Opcode::EndOfStream as u8),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mixed_stream() {
        let mut data = vec![0x50, 0x9F, 0x62, 0x63];
        data.push(0x61);
        data.extend_from_slice(&1470u16.to_le_bytes());
        data.extend_from_slice(&[0x67, 0x66, 0x00]);
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3]);
        data.push(0x66);
        data.extend_from_slice(&[0xFF, 0xFF]); // after end: never read

        let commands = decode_commands(&data).unwrap();
        assert_eq!(
            commands,
            vec![
                Command::RegisterWrite(0x9F),
                Command::WaitStandard(StandardWait::Hz60),
                Command::WaitStandard(StandardWait::Hz50),
                Command::WaitExplicit(1470),
                Command::DataBlock {
                    kind: 0,
                    data: vec![1, 2, 3]
                },
                Command::EndOfStream,
            ]
        );
    }

    #[test]
    fn test_unsupported_opcode_reports_offset() {
        let data = [0x50, 0x80, 0x4F, 0x00];
        let err = decode_commands(&data).unwrap_err();
        assert!(matches!(err, Sn76489Error::FormatError(_)));
        assert!(err.to_string().contains("0x4F"));
        assert!(err.to_string().contains("0x2"));
    }

    #[test]
    fn test_short_wait_range_rejected() {
        assert!(decode_commands(&[0x70]).is_err());
        assert!(decode_commands(&[0x7F]).is_err());
    }

    #[test]
    fn test_truncated_operands() {
        assert!(decode_commands(&[0x50]).is_err());
        assert!(decode_commands(&[0x61, 0x01]).is_err());
        let mut block = vec![0x67, 0x66, 0x00];
        block.extend_from_slice(&10u32.to_le_bytes());
        block.extend_from_slice(&[0; 4]);
        assert!(decode_commands(&block).is_err());
    }

    #[test]
    fn test_stream_without_end_marker() {
        let commands = decode_commands(&[0x50, 0x90, 0x62]).unwrap();
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn test_encode_matches_decode() {
        let commands = vec![
            Command::RegisterWrite(0x8E),
            Command::RegisterWrite(0x0F),
            Command::WaitExplicit(882 * 3),
            Command::WaitStandard(StandardWait::Hz50),
            Command::EndOfStream,
        ];
        let bytes = encode_commands(&commands);
        assert_eq!(bytes[0..2], [0x50, 0x8E]);
        assert_eq!(decode_commands(&bytes).unwrap(), commands);
    }

    #[test]
    fn test_wait_samples() {
        assert_eq!(Command::WaitExplicit(10).wait_samples(), Some(10));
        assert_eq!(
            Command::WaitStandard(StandardWait::Hz50).wait_samples(),
            Some(882)
        );
        assert_eq!(Command::RegisterWrite(0).wait_samples(), None);
        assert_eq!(StandardWait::Hz60.rate(), 60);
    }
}
