use sn76489::vgm_parser::{encode_commands, Command, Gd3Tag, VgmHeader};

pub const NTSC_CLOCK: u32 = 3_579_545;

/// Assemble a 1.50 VGM image with the stream at 0x40, an EOF offset and an optional GD3 tag
pub fn build_vgm(rate: u32, commands: &[Command], gd3: Option<&Gd3Tag>) -> Vec<u8> {
    let mut header = VgmHeader::new(0x150);
    header.sn76489_clock = NTSC_CLOCK;
    header.rate = rate;
    header.data_offset = 0x0C;
    header.total_samples = commands.iter().filter_map(Command::wait_samples).sum();

    let stream = encode_commands(commands);
    let gd3_bytes = gd3.map(Gd3Tag::to_bytes).unwrap_or_default();
    let gd3_pos = 0x40 + stream.len();
    if gd3.is_some() {
        header.gd3_offset = (gd3_pos - 0x14) as u32;
    }
    header.eof_offset = (gd3_pos + gd3_bytes.len() - 0x04) as u32;

    let mut image = header.to_bytes();
    image.extend_from_slice(&stream);
    image.extend_from_slice(&gd3_bytes);
    image
}

/// One frame per write group, each closed by the standard wait for `rate`
pub fn frames_to_commands(frames: &[Vec<u8>], wait: Command) -> Vec<Command> {
    let mut commands = Vec::new();
    for frame in frames {
        commands.extend(frame.iter().map(|&b| Command::RegisterWrite(b)));
        commands.push(wait.clone());
    }
    commands.push(Command::EndOfStream);
    commands
}
