//! SN76489 Hardware Constants
//!
//! Shared constants and lookup tables used across PSG components.

/// Number of square-wave tone channels
pub const NUM_TONE_CHANNELS: usize = 3;

/// Total number of attenuated channels (3 tone + 1 noise)
pub const NUM_CHANNELS: usize = 4;

/// Index of the noise channel in the attenuator bank
pub const NOISE_CHANNEL: usize = 3;

/// Tone period registers are 10 bits wide
pub const TONE_PERIOD_MASK: u16 = 0x3FF;

/// Counter reload used when the compare register holds zero
pub const ZERO_PERIOD_RELOAD: u16 = 1024;

/// Fixed noise divider rates selected by noise-control bits 0-1 (code 3 follows tone channel 3)
pub const NOISE_RATES: [u16; 3] = [16, 32, 64];

/// Amplitude of a channel at attenuation code 0
pub const AMPLITUDE_PEAK: u16 = 8192;

/// Residual amplitude at attenuation code 15 (the chip never outputs true zero)
pub const SILENCE_FLOOR: u16 = 16;

/// Largest representable master level
pub const MASTER_MAX: u16 = 32767;

/// Master level produced by four channels sitting at the silence floor
pub const MASTER_SILENCE_FLOOR: u16 = SILENCE_FLOOR * NUM_CHANNELS as u16;

/// Attenuation law: 2 dB per step, `round(8192 * 2^(-code/2))` for codes 0-14.
///
/// Code 15 is not a 30 dB step but the idle bias of the output stage, see [`SILENCE_FLOOR`].
pub const ATTENUATION_TABLE: [u16; 16] = [
    8192, 5793, 4096, 2896, 2048, 1448, 1024, 724, 512, 362, 256, 181, 128, 91, 64, SILENCE_FLOOR,
];

/// Get channel amplitude for an attenuation code (any u8, masked to 0-15)
#[inline]
pub fn amplitude(code: u8) -> u16 {
    ATTENUATION_TABLE[(code & 0x0F) as usize]
}
