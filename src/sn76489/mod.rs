//! SN76489 PSG Emulation Domain
//!
//! Behavioral model of the four-channel programmable sound generator: three square-wave tone
//! channels with deferred period reload, one noise channel built around a configurable shift
//! register, and a logarithmic attenuator per channel feeding a saturating mixer.

pub mod chip;
pub mod constants;
pub mod generators;
pub mod mixer;
pub mod registers;

pub use chip::{ChipConfig, ChipSnapshot, ClockDivider, Sn76489};
pub use generators::{NoiseConfig, NoiseGenerator, ToneGenerator};
pub use mixer::{channel_to_pcm, master_to_pcm, mix, Attenuator, ChannelLevels};
pub use registers::{Channel, Latch, RegisterKind, RegisterWrite};
