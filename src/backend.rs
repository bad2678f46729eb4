//! Observable chip abstraction
//!
//! The renderer does not care whether it drives the behavioral model in this crate or some
//! other device that speaks the same write-port protocol (a gate-level simulation, a logic
//! analyzer capture, an FPGA core). Anything that accepts one write byte per clock edge and
//! exposes its instantaneous output can implement [`ObservableChip`].

use crate::sn76489::{ChannelLevels, ChipSnapshot, Sn76489};

/// Common interface for SN76489-compatible devices
///
/// # Example
///
/// ```
/// use sn76489::{ObservableChip, Sn76489};
///
/// fn beep<C: ObservableChip>(chip: &mut C) -> u16 {
///     chip.write_data(0x81); // Tone 1 period low nibble = 1
///     chip.write_data(0x00); // Tone 1 period high bits = 0
///     chip.write_data(0x90); // Tone 1 attenuation = 0 (loudest)
///     chip.advance_clock(1); // the first reload latches the period and raises the output
///     chip.output()
/// }
///
/// let mut chip = Sn76489::new();
/// assert!(beep(&mut chip) >= 8192);
/// ```
pub trait ObservableChip: Send {
    /// Return the device to its power-on state
    fn reset(&mut self);

    /// Present one byte on the write port
    ///
    /// The caller strobes exactly one internal clock edge after each write with
    /// [`advance_clock`](Self::advance_clock).
    fn write_data(&mut self, byte: u8);

    /// Advance the internal clock by `ticks` edges
    fn advance_clock(&mut self, ticks: u32);

    /// Instantaneous master output level (0..=32767)
    fn output(&self) -> u16;

    /// Instantaneous per-channel contributions
    fn channel_levels(&self) -> ChannelLevels;

    /// Internal state for tracing
    ///
    /// Devices that cannot expose their internals return `None`. The default
    /// implementation does exactly that.
    fn snapshot(&self) -> Option<ChipSnapshot> {
        None
    }
}

impl ObservableChip for Sn76489 {
    fn reset(&mut self) {
        Sn76489::reset(self);
    }

    fn write_data(&mut self, byte: u8) {
        Sn76489::write_data(self, byte);
    }

    fn advance_clock(&mut self, ticks: u32) {
        Sn76489::advance_clock(self, ticks);
    }

    fn output(&self) -> u16 {
        Sn76489::output(self)
    }

    fn channel_levels(&self) -> ChannelLevels {
        Sn76489::channel_levels(self)
    }

    fn snapshot(&self) -> Option<ChipSnapshot> {
        Some(Sn76489::snapshot(self))
    }
}
