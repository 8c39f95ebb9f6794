//! Raw MIDI events for the router's pass-through pipe.
//!
//! The router forwards MIDI unmodified; the only message it ever interprets
//! is Program Change, whose program number selects a stored routing program.
//! Events carry raw status/data bytes so forwarding cannot alter content.

/// Program Change status nibble.
const STATUS_PROGRAM_CHANGE: u8 = 0xC0;

/// One raw MIDI event with a sample-frame timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Sample offset within the current audio block.
    pub frame: u32,
    /// Raw MIDI bytes (status + up to two data bytes).
    pub data: [u8; 3],
    /// Number of valid bytes (1-3).
    pub len: u8,
}

impl MidiEvent {
    /// Creates an event from raw bytes.
    pub fn new(frame: u32, data: [u8; 3], len: u8) -> Self {
        debug_assert!((1..=3).contains(&len));
        Self { frame, data, len }
    }

    /// Builds a Program Change event on the given channel (0-15).
    pub fn program_change_on(channel: u8, program: u8) -> Self {
        Self {
            frame: 0,
            data: [STATUS_PROGRAM_CHANGE | (channel & 0x0F), program & 0x7F, 0],
            len: 2,
        }
    }

    /// Extracts the program number if this is a Program Change message.
    ///
    /// The channel nibble is ignored; a program change on any channel
    /// selects a program.
    pub fn program_change(&self) -> Option<u8> {
        if self.len >= 2 && self.data[0] & 0xF0 == STATUS_PROGRAM_CHANGE {
            Some(self.data[1] & 0x7F)
        } else {
            None
        }
    }

    /// The channel nibble of the status byte (0-15).
    pub fn channel(&self) -> u8 {
        self.data[0] & 0x0F
    }
}
