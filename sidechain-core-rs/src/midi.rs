//! Inbound MIDI events and the Control-Change mapping for live edits.

use crate::presets::Field;

/// A decoded inbound MIDI channel message. Channels are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MidiEvent {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
    },
    ControlChange {
        channel: u8,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        channel: u8,
        program: u8,
    },
}

impl MidiEvent {
    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. } => channel,
        }
    }

    /// Decode a three- or two-byte channel message.
    ///
    /// A note-on with velocity 0 decodes as note-off. Returns `None` for
    /// system messages and short input.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        let channel = (status & 0x0F) + 1;
        let data = |i: usize| bytes.get(i).map(|b| b & 0x7F);

        match status & 0xF0 {
            0x80 => Some(Self::NoteOff {
                channel,
                note: data(1)?,
            }),
            0x90 => {
                let note = data(1)?;
                match data(2)? {
                    0 => Some(Self::NoteOff { channel, note }),
                    velocity => Some(Self::NoteOn {
                        channel,
                        note,
                        velocity,
                    }),
                }
            }
            0xB0 => Some(Self::ControlChange {
                channel,
                controller: data(1)?,
                value: data(2)?,
            }),
            0xC0 => Some(Self::ProgramChange {
                channel,
                program: data(1)?,
            }),
            _ => None,
        }
    }
}

/// Which inbound controllers edit the active preset, and how.
///
/// Incoming values are `0..=127`; each mapping shifts them right so the
/// full controller sweep covers the field's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MidiMap {
    /// Controller setting step delay (`value >> 1`).
    pub step_delay_cc: u8,
    /// Controller setting depth (`value >> 3`).
    pub depth_cc: u8,
    /// Controller setting the curve (`value >> 5`).
    pub curve_cc: u8,
}

impl Default for MidiMap {
    fn default() -> Self {
        Self {
            step_delay_cc: 20,
            depth_cc: 21,
            curve_cc: 22,
        }
    }
}

impl MidiMap {
    /// Field and scaled value for an inbound controller, if it is mapped.
    pub fn lookup(&self, controller: u8, value: u8) -> Option<(Field, i32)> {
        let value = value as i32;
        if controller == self.step_delay_cc {
            Some((Field::StepDelay, value >> 1))
        } else if controller == self.depth_cc {
            Some((Field::Depth, value >> 3))
        } else if controller == self.curve_cc {
            Some((Field::Curve, value >> 5))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_channel_messages() {
        assert_eq!(
            MidiEvent::from_bytes(&[0x90, 36, 100]),
            Some(MidiEvent::NoteOn {
                channel: 1,
                note: 36,
                velocity: 100,
            })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0x9F, 36, 0]),
            Some(MidiEvent::NoteOff {
                channel: 16,
                note: 36,
            })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xB2, 21, 64]),
            Some(MidiEvent::ControlChange {
                channel: 3,
                controller: 21,
                value: 64,
            })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xC0, 5]),
            Some(MidiEvent::ProgramChange {
                channel: 1,
                program: 5,
            })
        );
    }

    #[test]
    fn decode_rejects_short_and_system_messages() {
        assert_eq!(MidiEvent::from_bytes(&[]), None);
        assert_eq!(MidiEvent::from_bytes(&[0x90, 36]), None);
        assert_eq!(MidiEvent::from_bytes(&[0xF8]), None);
    }

    #[test]
    fn default_map_scales_into_field_ranges() {
        let map = MidiMap::default();
        assert_eq!(map.lookup(20, 127), Some((Field::StepDelay, 63)));
        assert_eq!(map.lookup(21, 127), Some((Field::Depth, 15)));
        assert_eq!(map.lookup(22, 127), Some((Field::Curve, 3)));
        assert_eq!(map.lookup(22, 31), Some((Field::Curve, 0)));
        assert_eq!(map.lookup(7, 127), None);
    }
}
