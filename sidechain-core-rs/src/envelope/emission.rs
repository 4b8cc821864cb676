use crate::presets::N_DESTINATIONS;

/// One output destination of a preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Destination {
    /// MIDI channel 1..=16; `0` marks the slot unused.
    pub channel: u8,
    pub controller: u8,
}

impl Destination {
    pub fn is_used(&self) -> bool {
        self.channel != 0
    }
}

/// An outbound Control-Change message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlChange {
    /// 1-based MIDI channel.
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
}

/// One envelope value to be sent to every used destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Emission {
    pub value: u8,
    pub destinations: [Destination; N_DESTINATIONS],
}

impl Emission {
    /// The Control-Change messages for this value, skipping unused slots.
    pub fn messages(&self) -> impl Iterator<Item = ControlChange> {
        let value = self.value;
        self.destinations
            .into_iter()
            .filter(Destination::is_used)
            .map(move |d| ControlChange {
                channel: d.channel,
                controller: d.controller,
                value,
            })
    }

    /// Send every message to `sink` back to back. Returns the number sent.
    ///
    /// The async tasks pace successive messages instead; see
    /// `task::fan_out`.
    pub fn fan_out<K: CcSink + ?Sized>(&self, sink: &mut K) -> usize {
        let mut sent = 0;
        for cc in self.messages() {
            sink.send_cc(cc);
            sent += 1;
        }
        sent
    }
}

/// Receiver of outbound Control-Change messages (the MIDI transport).
pub trait CcSink {
    fn send_cc(&mut self, cc: ControlChange);
}

impl<F: FnMut(ControlChange)> CcSink for F {
    fn send_cc(&mut self, cc: ControlChange) {
        self(cc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dest(channel: u8, controller: u8) -> Destination {
        Destination {
            channel,
            controller,
        }
    }

    fn cc(channel: u8, controller: u8, value: u8) -> ControlChange {
        ControlChange {
            channel,
            controller,
            value,
        }
    }

    fn emission(value: u8) -> Emission {
        Emission {
            value,
            destinations: [dest(2, 7), dest(0, 7), dest(16, 11), dest(0, 1)],
        }
    }

    #[test]
    fn messages_skip_unused_destinations() {
        let e = emission(40);
        let mut it = e.messages();
        assert_eq!(it.next(), Some(cc(2, 7, 40)));
        assert_eq!(it.next(), Some(cc(16, 11, 40)));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn fan_out_to_closure() {
        let mut last = None;
        let mut count = 0;
        let sent = emission(99).fan_out(&mut |cc: ControlChange| {
            last = Some(cc);
            count += 1;
        });
        assert_eq!(sent, 2);
        assert_eq!(count, 2);
        assert_eq!(last.map(|cc| cc.channel), Some(16));
    }
}
