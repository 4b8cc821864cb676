use super::emission::{Destination, Emission};
use crate::curves::{self, CURVE_LEN, NEUTRAL};
use crate::presets::{Preset, PresetStore, MAX_DEPTH, N_DESTINATIONS};

/// Step index reached after the last curve point: emit neutral once more.
const FINISH_STEP: u8 = CURVE_LEN as u8;
/// Step index of a parked engine: nothing is emitted until the next trigger.
const PARKED_STEP: u8 = FINISH_STEP + 1;

/// Playback phase, derived from the step counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No playback in progress.
    Idle,
    /// Curve point `step` (0..=15) is the next to be emitted.
    Playing(u8),
    /// The final neutral value is pending.
    Finished,
}

/// Real-time curve playback state machine.
///
/// The engine works on a cached copy of the active preset and its
/// depth-modulated curve. The copy is refreshed only when the store raises
/// its change signal, checked at the start of every [`tick()`](Self::tick).
///
/// # Timing
///
/// A trigger emits point 0 immediately and arms `step_delay` ticks. Each
/// tick then either counts the delay down, or (at zero) re-arms it and
/// emits the point at the current step. A point equal to the ceiling ends
/// the curve early. After the curve, one more neutral value is sent and the
/// engine parks until the next trigger.
///
/// # Examples
///
/// ```
/// use sidechain::envelope::{EnvelopeEngine, Phase};
/// use sidechain::presets::PresetStore;
///
/// let mut store = PresetStore::new();
/// let mut engine = EnvelopeEngine::new(store.preset(0).unwrap());
///
/// // Default preset 0 triggers on channel 1, note 36.
/// let first = engine.note_on(1, 36, 100).unwrap();
/// assert_eq!(first.value, 32);
/// assert_eq!(engine.phase(), Phase::Playing(0));
///
/// assert!(engine.note_on(2, 36, 100).is_none());
/// assert!(engine.tick(&mut store, 0).is_none()); // delay counting down
/// ```
pub struct EnvelopeEngine {
    preset: Preset,
    curve: [u8; CURVE_LEN],
    destinations: [Destination; N_DESTINATIONS],
    step: u8,
    delay: i32,
    trace: bool,
}

impl EnvelopeEngine {
    /// Build an idle engine working on `preset`.
    pub fn new(preset: &Preset) -> Self {
        let mut engine = Self {
            preset: *preset,
            curve: [NEUTRAL; CURVE_LEN],
            destinations: [Destination::default(); N_DESTINATIONS],
            step: PARKED_STEP,
            delay: 0,
            trace: false,
        };
        engine.resolve(preset);
        engine
    }

    /// Replace the working copy: destinations and modulated curve.
    ///
    /// Does not touch the playback position.
    ///
    /// # Panics
    ///
    /// Panics if `preset.curve` is not a valid curve id. Stored presets are
    /// validated, so this indicates a programming error.
    pub fn resolve(&mut self, preset: &Preset) {
        self.preset = *preset;
        self.destinations = core::array::from_fn(|i| Destination {
            channel: preset.dst_channel[i] as u8,
            controller: preset.dst_cc[i] as u8,
        });
        self.curve = curves::modulate(preset.curve as usize, preset.depth, MAX_DEPTH);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "envelope: resolved preset {} (curve {}, depth {})",
            preset.preset_index,
            preset.curve,
            preset.depth
        );
    }

    /// `true` if a note on `channel`/`note` triggers the working preset.
    pub fn matches(&self, channel: u8, note: u8) -> bool {
        channel as i32 == self.preset.src_channel && note as i32 == self.preset.src_note
    }

    /// Trigger entry point for an inbound note-on.
    ///
    /// On an exact channel/note match the curve restarts from step 0 and the
    /// first value is returned for fan-out. Anything else is ignored.
    pub fn note_on(&mut self, channel: u8, note: u8, _velocity: u8) -> Option<Emission> {
        if !self.matches(channel, note) {
            return None;
        }

        self.step = 0;
        self.delay = self.preset.step_delay;

        #[cfg(feature = "defmt")]
        defmt::debug!("envelope: trigger ch={} note={}", channel, note);

        Some(self.emit(self.point(0)))
    }

    /// One cooperative scheduler pass.
    ///
    /// Re-resolves the working copy from `store` slot `active` if the store
    /// has changed since the previous tick, then advances playback.
    pub fn tick(&mut self, store: &mut PresetStore, active: usize) -> Option<Emission> {
        if store.take_changed() {
            if let Ok(preset) = store.preset(active) {
                self.resolve(preset);
            }
        }
        self.advance()
    }

    /// Advance playback by one tick on the current working copy.
    pub fn advance(&mut self) -> Option<Emission> {
        if self.delay > 0 {
            self.delay -= 1;
            return None;
        }

        self.delay = self.preset.step_delay;
        match self.step {
            step if step < FINISH_STEP => {
                let value = self.point(step as usize);
                self.step = if value == NEUTRAL {
                    FINISH_STEP
                } else {
                    step + 1
                };
                Some(self.emit(value))
            }
            FINISH_STEP => {
                self.delay = 0;
                self.step = PARKED_STEP;

                #[cfg(feature = "defmt")]
                {
                    if self.trace {
                        defmt::info!("envelope: done");
                    }
                }

                Some(self.emit(NEUTRAL))
            }
            _ => None,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.step {
            step if step < FINISH_STEP => Phase::Playing(step),
            FINISH_STEP => Phase::Finished,
            _ => Phase::Idle,
        }
    }

    /// Ticks left before the next step is evaluated.
    pub fn delay_remaining(&self) -> i32 {
        self.delay
    }

    /// The cached depth-modulated curve.
    pub fn curve(&self) -> &[u8; CURVE_LEN] {
        &self.curve
    }

    pub fn destinations(&self) -> &[Destination; N_DESTINATIONS] {
        &self.destinations
    }

    /// The cached working copy of the active preset.
    pub fn working_preset(&self) -> &Preset {
        &self.preset
    }

    /// Toggle per-value info messages.
    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace
    }

    /// Value for `step`: the curve point, or neutral when the preset is off.
    fn point(&self, step: usize) -> u8 {
        if self.preset.active != 0 {
            self.curve[step]
        } else {
            NEUTRAL
        }
    }

    fn emit(&self, value: u8) -> Emission {
        #[cfg(feature = "defmt")]
        {
            if self.trace {
                defmt::trace!("envelope: v={}", value);
            }
        }

        Emission {
            value,
            destinations: self.destinations,
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
