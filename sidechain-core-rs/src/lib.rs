//! Control core of a MIDI-triggered sidechain ducking unit.
//!
//! A matching note-on starts playback of a 16-point curve; each step is
//! sent as a Control-Change value to up to four destinations, attenuating
//! them and letting them recover over time. Sixteen presets describe the
//! trigger, curve, depth, timing and destinations, and persist through a
//! [`PresetStorage`] backend.
//!
//! # Quick Start
//!
//! ```ignore
//! use sidechain::Sidechain;
//! use sidechain::task::EngineConfig;
//!
//! // In your Embassy main:
//! let unit = UNIT.init(Mutex::new(Sidechain::new(flash_storage)));
//! let config = EngineConfig::default();
//! spawner.spawn(unwrap!(tick_task(unit, CC_OUT.sender(), config)));
//! spawner.spawn(unwrap!(midi_task(unit, MIDI_IN.receiver(), CC_OUT.sender(), config)));
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`](https://docs.rs/defmt).
//! - **`task`**: async tick and MIDI loops on `embassy-sync` / `embassy-time`.

#![no_std]

pub mod curves;
pub mod envelope;
pub mod midi;
pub mod presets;
mod sidechain;
pub mod storage;
#[cfg(feature = "task")]
pub mod task;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use envelope::{ControlChange, Emission, EnvelopeEngine};
pub use midi::{MidiEvent, MidiMap};
pub use presets::{EditError, PresetError, PresetStore, ValueEditor};
pub use sidechain::{Reaction, Sidechain};
pub use storage::PresetStorage;
