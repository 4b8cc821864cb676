//! Envelope playback.
//!
//! The [`EnvelopeEngine`] turns a note-on trigger into a timed sequence of
//! Control-Change values, one [`Emission`] per step. Emissions are plain
//! `Copy` values: the caller decides how to deliver them, either
//! immediately through a [`CcSink`] or paced by the async tasks.

mod emission;
mod engine;

pub use emission::{CcSink, ControlChange, Destination, Emission};
pub use engine::{EnvelopeEngine, Phase};
