//! Async tick and MIDI event loops.
//!
//! Contains the [`EngineConfig`] timing constants and the async functions
//! that drive a shared [`Sidechain`] from Embassy tasks. Like every loop in
//! this family of crates these are regular `async fn`s, **not** Embassy
//! `#[task]`s: Embassy tasks cannot be generic, so firmware wraps each one
//! in a thin concrete task.
//!
//! ```ignore
//! #[embassy_executor::task]
//! async fn tick_task(
//!     unit: &'static SharedSidechain<FlashStorage>,
//!     out: Sender<'static, CriticalSectionRawMutex, ControlChange, 16>,
//! ) {
//!     envelope_task(unit, out, EngineConfig::default()).await;
//! }
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};

use crate::envelope::{ControlChange, Emission};
use crate::midi::MidiEvent;
use crate::presets::EditorStatus;
use crate::sidechain::{Reaction, Sidechain};
use crate::storage::PresetStorage;

/// The owning context as shared between tasks.
pub type SharedSidechain<S> = Mutex<CriticalSectionRawMutex, Sidechain<S>>;

/// Outbound Control-Change queue.
pub type CcSender<'a, const N: usize> = Sender<'a, CriticalSectionRawMutex, ControlChange, N>;

/// Inbound MIDI event queue.
pub type MidiReceiver<'a, const N: usize> = Receiver<'a, CriticalSectionRawMutex, MidiEvent, N>;

/// Latest UI snapshot, raised whenever a MIDI event changed what is shown.
pub type StatusSignal = Signal<CriticalSectionRawMutex, EditorStatus>;

// ── Configuration ────────────────────────────────────────────────────────

/// Engine timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Period of one engine tick; step delays count in these units.
    pub tick_period_ms: u64,
    /// Gap between successive Control-Change messages of one emission.
    pub cc_pacing_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1,
            cc_pacing_ms: 2,
        }
    }
}

impl EngineConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn cc_pacing(&self) -> Duration {
        Duration::from_millis(self.cc_pacing_ms)
    }
}

// ── Fan-out ──────────────────────────────────────────────────────────────

/// Queue every message of `emission`, waiting `pacing` between two
/// consecutive messages. Returns the number queued.
///
/// Must be called without the [`SharedSidechain`] lock held.
pub async fn fan_out<const N: usize>(
    emission: Emission,
    out: &CcSender<'_, N>,
    pacing: Duration,
) -> usize {
    let mut sent = 0;
    for cc in emission.messages() {
        if sent > 0 {
            Timer::after(pacing).await;
        }
        out.send(cc).await;
        sent += 1;
    }
    sent
}

// ── Loops ────────────────────────────────────────────────────────────────

/// Fixed-rate engine loop.
///
/// Each period: lock, tick, unlock, then fan out the emission (if any)
/// with the lock released. A fan-out longer than one period delays the
/// next ticks; the ticker then catches up back to back.
pub async fn envelope_task<S: PresetStorage, const N: usize>(
    unit: &'static SharedSidechain<S>,
    out: CcSender<'static, N>,
    config: EngineConfig,
) -> ! {
    #[cfg(feature = "defmt")]
    defmt::info!("envelope task started, tick {} ms", config.tick_period_ms);

    let pacing = config.cc_pacing();
    let mut ticker = Ticker::every(config.tick_period());

    loop {
        ticker.next().await;

        let emission = unit.lock().await.tick(); // ← mutex released here

        if let Some(emission) = emission {
            fan_out(emission, &out, pacing).await;
        }
    }
}

/// Inbound MIDI dispatch loop.
///
/// Triggers are fanned out immediately. Preset selections and controller
/// edits publish the new editor status on `status` for the UI.
pub async fn midi_event_task<S: PresetStorage, const N_IN: usize, const N_OUT: usize>(
    unit: &'static SharedSidechain<S>,
    events: MidiReceiver<'static, N_IN>,
    out: CcSender<'static, N_OUT>,
    status: &'static StatusSignal,
    config: EngineConfig,
) -> ! {
    let pacing = config.cc_pacing();

    loop {
        let event = events.receive().await;

        let (reaction, snapshot) = {
            let mut unit = unit.lock().await;
            let reaction = unit.handle_event(event);
            (reaction, unit.status())
        }; // ← mutex released here

        #[cfg(feature = "defmt")]
        defmt::debug!("midi: {} -> {}", event, reaction);

        match reaction {
            Reaction::Triggered(emission) => {
                fan_out(emission, &out, pacing).await;
            }
            r if r.needs_redraw() => status.signal(snapshot),
            _ => {}
        }
    }
}
