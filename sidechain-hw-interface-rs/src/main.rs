//! sidechain-hw-interface
//!
//! MIDI sidechain ducking firmware for the Raspberry Pi Pico 2. Wires the
//! preset/envelope core and the flash backend into a live loop:
//!
//! 1. The MIDI transport pushes decoded events into `MIDI_IN`.
//! 2. The MIDI task dispatches them to the shared `Sidechain`: a matching
//!    note-on starts curve playback, program change selects a preset, and
//!    CC 20/21/22 edit the active preset.
//! 3. The tick task advances the envelope every millisecond and fans each
//!    value out to the preset's destinations through `CC_OUT`, 2 ms apart.
//! 4. The onboard button steps to the next preset (short press), toggles
//!    per-value trace logging (double press), saves every preset to flash
//!    (held for one second) or erases them back to factory defaults (held
//!    for five seconds).
//!
//! The transport itself is not part of this firmware: `MIDI_IN` has no
//! producer here and the CC output task only logs what it would send.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::FLASH;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use sidechain::task::{
    envelope_task, midi_event_task, CcSender, EngineConfig, MidiReceiver, SharedSidechain,
    StatusSignal,
};
use sidechain::{ControlChange, MidiEvent, Sidechain};
use sidechain_nvstore::{NvRegion, NvStore};

// ---------------------------------------------------------------------------
// Boot block
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pico 2 onboard flash.
const FLASH_SIZE: usize = 4 * 1024 * 1024;

/// Presets live in the last 4 KiB erase block, clear of the program image.
const PRESET_REGION: NvRegion = NvRegion::tail(FLASH_SIZE as u32, 4096);

const MIDI_IN_DEPTH: usize = 16;
const CC_OUT_DEPTH: usize = 32;

/// Hold time that turns a button press into "save".
const LONG_PRESS: Duration = Duration::from_secs(1);
/// Hold time that turns a button press into "factory reset".
const RESET_HOLD: Duration = Duration::from_secs(5);
/// Window for the second press of a double press.
const DOUBLE_PRESS: Duration = Duration::from_millis(300);
const DEBOUNCE: Duration = Duration::from_millis(20);

// ---------------------------------------------------------------------------
// Type aliases
// ---------------------------------------------------------------------------

type FlashStorage = NvStore<Flash<'static, FLASH, Blocking, FLASH_SIZE>>;

// ---------------------------------------------------------------------------
// Static storage
// ---------------------------------------------------------------------------

/// Shared sidechain state: written by the MIDI and button tasks, advanced by
/// the tick task.
static UNIT: StaticCell<SharedSidechain<FlashStorage>> = StaticCell::new();

/// Decoded inbound events from the transport.
static MIDI_IN: Channel<CriticalSectionRawMutex, MidiEvent, MIDI_IN_DEPTH> = Channel::new();

/// Outbound Control-Change messages for the transport.
static CC_OUT: Channel<CriticalSectionRawMutex, ControlChange, CC_OUT_DEPTH> = Channel::new();

/// Latest editor snapshot for the UI.
static STATUS: StatusSignal = StatusSignal::new();

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Thin wrapper that monomorphises the generic `envelope_task`.
#[embassy_executor::task]
async fn tick_task(
    unit: &'static SharedSidechain<FlashStorage>,
    out: CcSender<'static, CC_OUT_DEPTH>,
    config: EngineConfig,
) {
    envelope_task(unit, out, config).await;
}

/// Thin wrapper that monomorphises the generic `midi_event_task`.
#[embassy_executor::task]
async fn midi_task(
    unit: &'static SharedSidechain<FlashStorage>,
    events: MidiReceiver<'static, MIDI_IN_DEPTH>,
    out: CcSender<'static, CC_OUT_DEPTH>,
    config: EngineConfig,
) {
    midi_event_task(unit, events, out, &STATUS, config).await;
}

/// What one button gesture asks for.
#[derive(Clone, Copy, Format)]
enum Press {
    Single,
    Double,
    Long,
    Reset,
}

/// Classify the gesture that starts with the (debounced) press in progress.
///
/// Returns once the button is released.
async fn classify(button: &mut Input<'static>) -> Press {
    let released = with_timeout(LONG_PRESS, button.wait_for_high()).await;
    if released.is_err() {
        let hold = with_timeout(RESET_HOLD - LONG_PRESS, button.wait_for_high()).await;
        if hold.is_err() {
            button.wait_for_high().await;
            return Press::Reset;
        }
        return Press::Long;
    }

    Timer::after(DEBOUNCE).await;
    match with_timeout(DOUBLE_PRESS, button.wait_for_low()).await {
        Ok(()) => {
            button.wait_for_high().await;
            Press::Double
        }
        Err(_) => Press::Single,
    }
}

/// Onboard button.
///
/// | Gesture          | Action                          |
/// |------------------|---------------------------------|
/// | short press      | next preset (reloads the store) |
/// | double press     | toggle per-value trace logging  |
/// | hold 1 s         | save every preset               |
/// | hold 5 s         | erase flash, factory defaults   |
///
/// The mutex is held for the whole flash operation (a few tens of ms); the
/// tick task simply resumes afterwards.
#[embassy_executor::task]
async fn button_task(mut button: Input<'static>, unit: &'static SharedSidechain<FlashStorage>) {
    info!("Button task started");

    loop {
        button.wait_for_low().await;
        Timer::after(DEBOUNCE).await;
        if button.is_high() {
            continue;
        }

        let press = classify(&mut button).await;
        debug!("Button: {}", press);

        match press {
            Press::Single => {
                let status = {
                    let mut unit = unit.lock().await;
                    let preset = unit.select_preset(1);
                    debug!("Button: preset {}", preset);
                    unit.status()
                };
                STATUS.signal(status);
            }
            Press::Double => {
                let mut unit = unit.lock().await;
                let on = !unit.trace_enabled();
                unit.set_trace(on);
                info!("Button: trace {}", if on { "on" } else { "off" });
            }
            Press::Long => match unit.lock().await.save() {
                Ok(()) => info!("Button: presets saved"),
                Err(e) => error!("Button: save failed: {}", e),
            },
            Press::Reset => {
                let (result, status) = {
                    let mut unit = unit.lock().await;
                    (unit.factory_reset(), unit.status())
                };
                match result {
                    Ok(r) => warn!("Button: factory reset, {} defaulted", r.replaced_count()),
                    Err(e) => error!("Button: factory reset failed: {}", e),
                }
                STATUS.signal(status);
            }
        }

        Timer::after(DEBOUNCE).await;
    }
}

/// Prints the editor status line whenever it changes.
#[embassy_executor::task]
async fn ui_task(status: &'static StatusSignal) {
    loop {
        let snapshot = status.wait().await;
        info!("{}", snapshot.line().as_str());
    }
}

/// Drains outbound Control-Change messages.
#[embassy_executor::task]
async fn cc_out_task(
    messages: Receiver<'static, CriticalSectionRawMutex, ControlChange, CC_OUT_DEPTH>,
) {
    loop {
        let cc = messages.receive().await;
        trace!(
            "CC out: ch={} cc={} v={}",
            cc.channel,
            cc.controller,
            cc.value
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("sidechain-hw-interface starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // BUTTON → GP15  (p.PIN_15)  active-low, pull-up enabled
    // ———————————————————————————————————————————————————————————————————————

    let button = Input::new(p.PIN_15, Pull::Up);

    // Presets are read once here; every slot that fails validation is
    // default-filled and reported by the core.
    let flash = Flash::<_, Blocking, FLASH_SIZE>::new_blocking(p.FLASH);
    let storage = unwrap!(NvStore::new(flash, PRESET_REGION));
    let unit: &'static SharedSidechain<FlashStorage> =
        UNIT.init(Mutex::new(Sidechain::new(storage)));

    {
        let unit = unit.lock().await;
        STATUS.signal(unit.status());
        info!("Active preset {}", unit.active_preset());
    }

    // —— Spawn tasks ————————————————————————————————————————————————————————

    let config = EngineConfig::default(); // 1 ms tick, 2 ms CC pacing

    spawner.spawn(unwrap!(tick_task(unit, CC_OUT.sender(), config)));
    let events = MIDI_IN.receiver();
    spawner.spawn(unwrap!(midi_task(unit, events, CC_OUT.sender(), config)));
    spawner.spawn(unwrap!(button_task(button, unit)));
    spawner.spawn(unwrap!(ui_task(&STATUS)));
    spawner.spawn(unwrap!(cc_out_task(CC_OUT.receiver())));

    info!("All tasks spawned");
}
