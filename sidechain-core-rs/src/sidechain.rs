use crate::envelope::{Emission, EnvelopeEngine};
use crate::midi::{MidiEvent, MidiMap};
use crate::presets::{
    EditError, EditorStatus, Field, LoadReport, PresetError, PresetStore, ValueEditor,
};
use crate::storage::PresetStorage;

/// What [`Sidechain::handle_event()`] did with an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reaction {
    /// Wrong channel, unmapped controller, or a message type with no effect.
    Ignored,
    /// The note triggered playback; the first value must be fanned out.
    Triggered(Emission),
    /// A program change selected (or kept) this preset and reloaded the store.
    PresetSelected(usize),
    /// A mapped controller edited the active preset.
    ValueChanged { field: Field, value: i32 },
}

impl Reaction {
    /// `true` if the UI should redraw.
    pub fn needs_redraw(&self) -> bool {
        matches!(self, Self::PresetSelected(_) | Self::ValueChanged { .. })
    }
}

/// The single owning context of the unit: preset store, editor cursor,
/// envelope engine and the storage backend.
///
/// Firmware keeps one instance behind a mutex shared by the tick, MIDI and
/// UI tasks. Every method is short and non-blocking except the ones that
/// reach the storage (`save`, `factory_reset`, preset selection).
///
/// # Examples
///
/// ```
/// use sidechain::midi::MidiEvent;
/// use sidechain::{Reaction, Sidechain};
/// # use sidechain::storage::PresetStorage;
/// # struct Erased;
/// # impl PresetStorage for Erased {
/// #     type Error = ();
/// #     fn load(&mut self, buf: &mut [u8]) -> Result<(), ()> { buf.fill(0xFF); Ok(()) }
/// #     fn save(&mut self, _: &[u8]) -> Result<(), ()> { Ok(()) }
/// #     fn erase(&mut self) -> Result<(), ()> { Ok(()) }
/// # }
///
/// let mut unit = Sidechain::new(Erased);
/// let hit = MidiEvent::NoteOn { channel: 1, note: 36, velocity: 90 };
/// match unit.handle_event(hit) {
///     Reaction::Triggered(e) => assert_eq!(e.value, 32),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub struct Sidechain<S: PresetStorage> {
    store: PresetStore,
    editor: ValueEditor,
    engine: EnvelopeEngine,
    storage: S,
    map: MidiMap,
}

impl<S: PresetStorage> Sidechain<S> {
    /// Load the persisted presets and resolve preset 0.
    pub fn new(storage: S) -> Self {
        Self::with_map(storage, MidiMap::default())
    }

    pub fn with_map(mut storage: S, map: MidiMap) -> Self {
        let mut store = PresetStore::new();
        let _report = store.load(&mut storage);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "sidechain: {} slot(s) default-filled at boot",
            _report.replaced_count()
        );

        let editor = ValueEditor::new();
        let mut engine = EnvelopeEngine::new(&store.presets()[editor.current_preset()]);
        store.take_changed();
        engine.resolve(&store.presets()[editor.current_preset()]);

        Self {
            store,
            editor,
            engine,
            storage,
            map,
        }
    }

    /// One engine tick. Call at the fixed tick period.
    pub fn tick(&mut self) -> Option<Emission> {
        self.engine
            .tick(&mut self.store, self.editor.current_preset())
    }

    /// Dispatch one inbound MIDI event.
    ///
    /// Only events on the active preset's source channel have any effect.
    pub fn handle_event(&mut self, event: MidiEvent) -> Reaction {
        let active = self.editor.current_preset();
        if event.channel() as i32 != self.store.presets()[active].src_channel {
            return Reaction::Ignored;
        }

        match event {
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            } => {
                self.sync_engine();
                self.engine
                    .note_on(channel, note, velocity)
                    .map_or(Reaction::Ignored, Reaction::Triggered)
            }
            MidiEvent::ProgramChange { program, .. } => {
                let preset = self.select(program as usize);
                Reaction::PresetSelected(preset)
            }
            MidiEvent::ControlChange {
                controller, value, ..
            } => match self.map.lookup(controller, value) {
                Some((field, scaled)) => match self.store.set(active, field, scaled) {
                    Ok(value) => Reaction::ValueChanged { field, value },
                    Err(_) => Reaction::Ignored,
                },
                None => Reaction::Ignored,
            },
            MidiEvent::NoteOff { .. } => Reaction::Ignored,
        }
    }

    // ── Editor ───────────────────────────────────────────────────────

    /// Step to the next/previous preset and reload. Returns the new index.
    pub fn select_preset(&mut self, delta: i32) -> usize {
        self.editor
            .select_preset(delta, &mut self.store, &mut self.storage)
            .preset_index as usize
    }

    pub fn select_field(&mut self, delta: i32) -> Field {
        self.editor.select_field(delta)
    }

    pub fn change_current_value(&mut self, delta: i32) -> Result<i32, EditError<S::Error>> {
        self.editor
            .change_current_value(delta, &mut self.store, &mut self.storage)
    }

    pub fn set_current_value(&mut self, value: i32) -> Result<i32, PresetError> {
        self.editor.set_current_value(&mut self.store, value)
    }

    pub fn status(&self) -> EditorStatus {
        self.editor.status(&self.store)
    }

    // ── Storage ──────────────────────────────────────────────────────

    /// Persist all presets, independent of the editor cursor.
    pub fn save(&mut self) -> Result<(), S::Error> {
        self.store.save(&mut self.storage)
    }

    /// Erase the persisted image and reload, default-filling every slot.
    pub fn factory_reset(&mut self) -> Result<LoadReport, S::Error> {
        #[cfg(feature = "defmt")]
        defmt::warn!("sidechain: factory reset");

        self.storage.erase()?;
        Ok(self.store.load(&mut self.storage))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn active_preset(&self) -> usize {
        self.editor.current_preset()
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    /// Direct store access. Edits raise the change signal picked up by the
    /// next tick.
    pub fn store_mut(&mut self) -> &mut PresetStore {
        &mut self.store
    }

    pub fn editor(&self) -> &ValueEditor {
        &self.editor
    }

    pub fn engine(&self) -> &EnvelopeEngine {
        &self.engine
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn midi_map(&self) -> &MidiMap {
        &self.map
    }

    /// Toggle per-value info messages from the engine.
    pub fn set_trace(&mut self, on: bool) {
        self.engine.set_trace(on);
    }

    pub fn trace_enabled(&self) -> bool {
        self.engine.trace_enabled()
    }

    fn select(&mut self, preset: usize) -> usize {
        self.editor
            .jump_to_preset(preset, &mut self.store, &mut self.storage);
        self.editor.current_preset()
    }

    /// Pick up pending store changes before a trigger, so the note is
    /// matched against the current preset.
    fn sync_engine(&mut self) {
        if self.store.take_changed() {
            self.engine
                .resolve(&self.store.presets()[self.editor.current_preset()]);
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Phase;
    use crate::presets::record::BLOB_LEN;
    use crate::presets::test_storage::{image_with, RamError, RamStorage};
    use crate::presets::Target;

    fn unit() -> Sidechain<RamStorage> {
        Sidechain::new(RamStorage::with_image(image_with(|p| {
            p[1].src_note = 38;
            p[2].src_channel = 10;
        })))
    }

    fn program(channel: u8, program: u8) -> MidiEvent {
        MidiEvent::ProgramChange { channel, program }
    }

    fn note(channel: u8, note: u8) -> MidiEvent {
        MidiEvent::NoteOn {
            channel,
            note,
            velocity: 100,
        }
    }

    // ── Boot ─────────────────────────────────────────────────────────

    #[test]
    fn boot_loads_presets_and_resolves_preset_zero() {
        let unit = unit();
        assert_eq!(unit.active_preset(), 0);
        assert_eq!(unit.store().get(1, Field::SrcNote), Ok(38));
        assert_eq!(unit.engine().curve()[0], 32);
        assert!(!unit.store().is_dirty(Target::All));
    }

    // ── Note events ──────────────────────────────────────────────────

    #[test]
    fn matching_note_triggers() {
        let mut unit = unit();
        match unit.handle_event(note(1, 36)) {
            Reaction::Triggered(e) => {
                assert_eq!(e.value, 32);
                assert_eq!(e.messages().count(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(unit.engine().phase(), Phase::Playing(0));
    }

    #[test]
    fn other_channel_or_note_is_ignored() {
        let mut unit = unit();
        assert_eq!(unit.handle_event(note(2, 36)), Reaction::Ignored);
        assert_eq!(unit.handle_event(note(1, 38)), Reaction::Ignored);
        let off = MidiEvent::NoteOff {
            channel: 1,
            note: 36,
        };
        assert_eq!(unit.handle_event(off), Reaction::Ignored);
        assert_eq!(unit.engine().phase(), Phase::Idle);
    }

    #[test]
    fn trigger_sees_edits_made_since_last_tick() {
        let mut unit = unit();
        unit.store_mut().set(0, Field::SrcNote, 40).unwrap();
        let r = unit.handle_event(note(1, 40));
        assert!(matches!(r, Reaction::Triggered(_)));
    }

    #[test]
    fn tick_plays_after_trigger() {
        let mut unit = unit();
        unit.handle_event(note(1, 36));
        let mut first = None;
        for _ in 0..6 {
            if let Some(e) = unit.tick() {
                first = Some(e.value);
            }
        }
        assert_eq!(first, Some(32));
    }

    // ── Program change ───────────────────────────────────────────────

    #[test]
    fn program_change_selects_and_reloads() {
        let mut unit = unit();
        unit.store_mut().set(0, Field::Depth, 1).unwrap();

        let r = unit.handle_event(program(1, 1));
        assert_eq!(r, Reaction::PresetSelected(1));
        assert!(r.needs_redraw());
        assert_eq!(unit.active_preset(), 1);
        assert_eq!(unit.store().get(0, Field::Depth), Ok(12));
        assert!(!unit.store().is_dirty(Target::All));

        // next tick resolves the new preset
        unit.tick();
        assert!(unit.engine().matches(1, 38));
    }

    #[test]
    fn program_change_out_of_range_keeps_preset_but_reloads() {
        let mut unit = unit();
        unit.store_mut().set(0, Field::Depth, 1).unwrap();
        let r = unit.handle_event(program(1, 99));
        assert_eq!(r, Reaction::PresetSelected(0));
        assert_eq!(unit.store().get(0, Field::Depth), Ok(12));
    }

    #[test]
    fn program_change_listens_on_active_source_channel() {
        let mut unit = unit();
        unit.handle_event(program(1, 2));
        // preset 2 listens on channel 10 now
        assert_eq!(unit.handle_event(program(1, 0)), Reaction::Ignored);
        assert_eq!(
            unit.handle_event(program(10, 0)),
            Reaction::PresetSelected(0)
        );
    }

    // ── Control change ───────────────────────────────────────────────

    #[test]
    fn mapped_controllers_edit_active_preset() {
        let mut unit = unit();
        let cc = |controller, value| MidiEvent::ControlChange {
            channel: 1,
            controller,
            value,
        };
        let changed = |field, value| Reaction::ValueChanged { field, value };

        assert_eq!(unit.handle_event(cc(20, 0)), changed(Field::StepDelay, 1));
        assert_eq!(unit.handle_event(cc(21, 120)), changed(Field::Depth, 15));
        assert_eq!(unit.handle_event(cc(22, 64)), changed(Field::Curve, 2));
        assert_eq!(unit.handle_event(cc(7, 64)), Reaction::Ignored);
        assert!(unit.store().is_dirty(Target::Slot(0)));

        unit.tick();
        assert_eq!(unit.engine().curve()[0], 8);
    }

    #[test]
    fn controllers_on_other_channel_leave_playback_alone() {
        let mut unit = unit();
        unit.handle_event(note(1, 36));
        unit.tick();
        let before = (unit.engine().phase(), unit.engine().delay_remaining());

        for controller in [20, 21, 22] {
            let r = unit.handle_event(MidiEvent::ControlChange {
                channel: 5,
                controller,
                value: 0,
            });
            assert_eq!(r, Reaction::Ignored);
        }
        let after = (unit.engine().phase(), unit.engine().delay_remaining());
        assert_eq!(after, before);
        assert_eq!(unit.store().get(0, Field::Depth), Ok(12));
    }

    #[test]
    fn custom_map_replaces_default_controllers() {
        let map = MidiMap {
            step_delay_cc: 70,
            depth_cc: 71,
            curve_cc: 72,
        };
        let mut unit = Sidechain::with_map(RamStorage::with_image(image_with(|_| {})), map);
        assert_eq!(unit.midi_map(), &map);

        let depth = MidiEvent::ControlChange {
            channel: 1,
            controller: 71,
            value: 0,
        };
        let expected = Reaction::ValueChanged {
            field: Field::Depth,
            value: 0,
        };
        assert_eq!(unit.handle_event(depth), expected);

        let default_depth = MidiEvent::ControlChange {
            channel: 1,
            controller: 21,
            value: 127,
        };
        assert_eq!(unit.handle_event(default_depth), Reaction::Ignored);
        assert_eq!(unit.store().get(0, Field::Depth), Ok(0));
    }

    // ── Storage ──────────────────────────────────────────────────────

    #[test]
    fn save_persists_without_touching_cursor() {
        let mut unit = unit();
        unit.select_field(1);
        unit.select_field(1); // Depth
        unit.set_current_value(4).unwrap();
        unit.save().unwrap();

        assert_eq!(unit.storage().saves, 1);
        assert_eq!(unit.editor().current_field(), Field::Depth);
        assert!(!unit.store().is_dirty(Target::All));

        unit.select_preset(1);
        assert_eq!(unit.store().get(0, Field::Depth), Ok(4));
    }

    #[test]
    fn factory_reset_defaults_every_slot() {
        let mut unit = unit();
        let report = unit.factory_reset().unwrap();
        assert_eq!(report.replaced_count(), 16);
        assert!(report.was_replaced(1));
        assert_eq!(unit.storage().erases, 1);
        assert_eq!(unit.storage().image, [0xFF; BLOB_LEN]);
        assert_eq!(unit.store().get(1, Field::SrcNote), Ok(36));
    }

    #[test]
    fn commit_field_save_failure_surfaces_storage_error() {
        let mut unit = unit();
        unit.storage_mut().fail_save = true;
        assert_eq!(unit.select_field(-1), Field::Commit);

        let result = unit.change_current_value(1);
        assert_eq!(result, Err(EditError::Storage(RamError)));
        assert_eq!(unit.editor().current_field(), Field::Commit);
    }

    #[test]
    fn trace_toggle_reaches_the_engine() {
        let mut unit = unit();
        assert!(!unit.trace_enabled());
        unit.set_trace(true);
        assert!(unit.engine().trace_enabled());
        unit.set_trace(false);
        assert!(!unit.trace_enabled());
    }

    #[test]
    fn status_tracks_editor() {
        let mut unit = unit();
        for _ in 0..3 {
            unit.select_field(1);
        }
        assert_eq!(unit.editor().current_field(), Field::Curve);
        assert_eq!(unit.status().value_text().as_str(), "Linear");
    }
}
