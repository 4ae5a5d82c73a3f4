//! Screen state and keyboard controls.
//!
//! Keys are mapped to [`UiCommand`]s independently of the windowing layer,
//! so the whole control surface can be driven from tests.

use crate::params::{ControlRanges, MoodPreset};

/// Keys the app reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Number row 1..=5
    Digit(u8),
    Space,
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiCommand {
    SelectMood(u8),
    TogglePlay,
    /// Signed change to the base frequency (Hz)
    AdjustBase(f64),
    /// Signed change to the beat frequency (Hz)
    AdjustBeat(f64),
    Back,
    Quit,
}

impl UiCommand {
    /// Whether a held key keeps issuing this command
    pub fn repeats(&self) -> bool {
        matches!(self, UiCommand::AdjustBase(_) | UiCommand::AdjustBeat(_))
    }
}

/// Slider values of the player screen
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerControls {
    preset: &'static MoodPreset,
    base_hz: f64,
    beat_hz: f64,
}

impl PlayerControls {
    pub fn new(preset: &'static MoodPreset, ranges: &ControlRanges) -> Self {
        Self {
            preset,
            base_hz: ranges.clamp_base(preset.base_hz),
            beat_hz: ranges.clamp_beat(preset.beat_hz),
        }
    }

    pub fn label(&self) -> &'static str {
        self.preset.label
    }

    pub fn base_hz(&self) -> f64 {
        self.base_hz
    }

    pub fn beat_hz(&self) -> f64 {
        self.beat_hz
    }

    /// Override both sliders (clamped); returns whether anything moved
    pub fn set(&mut self, base_hz: f64, beat_hz: f64, ranges: &ControlRanges) -> bool {
        let base_hz = ranges.clamp_base(base_hz);
        let beat_hz = ranges.clamp_beat(beat_hz);
        let changed = base_hz != self.base_hz || beat_hz != self.beat_hz;
        self.base_hz = base_hz;
        self.beat_hz = beat_hz;
        changed
    }

    pub fn adjust_base(&mut self, delta_hz: f64, ranges: &ControlRanges) -> bool {
        self.set(self.base_hz + delta_hz, self.beat_hz, ranges)
    }

    pub fn adjust_beat(&mut self, delta_hz: f64, ranges: &ControlRanges) -> bool {
        self.set(self.base_hz, self.beat_hz + delta_hz, ranges)
    }

    /// Window title: label, both sliders, and the play button's caption
    pub fn title(&self, playing: bool) -> String {
        let button = if playing { "Stop" } else { "Play" };
        format!(
            "{} | Base Frequency {:.2} Hz | Binaural Beat {:.2} Hz | [Space] {}",
            self.label(),
            self.base_hz,
            self.beat_hz,
            button
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    MoodSelect,
    Player(PlayerControls),
}

pub const MOOD_SELECT_TITLE: &str = "How are you feeling? Press 1-5 to begin a session";

/// Current screen plus the control ranges it clamps to
pub struct Ui {
    screen: Screen,
    ranges: ControlRanges,
}

impl Ui {
    pub fn new(ranges: ControlRanges) -> Self {
        Self {
            screen: Screen::MoodSelect,
            ranges,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn ranges(&self) -> &ControlRanges {
        &self.ranges
    }

    pub fn player(&self) -> Option<&PlayerControls> {
        match &self.screen {
            Screen::Player(controls) => Some(controls),
            Screen::MoodSelect => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerControls> {
        match &mut self.screen {
            Screen::Player(controls) => Some(controls),
            Screen::MoodSelect => None,
        }
    }

    /// Map a key press to a command for the current screen.
    ///
    /// Auto-repeat (`repeat`) only drives the sliders; a held key never
    /// toggles playback or changes screens more than once.
    pub fn command_for_key(&self, key: Key, fine: bool, repeat: bool) -> Option<UiCommand> {
        self.command(key, fine)
            .filter(|command| !repeat || command.repeats())
    }

    fn command(&self, key: Key, fine: bool) -> Option<UiCommand> {
        let pick = |(coarse, fine_step): (f64, f64)| if fine { fine_step } else { coarse };

        match (&self.screen, key) {
            (Screen::MoodSelect, Key::Digit(rating)) => MoodPreset::for_rating(rating)
                .map(|preset| UiCommand::SelectMood(preset.rating)),
            (Screen::MoodSelect, Key::Escape) => Some(UiCommand::Quit),
            (Screen::MoodSelect, _) => None,

            (Screen::Player(_), Key::Space) => Some(UiCommand::TogglePlay),
            (Screen::Player(_), Key::Up) => {
                Some(UiCommand::AdjustBase(pick(self.ranges.base_step_hz)))
            }
            (Screen::Player(_), Key::Down) => {
                Some(UiCommand::AdjustBase(-pick(self.ranges.base_step_hz)))
            }
            (Screen::Player(_), Key::Right) => {
                Some(UiCommand::AdjustBeat(pick(self.ranges.beat_step_hz)))
            }
            (Screen::Player(_), Key::Left) => {
                Some(UiCommand::AdjustBeat(-pick(self.ranges.beat_step_hz)))
            }
            (Screen::Player(_), Key::Backspace | Key::Escape) => Some(UiCommand::Back),
            (Screen::Player(_), Key::Digit(_)) => None,
        }
    }

    /// Switch to the player for `rating`; unknown ratings are ignored
    pub fn enter_player(&mut self, rating: u8) -> Option<&PlayerControls> {
        let preset = MoodPreset::for_rating(rating)?;
        self.screen = Screen::Player(PlayerControls::new(preset, &self.ranges));
        self.player()
    }

    pub fn leave_player(&mut self) {
        self.screen = Screen::MoodSelect;
    }

    pub fn title(&self, playing: bool) -> String {
        match &self.screen {
            Screen::MoodSelect => MOOD_SELECT_TITLE.to_string(),
            Screen::Player(controls) => controls.title(playing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(rating: u8) -> Ui {
        let mut ui = Ui::new(ControlRanges::default());
        ui.enter_player(rating);
        ui
    }

    #[test]
    fn test_mood_select_keys() {
        let ui = Ui::new(ControlRanges::default());
        assert_eq!(
            ui.command_for_key(Key::Digit(4), false, false),
            Some(UiCommand::SelectMood(4))
        );
        assert_eq!(ui.command_for_key(Key::Digit(9), false, false), None);
        assert_eq!(ui.command_for_key(Key::Space, false, false), None);
        assert_eq!(ui.command_for_key(Key::Escape, false, false), Some(UiCommand::Quit));
    }

    #[test]
    fn test_player_keys() {
        let ui = player(1);
        assert_eq!(ui.command_for_key(Key::Space, false, false), Some(UiCommand::TogglePlay));
        assert_eq!(ui.command_for_key(Key::Up, false, false), Some(UiCommand::AdjustBase(1.0)));
        assert_eq!(ui.command_for_key(Key::Down, true, false), Some(UiCommand::AdjustBase(-0.1)));
        assert_eq!(ui.command_for_key(Key::Right, false, false), Some(UiCommand::AdjustBeat(0.5)));
        assert_eq!(ui.command_for_key(Key::Left, true, false), Some(UiCommand::AdjustBeat(-0.05)));
        assert_eq!(ui.command_for_key(Key::Escape, false, false), Some(UiCommand::Back));
        assert_eq!(ui.command_for_key(Key::Backspace, false, false), Some(UiCommand::Back));
        assert_eq!(ui.command_for_key(Key::Digit(2), false, false), None);
    }

    #[test]
    fn test_held_keys_only_repeat_sliders() {
        let mut ui = player(2);
        assert_eq!(ui.command_for_key(Key::Space, false, true), None);
        assert_eq!(ui.command_for_key(Key::Backspace, false, true), None);
        assert_eq!(
            ui.command_for_key(Key::Up, true, true),
            Some(UiCommand::AdjustBase(0.1))
        );
        assert_eq!(
            ui.command_for_key(Key::Left, false, true),
            Some(UiCommand::AdjustBeat(-0.5))
        );

        // Holding Escape: the press leaves the player, the repeats do nothing
        assert_eq!(ui.command_for_key(Key::Escape, false, false), Some(UiCommand::Back));
        ui.leave_player();
        assert_eq!(ui.command_for_key(Key::Escape, false, true), None);
        assert_eq!(ui.command_for_key(Key::Digit(1), false, true), None);
        assert_eq!(ui.screen(), &Screen::MoodSelect);
    }

    #[test]
    fn test_enter_player_loads_preset() {
        let mut ui = Ui::new(ControlRanges::default());
        assert!(ui.enter_player(0).is_none());
        assert_eq!(ui.screen(), &Screen::MoodSelect);

        let controls = ui.enter_player(4).cloned().unwrap();
        assert_eq!(controls.label(), "Relaxation");
        assert!((controls.base_hz() - 221.23).abs() < 1e-9);
        assert!((controls.beat_hz() - 7.83).abs() < 1e-9);

        ui.leave_player();
        assert!(ui.player().is_none());
    }

    #[test]
    fn test_adjustments_clamp_to_ranges() {
        let mut ui = player(5);
        let ranges = ui.ranges().clone();
        let controls = ui.player_mut().unwrap();

        assert!(controls.adjust_base(1.0, &ranges));
        assert!((controls.base_hz() - 195.18).abs() < 1e-9);

        assert!(controls.adjust_base(1000.0, &ranges));
        assert!((controls.base_hz() - 500.0).abs() < 1e-9);
        // Already at the top: nothing moves
        assert!(!controls.adjust_base(1.0, &ranges));

        assert!(controls.adjust_beat(-10.0, &ranges));
        assert!((controls.beat_hz() - 0.5).abs() < 1e-9);
        assert!(!controls.adjust_beat(-0.05, &ranges));
    }

    #[test]
    fn test_titles() {
        let mut ui = Ui::new(ControlRanges::default());
        assert_eq!(ui.title(false), MOOD_SELECT_TITLE);

        ui.enter_player(3);
        assert_eq!(
            ui.title(false),
            "Calm Focus | Base Frequency 126.22 Hz | Binaural Beat 10.00 Hz | [Space] Play"
        );
        assert!(ui.title(true).ends_with("[Space] Stop"));
    }
}
