//! Per-controller interaction state and the click/drag state machine.

use crate::lmatrix::LMatrix2;
use crate::navigation::Navigation;
use crate::types::{Side, Space};
use crate::widget::WidgetKey;
use glam::{Mat4, Quat, Vec3};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ButtonState {
    #[default]
    Idle,
    Down,
    /// Released before any drag threshold was reached. Lasts one frame.
    Release,
    Drag,
    /// Released after dragging. Lasts one frame.
    DragRelease,
}

impl ButtonState {
    pub const ALL: [ButtonState; 5] = [
        ButtonState::Idle,
        ButtonState::Down,
        ButtonState::Release,
        ButtonState::Drag,
        ButtonState::DragRelease,
    ];
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Bimanual {
    #[default]
    Off,
    First,
    Second,
}

/// What a widget is told about an interaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WidgetEvent {
    Click,
    DragStart,
    DragContd,
    DragStop,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragThresholds {
    /// Meters.
    pub distance: f32,
    /// Degrees.
    pub rotation: f32,
    /// Milliseconds.
    pub time: u64,
}

impl DragThresholds {
    pub fn from_config(config: &crate::Config) -> Self {
        Self {
            distance: config.drag_threshold_distance,
            rotation: config.drag_threshold_rotation,
            time: config.drag_threshold_time,
        }
    }

    #[inline]
    pub fn exceeded(&self, input: &FsmInput) -> bool {
        input.elapsed >= self.time || input.distance >= self.distance || input.rotation >= self.rotation
    }
}

/// Everything the state machine looks at in one frame.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FsmInput {
    pub button_down: bool,
    /// Milliseconds since the press.
    pub elapsed: u64,
    /// Meters travelled since the press.
    pub distance: f32,
    /// Degrees turned since the press.
    pub rotation: f32,
}

/// Advances the click/drag state machine by one frame. Every state/input pair has exactly one
/// outcome.
pub fn step(
    state: ButtonState,
    input: &FsmInput,
    thresholds: &DragThresholds,
) -> (ButtonState, Option<WidgetEvent>) {
    match state {
        ButtonState::Idle if input.button_down => (ButtonState::Down, None),
        ButtonState::Idle => (ButtonState::Idle, None),
        ButtonState::Down if thresholds.exceeded(input) => {
            (ButtonState::Drag, Some(WidgetEvent::DragStart))
        }
        ButtonState::Down if input.button_down => (ButtonState::Down, None),
        ButtonState::Down => (ButtonState::Release, Some(WidgetEvent::Click)),
        ButtonState::Release | ButtonState::DragRelease => (ButtonState::Idle, None),
        ButtonState::Drag if input.button_down => {
            (ButtonState::Drag, Some(WidgetEvent::DragContd))
        }
        ButtonState::Drag => (ButtonState::DragRelease, Some(WidgetEvent::DragStop)),
    }
}

#[derive(Clone, Debug)]
pub struct Cursor {
    /// Controller slot this cursor follows.
    pub index: usize,
    /// Hand side, `None` for auxiliary trackers.
    pub side: Option<Side>,
    pub position: LMatrix2,
    pub last_position: LMatrix2,
    pub active: bool,
    pub visible: bool,
    /// Milliseconds.
    pub last_update: u64,
    pub buttons: u64,
    pub last_buttons: u64,
    pub trigger: bool,
    pub grip: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,

    pub interaction_state: ButtonState,
    pub interaction_button: u64,
    pub interaction_position: LMatrix2,
    /// Milliseconds.
    pub interaction_time: u64,
    pub interaction_ctrl: bool,
    pub interaction_shift: bool,
    pub interaction_alt: bool,
    /// The widget handling the current interaction. Not owned.
    pub interaction_widget: Option<WidgetKey>,

    pub offset_pos: Vec3,
    pub offset_rot: Quat,
    pub bimanual: Bimanual,
    /// Index of the cursor on the other hand.
    pub other_hand: Option<usize>,
    pub reference: Space,
}

impl Cursor {
    pub fn new(index: usize, side: Option<Side>) -> Self {
        Self {
            index,
            side,
            position: LMatrix2::default(),
            last_position: LMatrix2::default(),
            active: false,
            visible: false,
            last_update: 0,
            buttons: 0,
            last_buttons: 0,
            trigger: false,
            grip: false,
            ctrl: false,
            shift: false,
            alt: false,
            interaction_state: ButtonState::Idle,
            interaction_button: 0,
            interaction_position: LMatrix2::default(),
            interaction_time: 0,
            interaction_ctrl: false,
            interaction_shift: false,
            interaction_alt: false,
            interaction_widget: None,
            offset_pos: Vec3::ZERO,
            offset_rot: Quat::IDENTITY,
            bimanual: Bimanual::Off,
            other_hand: side.map(|s| s.other().index()),
            reference: Space::Real,
        }
    }

    /// Moves the cursor to a new controller pose, applying the cursor offset.
    pub fn set_pose(&mut self, controller: Mat4, now: u64) {
        self.last_position = self.position;
        let offset = Mat4::from_rotation_translation(self.offset_rot, self.offset_pos);
        self.position.set(controller * offset, Space::Real);
        self.last_update = now;
    }

    /// Buttons that went down this frame.
    #[inline]
    pub fn pressed(&self) -> u64 {
        self.buttons & !self.last_buttons
    }

    /// Claims the cursor for `widget`. Only an idle cursor can start an interaction.
    pub fn begin_interaction(&mut self, button: u64, widget: WidgetKey, now: u64) -> bool {
        if self.interaction_state != ButtonState::Idle {
            return false;
        }
        self.interaction_state = ButtonState::Down;
        self.interaction_button = button;
        self.interaction_widget = Some(widget);
        self.interaction_position = self.position;
        self.interaction_time = now;
        self.interaction_ctrl = self.ctrl;
        self.interaction_shift = self.shift;
        self.interaction_alt = self.alt;
        true
    }

    /// Samples the state machine input for the current interaction.
    pub fn fsm_input(&mut self, now: u64, nav: &Navigation) -> FsmInput {
        let current = self.position.get(Space::Real, false, nav);
        let start = self.interaction_position.get(Space::Real, false, nav);
        let (_, rot_now, pos_now) = current.to_scale_rotation_translation();
        let (_, rot_start, pos_start) = start.to_scale_rotation_translation();
        FsmInput {
            button_down: self.buttons & self.interaction_button != 0,
            elapsed: now.saturating_sub(self.interaction_time),
            distance: pos_now.distance(pos_start),
            rotation: rot_start.angle_between(rot_now).to_degrees(),
        }
    }

    pub fn end_interaction(&mut self) {
        self.interaction_widget = None;
        self.interaction_button = 0;
        self.bimanual = Bimanual::Off;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: DragThresholds = DragThresholds {
        distance: 0.012,
        rotation: 8.0,
        time: 150,
    };

    fn input(button_down: bool, elapsed: u64, distance: f32, rotation: f32) -> FsmInput {
        FsmInput {
            button_down,
            elapsed,
            distance,
            rotation,
        }
    }

    #[test]
    fn transition_table() {
        use ButtonState::*;
        use WidgetEvent::*;
        let still = |down| input(down, 10, 0.0, 0.0);
        let rows = [
            (Idle, still(false), Idle, None),
            (Idle, still(true), Down, None),
            (Idle, input(true, 1000, 1.0, 90.0), Down, None),
            (Down, still(true), Down, None),
            (Down, input(true, 149, 0.0119, 7.9), Down, None),
            (Down, still(false), Release, Some(Click)),
            (Down, input(false, 149, 0.0119, 7.9), Release, Some(Click)),
            (Down, input(true, 150, 0.0, 0.0), Drag, Some(DragStart)),
            (Down, input(true, 10, 0.012, 0.0), Drag, Some(DragStart)),
            (Down, input(true, 10, 0.0, 8.0), Drag, Some(DragStart)),
            (Down, input(false, 150, 0.0, 0.0), Drag, Some(DragStart)),
            (Release, still(false), Idle, None),
            (Release, still(true), Idle, None),
            (Drag, still(true), Drag, Some(DragContd)),
            (Drag, input(true, 0, 0.0, 0.0), Drag, Some(DragContd)),
            (Drag, still(false), DragRelease, Some(DragStop)),
            (DragRelease, still(false), Idle, None),
            (DragRelease, still(true), Idle, None),
        ];
        for (state, i, next, event) in rows {
            assert_eq!(step(state, &i, &T), (next, event), "{state:?} {i:?}");
        }
        for state in ButtonState::ALL {
            assert!(
                rows.iter().any(|row| row.0 == state),
                "{state:?} has no row"
            );
        }
    }

    #[test]
    fn quick_tap_is_a_click() {
        let (s, e) = step(ButtonState::Idle, &input(true, 0, 0.0, 0.0), &T);
        assert_eq!((s, e), (ButtonState::Down, None));
        let (s, e) = step(s, &input(false, 40, 0.001, 1.0), &T);
        assert_eq!((s, e), (ButtonState::Release, Some(WidgetEvent::Click)));
        let (s, e) = step(s, &input(false, 60, 0.0, 0.0), &T);
        assert_eq!((s, e), (ButtonState::Idle, None));
    }

    #[test]
    fn each_threshold_starts_a_drag() {
        for i in [
            input(true, 150, 0.0, 0.0),
            input(true, 0, 0.012, 0.0),
            input(true, 0, 0.0, 8.0),
            // released on the same frame the threshold was crossed
            input(false, 0, 0.02, 0.0),
        ] {
            assert_eq!(
                step(ButtonState::Down, &i, &T),
                (ButtonState::Drag, Some(WidgetEvent::DragStart)),
                "{i:?}"
            );
        }
    }

    #[test]
    fn busy_cursor_keeps_its_widget() {
        let mut keys = slotmap::SlotMap::<WidgetKey, ()>::with_key();
        let a = keys.insert(());
        let b = keys.insert(());

        let mut cursor = Cursor::new(1, Some(Side::Right));
        assert_eq!(cursor.other_hand, Some(0));
        assert!(cursor.begin_interaction(crate::types::buttons::TRIGGER, a, 10));
        assert!(!cursor.begin_interaction(crate::types::buttons::STICK, b, 20));
        assert_eq!(cursor.interaction_widget, Some(a));
        assert_eq!(cursor.interaction_time, 10);
    }

    #[test]
    fn movement_is_measured_from_the_press() {
        let nav = Navigation::new(0.001, 1000.0);
        let mut keys = slotmap::SlotMap::<WidgetKey, ()>::with_key();
        let w = keys.insert(());

        let mut cursor = Cursor::new(0, Some(Side::Left));
        cursor.set_pose(Mat4::IDENTITY, 0);
        cursor.buttons = crate::types::buttons::TRIGGER;
        cursor.begin_interaction(crate::types::buttons::TRIGGER, w, 0);
        cursor.set_pose(
            Mat4::from_rotation_translation(
                Quat::from_rotation_z(10f32.to_radians()),
                Vec3::new(0.0, 0.05, 0.0),
            ),
            30,
        );
        let i = cursor.fsm_input(30, &nav);
        assert!(i.button_down);
        assert_eq!(i.elapsed, 30);
        assert!((i.distance - 0.05).abs() < 1e-5);
        assert!((i.rotation - 10.0).abs() < 1e-2);
    }
}
