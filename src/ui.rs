//! Per-frame UI: feeds controller input through the cursor state machines into widgets, draws
//! the controller icons and queues the operations the host has to run.

use crate::config::Config;
use crate::cursor::{self, Bimanual, ButtonState, Cursor, DragThresholds, WidgetEvent};
use crate::draw::Canvas;
use crate::menu::MenuState;
use crate::session::DeviceSession;
use crate::tools::{NavLock, ToolKind, ToolState};
use crate::types::{buttons, DeviceType, Side, Space, MAX_CONTROLLERS};
use crate::widget::{IconDraw, Interaction, WidgetKey, WidgetKind, WidgetRegistry};
use glam::{EulerRot, Mat4, Quat, Vec3};
use log::{debug, trace};

/// Operations only the host application can carry out. Queued by widgets and handed out by
/// [`Ui::take_actions`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HostAction {
    Undo,
    Redo,
    Delete,
    Duplicate,
    Join,
    Separate,
    SwitchComponent,
    SwitchLayout,
    CursorTeleport,
    CursorToWorldOrigin,
    CursorToObjectOrigin,
    ToggleDyntopo,
    ClearAnimationBindings,
    /// A tool bound to a controller received an interaction event.
    Tool {
        tool: ToolKind,
        side: Side,
        event: WidgetEvent,
    },
    /// The VR views should be redrawn.
    Redraw,
}

/// What a controller button is bound to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Widget(WidgetKind),
    /// Whichever tool the side currently holds.
    CurrentTool,
}

const BUTTON_COUNT: usize = buttons::ALL.len();

#[inline]
fn button_index(bit: u64) -> usize {
    bit.trailing_zeros() as usize
}

/// Button-to-widget bindings for both hands.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    bindings: [[Option<Binding>; BUTTON_COUNT]; 2],
}

impl Default for Layout {
    fn default() -> Self {
        let mut hand = [None; BUTTON_COUNT];
        for (bit, binding) in [
            (buttons::TRIGGER, Binding::CurrentTool),
            (buttons::GRIP, Binding::Widget(WidgetKind::Tool(ToolKind::Navi))),
            (buttons::STICK, Binding::Widget(WidgetKind::Menu)),
            (buttons::DPAD, Binding::Widget(WidgetKind::Menu)),
            (buttons::MENU, Binding::Widget(WidgetKind::SwitchTool)),
            (buttons::A, Binding::Widget(WidgetKind::Undo)),
            (buttons::B, Binding::Widget(WidgetKind::Redo)),
            (buttons::THUMBREST, Binding::Widget(WidgetKind::Alt)),
        ] {
            hand[button_index(bit)] = Some(binding);
        }
        Self {
            bindings: [hand; 2],
        }
    }
}

impl Layout {
    pub fn bind(&mut self, side: Side, bit: u64, binding: Option<Binding>) {
        if let Some(slot) = self.bindings[side.index()].get_mut(button_index(bit)) {
            *slot = binding;
        }
    }

    pub fn binding(&self, side: Side, bit: u64) -> Option<Binding> {
        self.bindings[side.index()]
            .get(button_index(bit))
            .copied()
            .flatten()
    }

    /// The widget a button press on `side` goes to right now.
    pub fn resolve(&self, side: Side, bit: u64, tools: &ToolState) -> Option<WidgetKind> {
        match self.binding(side, bit)? {
            Binding::Widget(kind) => Some(kind),
            Binding::CurrentTool => tools.current(side).map(WidgetKind::Tool),
        }
    }
}

/// Where a button's icon sits on the controller, in controller space.
fn icon_offset(bit: u64) -> Option<Vec3> {
    Some(match bit {
        buttons::TRIGGER => Vec3::new(0.0, -0.025, 0.03),
        buttons::GRIP => Vec3::new(0.025, -0.02, 0.06),
        buttons::STICK | buttons::DPAD => Vec3::new(0.0, 0.0, 0.01),
        buttons::MENU => Vec3::new(0.0, 0.0, -0.03),
        buttons::A => Vec3::new(0.015, 0.0, 0.03),
        buttons::B => Vec3::new(-0.015, 0.0, 0.03),
        buttons::THUMBREST => Vec3::new(0.0, 0.01, 0.04),
        _ => return None,
    })
}

/// Touchpad devices draw the menu on the pad, everything else on the stick.
fn icon_shown(bit: u64, device: DeviceType) -> bool {
    match bit {
        buttons::STICK => !device.uses_dpad(),
        buttons::DPAD => device.uses_dpad(),
        _ => true,
    }
}

/// Everything the widgets read and write.
pub struct UiState {
    pub device_type: DeviceType,
    /// Left hand, right hand, auxiliary tracker.
    pub cursors: [Cursor; MAX_CONTROLLERS],
    pub thresholds: DragThresholds,
    pub tools: ToolState,
    pub menus: MenuState,
    /// The host is editing a mesh rather than arranging objects.
    pub edit_mode: bool,
    /// Latched alt modifier.
    pub alt: bool,
    /// Configured near and far clip planes.
    pub clip_defaults: (f32, f32),
    actions: Vec<HostAction>,
}

impl UiState {
    pub fn new(config: &Config, device_type: DeviceType) -> Self {
        Self {
            device_type,
            cursors: [
                Cursor::new(0, Some(Side::Left)),
                Cursor::new(1, Some(Side::Right)),
                Cursor::new(2, None),
            ],
            thresholds: DragThresholds::from_config(config),
            tools: ToolState::default(),
            menus: MenuState::default(),
            edit_mode: false,
            alt: false,
            clip_defaults: (config.clip_near, config.clip_far),
            actions: Vec::new(),
        }
    }

    pub fn push_action(&mut self, action: HostAction) {
        trace!("queued {action:?}");
        self.actions.push(action);
    }

    pub fn pending_actions(&self) -> &[HostAction] {
        &self.actions
    }
}

/// Limits how often queued operations are released to the host.
#[derive(Copy, Clone, Debug)]
struct Throttle {
    /// Milliseconds.
    min: f64,
    /// Milliseconds.
    max: f64,
    last: Option<u64>,
}

impl Throttle {
    /// Pending work is released once `min` has passed; a bare redraw is forced after `max`.
    fn ready(&mut self, now: u64, pending: bool) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => {
                let elapsed = now.saturating_sub(last) as f64;
                elapsed >= self.max || (pending && elapsed >= self.min)
            }
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Grab-air navigation: the scene follows the hand. Scale locks have no effect with one hand.
pub(crate) fn grab_air(cx: &mut Interaction) {
    let nav = &cx.session.navigation;
    let cursor = &mut cx.ui.cursors[cx.cursor];
    let last = cursor.last_position.get(Space::Real, false, nav);
    let current = cursor.position.get(Space::Real, false, nav);
    let delta = lock_navigation(last * current.inverse(), &cx.ui.tools.nav_lock);
    cx.session.apply_navigation(delta, Space::Real);
    for cursor in &mut cx.ui.cursors {
        cursor.position.invalidate_except(Space::Real);
        cursor.last_position.invalidate_except(Space::Real);
        cursor.interaction_position.invalidate_except(Space::Real);
    }
}

/// Strips the components of a real-space navigation step that the locks forbid.
fn lock_navigation(delta: Mat4, locks: &[NavLock; 3]) -> Mat4 {
    let (_, mut rotation, mut translation) = delta.to_scale_rotation_translation();
    match locks[0] {
        NavLock::Trans => translation = Vec3::ZERO,
        NavLock::TransUp => translation.z = 0.0,
        _ => {}
    }
    match locks[1] {
        NavLock::Rot => rotation = Quat::IDENTITY,
        NavLock::RotUp => {
            let (yaw, _, _) = rotation.to_euler(EulerRot::ZYX);
            rotation = Quat::from_rotation_z(yaw);
        }
        _ => {}
    }
    Mat4::from_rotation_translation(rotation, translation)
}

pub struct Ui {
    pub state: UiState,
    pub widgets: WidgetRegistry,
    pub layout: Layout,
    throttle: Throttle,
}

impl Ui {
    pub fn new(config: &Config, device_type: DeviceType) -> Self {
        Self {
            state: UiState::new(config, device_type),
            widgets: WidgetRegistry::default(),
            layout: Layout::default(),
            throttle: Throttle {
                min: config.min_update_interval,
                max: config.max_update_interval,
                last: None,
            },
        }
    }

    /// Reads the freshly polled controllers and runs every cursor's state machine once.
    pub fn update_tracking(&mut self, session: &mut DeviceSession, now: u64) {
        let Some(states) = session.controller_states.as_deref().copied() else {
            return;
        };

        for (index, state) in states.iter().enumerate() {
            let pose = session.controller(index, Space::Real);
            let cursor = &mut self.state.cursors[index];
            cursor.active = state.is_available();
            cursor.visible = cursor.active;
            cursor.last_buttons = cursor.buttons;
            if cursor.active {
                cursor.buttons = state.buttons;
                cursor.set_pose(pose, now);
            } else {
                cursor.buttons = 0;
            }
            cursor.trigger = state.pressed(buttons::TRIGGER);
            cursor.grip = state.pressed(buttons::GRIP);
            cursor.alt = self.state.alt;
        }

        for index in 0..MAX_CONTROLLERS {
            self.step_cursor(index, session, now);
        }
    }

    fn step_cursor(&mut self, index: usize, session: &mut DeviceSession, now: u64) {
        let Ui {
            state,
            widgets,
            layout,
            ..
        } = self;
        let Some(side) = state.cursors[index].side else {
            return;
        };

        if state.cursors[index].interaction_state == ButtonState::Idle {
            let pressed = state.cursors[index].pressed();
            let claim = buttons::ALL
                .into_iter()
                .filter(|&bit| pressed & bit != 0)
                .find_map(|bit| {
                    let kind = layout.resolve(side, bit, &state.tools)?;
                    widgets.key(kind).map(|key| (bit, kind, key))
                });
            if let Some((bit, kind, key)) = claim {
                if state.cursors[index].begin_interaction(bit, key, now) {
                    debug!("{side:?} button {bit:#x} down on {kind:?}");
                }
            }
            return;
        }

        let cursor = &mut state.cursors[index];
        let input = cursor.fsm_input(now, &session.navigation);
        let (next, event) = cursor::step(cursor.interaction_state, &input, &state.thresholds);
        cursor.interaction_state = next;
        let (Some(event), Some(key)) = (event, cursor.interaction_widget) else {
            return;
        };

        if event == WidgetEvent::DragStart {
            pair_hands(state, index, key);
        }
        if let Some(widget) = widgets.get(key) {
            trace!("{side:?} {event:?} -> {:?}", widget.kind());
            let mut cx = Interaction {
                side,
                cursor: index,
                now,
                ui: &mut *state,
                session: &mut *session,
                widgets: &*widgets,
            };
            widget.dispatch(event, &mut cx);
        }
        if matches!(event, WidgetEvent::Click | WidgetEvent::DragStop) {
            if state.cursors[index].bimanual != Bimanual::Off {
                if let Some(other) = state.cursors[index].other_hand {
                    state.cursors[other].bimanual = Bimanual::Off;
                }
            }
            state.cursors[index].end_interaction();
        }
    }

    /// Draws every visible controller's button icons for one eye.
    pub fn render(
        &mut self,
        eye: Side,
        view: Mat4,
        session: &mut DeviceSession,
        canvas: &mut dyn Canvas,
    ) {
        crate::tracy_span!("Ui::render");
        trace!("drawing controllers for the {eye:?} eye");
        canvas.update_modelview_matrix(None, Some(view));
        let states = session.controller_states.as_deref().copied();
        let device = self.state.device_type;

        for index in 0..MAX_CONTROLLERS {
            let cursor = &mut self.state.cursors[index];
            let Some(hand) = cursor.side else {
                continue;
            };
            if !cursor.visible {
                continue;
            }
            let pose = cursor.position.get(Space::Scene, false, &session.navigation);
            let busy = cursor.interaction_widget;
            let touched = states.map_or(0, |s| s[index].buttons_touched);

            for bit in buttons::ALL {
                if !icon_shown(bit, device) {
                    continue;
                }
                let Some(offset) = icon_offset(bit) else {
                    continue;
                };
                let Some(kind) = self.layout.resolve(hand, bit, &self.state.tools) else {
                    continue;
                };
                let Some(key) = self.widgets.key(kind) else {
                    continue;
                };
                let Some(widget) = self.widgets.get(key) else {
                    continue;
                };
                let icon = IconDraw {
                    transform: pose * Mat4::from_translation(offset),
                    side: hand,
                    active: busy == Some(key),
                    touched: touched & bit != 0,
                };
                widget.render_icon(&icon, &self.state, canvas);
            }
        }
    }

    /// Queued host operations followed by a redraw request, or nothing while throttled.
    pub fn take_actions(&mut self, now: u64) -> Vec<HostAction> {
        let pending = !self.state.actions.is_empty();
        if !self.throttle.ready(now, pending) {
            return Vec::new();
        }
        let mut actions = std::mem::take(&mut self.state.actions);
        actions.push(HostAction::Redraw);
        actions
    }
}

/// A drag joining one the other hand already holds on the same widget makes it two-handed.
fn pair_hands(state: &mut UiState, index: usize, key: WidgetKey) {
    let Some(other) = state.cursors[index].other_hand else {
        return;
    };
    let o = &state.cursors[other];
    if o.interaction_widget == Some(key) && o.interaction_state == ButtonState::Drag {
        state.cursors[other].bimanual = Bimanual::First;
        state.cursors[index].bimanual = Bimanual::Second;
        debug!("bimanual drag on {key:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ControllerState;

    fn session() -> DeviceSession {
        let mut session = DeviceSession::new(&Config::default());
        let mut states = [ControllerState::default(); MAX_CONTROLLERS];
        states[0].available = 1;
        states[1].available = 1;
        session.controller_states = Some(Box::new(states));
        session
    }

    fn press(session: &mut DeviceSession, index: usize, bits: u64) {
        let states = session.controller_states.as_deref_mut().expect("states");
        states[index].buttons = bits;
    }

    #[test]
    fn default_layout() {
        let layout = Layout::default();
        let tools = ToolState::default();
        assert_eq!(
            layout.resolve(Side::Left, buttons::TRIGGER, &tools),
            Some(WidgetKind::Tool(ToolKind::Select))
        );
        assert_eq!(
            layout.resolve(Side::Right, buttons::TRIGGER, &tools),
            Some(WidgetKind::Tool(ToolKind::Transform))
        );
        for bit in [buttons::STICK, buttons::DPAD] {
            assert_eq!(
                layout.resolve(Side::Right, bit, &tools),
                Some(WidgetKind::Menu)
            );
        }
        assert_eq!(layout.resolve(Side::Left, buttons::SYSTEM, &tools), None);

        let mut layout = layout;
        layout.bind(Side::Left, buttons::A, None);
        assert_eq!(layout.binding(Side::Left, buttons::A), None);
        assert_eq!(
            layout.binding(Side::Right, buttons::A),
            Some(Binding::Widget(WidgetKind::Undo))
        );
    }

    #[test]
    fn tap_queues_host_action() {
        crate::init_logging();
        let mut ui = Ui::new(&Config::default(), DeviceType::Index);
        let mut session = session();

        press(&mut session, 1, buttons::A);
        ui.update_tracking(&mut session, 0);
        assert_eq!(ui.state.cursors[1].interaction_state, ButtonState::Down);

        press(&mut session, 1, 0);
        ui.update_tracking(&mut session, 30);
        assert_eq!(ui.state.cursors[1].interaction_state, ButtonState::Release);
        assert_eq!(ui.state.pending_actions(), &[HostAction::Undo]);
        assert_eq!(ui.state.cursors[1].interaction_widget, None);

        ui.update_tracking(&mut session, 40);
        assert_eq!(ui.state.cursors[1].interaction_state, ButtonState::Idle);
    }

    #[test]
    fn held_trigger_drags_current_tool() {
        crate::init_logging();
        let mut ui = Ui::new(&Config::default(), DeviceType::Index);
        let mut session = session();

        press(&mut session, 0, buttons::TRIGGER);
        ui.update_tracking(&mut session, 0);
        ui.update_tracking(&mut session, 200);
        ui.update_tracking(&mut session, 220);
        press(&mut session, 0, 0);
        ui.update_tracking(&mut session, 240);

        let tool = |event| HostAction::Tool {
            tool: ToolKind::Select,
            side: Side::Left,
            event,
        };
        assert_eq!(
            ui.state.pending_actions(),
            &[
                tool(WidgetEvent::DragStart),
                tool(WidgetEvent::DragContd),
                tool(WidgetEvent::DragStop),
            ]
        );
    }

    #[test]
    fn same_tool_in_both_hands_is_bimanual() {
        crate::init_logging();
        let mut ui = Ui::new(&Config::default(), DeviceType::Index);
        ui.state
            .tools
            .set_current(Side::Left, Some(ToolKind::Transform));
        let mut session = session();

        press(&mut session, 1, buttons::TRIGGER);
        ui.update_tracking(&mut session, 0);
        press(&mut session, 0, buttons::TRIGGER);
        ui.update_tracking(&mut session, 200);
        assert_eq!(ui.state.cursors[1].interaction_state, ButtonState::Drag);
        ui.update_tracking(&mut session, 400);
        assert_eq!(ui.state.cursors[0].interaction_state, ButtonState::Drag);
        assert_eq!(ui.state.cursors[1].bimanual, Bimanual::First);
        assert_eq!(ui.state.cursors[0].bimanual, Bimanual::Second);

        press(&mut session, 0, 0);
        ui.update_tracking(&mut session, 420);
        assert_eq!(ui.state.cursors[0].bimanual, Bimanual::Off);
        assert_eq!(ui.state.cursors[1].bimanual, Bimanual::Off);
    }

    #[test]
    fn actions_are_throttled() {
        let config = Config {
            min_update_interval: 10.0,
            max_update_interval: 100.0,
            ..Default::default()
        };
        let mut ui = Ui::new(&config, DeviceType::Index);
        assert_eq!(ui.take_actions(0), vec![HostAction::Redraw]);

        ui.state.push_action(HostAction::Undo);
        assert!(ui.take_actions(5).is_empty(), "inside the minimum interval");
        assert_eq!(ui.state.pending_actions(), &[HostAction::Undo]);
        assert_eq!(
            ui.take_actions(10),
            vec![HostAction::Undo, HostAction::Redraw]
        );

        assert!(ui.take_actions(50).is_empty(), "nothing pending");
        assert_eq!(ui.take_actions(110), vec![HostAction::Redraw]);
    }

    #[test]
    fn navigation_locks() {
        let step = Mat4::from_rotation_translation(
            Quat::from_rotation_x(0.3) * Quat::from_rotation_z(0.5),
            Vec3::new(0.1, 0.2, 0.3),
        );
        let free = lock_navigation(step, &[NavLock::None; 3]);
        assert!(free.abs_diff_eq(step, 1e-5));

        let locked = lock_navigation(step, &[NavLock::Trans, NavLock::Rot, NavLock::None]);
        assert!(locked.abs_diff_eq(Mat4::IDENTITY, 1e-6));

        let upright = lock_navigation(step, &[NavLock::TransUp, NavLock::RotUp, NavLock::None]);
        let (_, rotation, translation) = upright.to_scale_rotation_translation();
        assert_eq!(translation.z, 0.0);
        let up = rotation * Vec3::Z;
        assert!(up.abs_diff_eq(Vec3::Z, 1e-5), "{up}");
    }
}
