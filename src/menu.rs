mod catalog;
mod commit;
mod radial;
mod render;


pub use catalog::{slot_state, slots, Entry, MenuItem, MenuType, SlotContext, SlotState, SlotView};
pub use commit::Commit;
pub use radial::Ring;

use crate::draw::Canvas;
use crate::tools::{ToolKind, ToolState};
use crate::types::{buttons, DeviceType, Side, Space};
use crate::ui::UiState;
use crate::widget::{IconDraw, Interaction, Widget, WidgetKind};
use glam::Vec2;
use log::{debug, trace};
use std::f32::consts::PI;

/// Below this stick magnitude a quick-adjust menu treats the stick as centred.
const CENTER_DEADZONE: f32 = 0.3;

/// One side's pie menu.
#[derive(Clone, Debug)]
pub struct MenuSession {
    pub menu_type: MenuType,
    /// Submenu nesting; 0 is the top level.
    pub depth: u32,
    /// Last sampled analog input.
    pub stick: Vec2,
    /// Angle of `stick` from up, negative to the left.
    pub angle: f32,
    pub highlight: Option<usize>,
    /// Showing the compact quick-adjust layout of a dragged tool.
    pub action_settings: bool,
    /// The radial menu is open.
    pub active: bool,
    /// What the current menu shows and commits, given the tool state it was last populated with.
    pub items: &'static [MenuItem],
    pub num_items: usize,
}

impl MenuSession {
    fn new(menu_type: MenuType) -> Self {
        Self {
            menu_type,
            depth: 0,
            stick: Vec2::ZERO,
            angle: PI,
            highlight: None,
            action_settings: false,
            active: false,
            items: &[],
            num_items: 0,
        }
    }

    fn populate(&mut self, tools: &ToolState) {
        self.items = self.menu_type.items_for(tools);
        self.num_items = self.menu_type.num_items();
    }

    pub fn item(&self, slot: usize) -> Option<&'static MenuItem> {
        self.items.iter().find(|item| item.slot == slot)
    }

    /// Records a stick sample and moves the highlight. Returns the unwrapped angle, or `None`
    /// when the stick has no direction.
    fn set_stick(&mut self, stick: Vec2) -> Option<f32> {
        self.stick = stick;
        let Some(angle) = radial::signed_angle(stick) else {
            self.highlight = None;
            return None;
        };
        self.angle = angle;
        let ring = Ring::for_items(self.num_items);
        let unwrapped = radial::unwrap(stick, ring)?;
        self.highlight = Some(radial::slot(unwrapped, ring));
        Some(unwrapped)
    }
}

/// Both sides' pie menus.
#[derive(Clone, Debug)]
pub struct MenuState {
    sessions: [MenuSession; 2],
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            sessions: [
                MenuSession::new(MenuType::TsSelect),
                MenuSession::new(MenuType::TsTransform),
            ],
        }
    }
}

impl MenuState {
    #[inline]
    pub fn session(&self, side: Side) -> &MenuSession {
        &self.sessions[side.index()]
    }

    #[inline]
    pub fn session_mut(&mut self, side: Side) -> &mut MenuSession {
        &mut self.sessions[side.index()]
    }

    #[inline]
    pub fn is_active(&self, side: Side) -> bool {
        self.session(side).active
    }

    pub fn set_active(&mut self, side: Side, active: bool) {
        self.session_mut(side).active = active;
    }

    /// Shows `menu` on `side` right away, keeping the current depth.
    pub fn open(&mut self, side: Side, menu: MenuType, tools: &ToolState) {
        let session = self.session_mut(side);
        session.menu_type = menu;
        session.populate(tools);
        session.highlight = None;
        session.active = true;
        debug!("{side:?} menu opened: {menu:?}");
    }

    /// Switches `side` to the quick-adjust menu of `tool`. Returns false if it has none.
    pub fn open_action_settings(&mut self, side: Side, tool: ToolKind, tools: &ToolState) -> bool {
        let Some(menu) = MenuType::action_settings_for(tool) else {
            return false;
        };
        let session = self.session_mut(side);
        session.action_settings = true;
        session.depth = 0;
        self.open(side, menu, tools);
        true
    }

    /// Leaves quick-adjust mode, returning to the menu of the side's current tool.
    pub fn close_action_settings(&mut self, side: Side, tools: &ToolState) {
        let session = self.session_mut(side);
        if !session.action_settings {
            return;
        }
        session.action_settings = false;
        session.active = false;
        session.highlight = None;
        session.menu_type = MenuType::for_current(tools.current(side));
        session.depth = 0;
        session.populate(tools);
    }

    fn apply(&mut self, side: Side, outcome: Commit, tools: &ToolState) {
        let session = self.session_mut(side);
        match outcome {
            Commit::Nothing | Commit::Applied | Commit::Clicked(_) => {}
            Commit::Exit => session.depth = session.depth.saturating_sub(1),
            Commit::Open(menu) => {
                session.menu_type = menu;
                session.depth += 1;
                session.active = true;
                session.highlight = None;
            }
            Commit::Close(parent) => {
                session.menu_type = parent;
                session.depth = session.depth.saturating_sub(1);
            }
            Commit::SwitchTool(tool) => {
                session.menu_type = MenuType::for_current(Some(tool));
                session.depth = 0;
            }
        }
        session.populate(tools);
    }
}

/// Analog input the menu reads on this device: the touchpad on touchpad controllers, the
/// controller's offset from the head on gaze-only headsets and the thumbstick otherwise.
fn sample_stick(cx: &mut Interaction) -> Option<Vec2> {
    let index = cx.side.index();
    match cx.ui.device_type {
        DeviceType::Fove => {
            let nav = &cx.session.navigation;
            let cursor = cx.ui.cursors[cx.cursor]
                .position
                .get(Space::Real, false, nav)
                .w_axis
                .truncate();
            let hmd = cx.session.hmd.get(Space::Real, false, nav);
            let hmd_inv = cx.session.hmd.get(Space::Real, true, nav);
            let v = hmd_inv.transform_vector3(cursor - hmd.w_axis.truncate());
            Some(Vec2::new(v.x, v.y))
        }
        device => {
            let state = cx.session.controller_state(index)?;
            let raw = if device.uses_dpad() {
                state.dpad
            } else {
                state.stick
            };
            Some(Vec2::from_array(raw))
        }
    }
}

/// The radial menu bound to the stick.
pub struct PieMenu;

impl PieMenu {
    /// Samples the stick into the side's session, previewing the strength meter.
    fn track(cx: &mut Interaction) -> Option<f32> {
        let stick = sample_stick(cx)?;
        let ui = &mut *cx.ui;
        let session = ui.menus.session_mut(cx.side);
        session.populate(&ui.tools);
        let unwrapped = session.set_stick(stick);
        trace!("{:?} stick {stick} -> {:?}", cx.side, session.highlight);
        if session.menu_type == MenuType::TsSculptStrength {
            if let Some(strength) = unwrapped.and_then(radial::strength) {
                ui.tools.sculpt.strength = strength;
            }
        }
        unwrapped
    }

    /// Quick-adjust handling while a tool drag holds its menu open: the stick moves the
    /// highlight, pressing it commits the highlighted slot, or the centre option when centred.
    pub(crate) fn action_settings_contd(cx: &mut Interaction) {
        let side = cx.side;
        if !cx.ui.menus.session(side).action_settings {
            return;
        }
        let Some(stick) = sample_stick(cx) else {
            return;
        };
        let stick = if stick.length() < CENTER_DEADZONE {
            Vec2::ZERO
        } else {
            stick
        };
        let ui = &mut *cx.ui;
        let session = ui.menus.session_mut(side);
        session.populate(&ui.tools);
        let unwrapped = session.set_stick(stick);
        let menu = session.menu_type;
        let slot = session.highlight;

        let pressed = cx.ui.cursors[cx.cursor].pressed() & (buttons::STICK | buttons::DPAD) != 0;
        if !pressed {
            return;
        }
        match (slot, unwrapped) {
            (Some(slot), Some(angle2)) => {
                let outcome = commit::commit(menu, slot, angle2, cx);
                debug!("{side:?} {menu:?} slot {slot}: {outcome:?}");
            }
            _ => commit::stick_center_click(menu, cx),
        }
        let ui = &mut *cx.ui;
        ui.menus.session_mut(side).populate(&ui.tools);
    }
}

impl Widget for PieMenu {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Menu
    }

    /// A tap picks the menu for the current tool without opening it, or presses the centre of a
    /// quick-adjust menu. Any submenu left open is closed.
    fn click(&self, cx: &mut Interaction) {
        let side = cx.side;
        let ui = &mut *cx.ui;
        let session = ui.menus.session_mut(side);
        if session.action_settings {
            let menu = session.menu_type;
            commit::stick_center_click(menu, cx);
            return;
        }
        session.menu_type = MenuType::for_current(ui.tools.current(side));
        session.depth = 0;
        session.active = false;
        session.highlight = None;
        session.populate(&ui.tools);
    }

    fn drag_start(&self, cx: &mut Interaction) {
        let side = cx.side;
        let ui = &mut *cx.ui;
        let current = ui.tools.current(side);
        let session = ui.menus.session_mut(side);
        if session.menu_type != MenuType::SwitchTool && !session.action_settings && session.depth == 0
        {
            session.menu_type = MenuType::for_current(current);
        }
        session.populate(&ui.tools);
        session.active = true;
        session.highlight = None;
        debug!("{side:?} pie menu {:?} at depth {}", session.menu_type, session.depth);
        Self::track(cx);
    }

    fn drag_contd(&self, cx: &mut Interaction) {
        if !cx.ui.menus.is_active(cx.side) {
            return;
        }
        Self::track(cx);
    }

    fn drag_stop(&self, cx: &mut Interaction) {
        let side = cx.side;
        let session = cx.ui.menus.session_mut(side);
        if !session.active {
            return;
        }
        session.active = false;
        session.highlight = None;

        // Commit what the last sample showed.
        let menu = session.menu_type;
        let ring = Ring::for_items(session.num_items);
        let Some(angle2) = radial::unwrap(session.stick, ring) else {
            debug!("{side:?} pie menu released without direction");
            return;
        };
        let slot = radial::slot(angle2, ring);
        let outcome = commit::commit(menu, slot, angle2, cx);
        debug!("{side:?} {menu:?} slot {slot}: {outcome:?}");
        let ui = &mut *cx.ui;
        ui.menus.apply(side, outcome, &ui.tools);
    }

    fn render_icon(&self, icon: &IconDraw, ui: &UiState, canvas: &mut dyn Canvas) {
        render::render(icon, ui, canvas);
    }
}
