//! What releasing the stick over a slot does, per menu.

use super::catalog::{
    Entry, MenuType, ANNOTATE_LAYER_BY_SLOT, PRIMITIVE_BY_SLOT, SCULPT_DRAW_BY_SLOT,
    SCULPT_GRAB_BY_SLOT, SCULPT_OTHER_BY_SLOT, SCULPT_SMOOTH_BY_SLOT, SWITCH_TOOL_SLOTS,
};
use super::radial;
use crate::tools::{
    AnimationBinding, ConstraintMode, ExtrudeMode, NavLock, SculptBrush, SelectionMode, SnapMode,
    StrokeMode, ToolKind, TransformMode, TransformSettings, TransformSpace,
};
use crate::types::DeviceType;
use crate::ui::HostAction;
use crate::widget::{Interaction, SwitchSpace, WidgetKind};
use log::debug;

const MANIPULATOR_SCALE_MAX: f32 = 1.0;
const EXTRUDE_MANIPULATOR_SCALE_MAX: f32 = 5.0;
const MANIPULATOR_SCALE_MIN: f32 = 0.05;
const MAX_SEGMENTS: u32 = 100;

/// The outcome of a release, for the menu state to act on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Commit {
    /// Empty slot, exit at the top level, or a slot unavailable on this device.
    Nothing,
    /// Tool settings changed.
    Applied,
    /// Another widget's click ran.
    Clicked(WidgetKind),
    /// Leave one submenu level.
    Exit,
    /// Open a nested menu.
    Open(MenuType),
    /// The submenu closes itself, returning to its parent.
    Close(MenuType),
    /// A new tool was picked.
    SwitchTool(ToolKind),
}

pub(super) fn commit(menu: MenuType, slot: usize, angle2: f32, cx: &mut Interaction) -> Commit {
    // Submenus that close themselves do so whatever was picked.
    if let Some(parent) = menu.parent() {
        if !menu.is_exit(slot) {
            sculpt_submenu(menu, slot, angle2, cx);
        }
        return Commit::Close(parent);
    }

    if menu.is_exit(slot) {
        return if menu.is_action_settings() {
            Commit::Nothing
        } else {
            Commit::Exit
        };
    }

    match menu {
        MenuType::Main8 | MenuType::Main12 => main(menu, slot, cx),
        MenuType::SwitchTool => switch_tool(slot, cx),
        MenuType::AsNavi => as_navi(slot, cx),
        MenuType::AsTransform => as_transform(slot, cx),
        MenuType::AsExtrude => {
            manipulator_size(
                &mut cx.ui.tools.transform,
                slot,
                EXTRUDE_MANIPULATOR_SCALE_MAX,
            )
        }
        MenuType::AsSculpt => {
            let axis = match slot {
                0 => 1,
                1 => 0,
                2 => 2,
                _ => return Commit::Nothing,
            };
            let symmetry = &mut cx.ui.tools.sculpt.symmetry;
            symmetry[axis] = !symmetry[axis];
            Commit::Applied
        }
        MenuType::AsAnimation => as_animation(slot, cx),
        MenuType::TsSelect => {
            let tools = &mut cx.ui.tools;
            match slot {
                0 => tools.mouse_cursor = !tools.mouse_cursor,
                1 => tools.selection_mode = SelectionMode::Raycast,
                2 => tools.selection_mode = SelectionMode::Proximity,
                _ => return Commit::Nothing,
            }
            Commit::Applied
        }
        MenuType::TsCursor => {
            let action = match slot {
                0 => HostAction::CursorTeleport,
                1 => HostAction::CursorToWorldOrigin,
                2 => HostAction::CursorToObjectOrigin,
                _ => return Commit::Nothing,
            };
            cx.ui.push_action(action);
            Commit::Applied
        }
        MenuType::TsTransform => ts_transform(slot, cx),
        MenuType::TsAnnotate => match ANNOTATE_LAYER_BY_SLOT.get(slot).copied().flatten() {
            Some(layer) => {
                cx.ui.tools.annotate.active_layer = layer;
                Commit::Applied
            }
            None => Commit::Nothing,
        },
        MenuType::TsMeasure => {
            let (near, far) = cx.ui.clip_defaults;
            let session = &mut *cx.session;
            match slot {
                0 => {
                    session.clip_start = near;
                    session.clip_end = far;
                }
                2 if session.clip_end < far * 10000.0 => session.clip_end *= 10.0,
                1 if session.clip_end > 1.0 => session.clip_end /= 10.0,
                _ => return Commit::Nothing,
            }
            debug!("clip range now {}..{}", session.clip_start, session.clip_end);
            Commit::Applied
        }
        MenuType::TsAddPrimitive => match slot {
            9 => click(cx, WidgetKind::Separate),
            10 => click(cx, WidgetKind::Join),
            _ => match PRIMITIVE_BY_SLOT.get(slot).copied().flatten() {
                Some(primitive) => {
                    cx.ui.tools.primitive = Some(primitive);
                    Commit::Applied
                }
                None => Commit::Nothing,
            },
        },
        MenuType::TsExtrude => {
            let extrude = &mut cx.ui.tools.extrude;
            match slot {
                0 => extrude.mode = ExtrudeMode::Normals,
                1 => extrude.mode = ExtrudeMode::Region,
                2 => extrude.mode = ExtrudeMode::Individual,
                3 => extrude.flip_normals = !extrude.flip_normals,
                4 => extrude.transform = !extrude.transform,
                _ => return Commit::Nothing,
            }
            Commit::Applied
        }
        MenuType::TsInsetFaces => {
            let inset = &mut cx.ui.tools.inset;
            let flag = match slot {
                0 => &mut inset.individual,
                1 => &mut inset.even_offset,
                2 => &mut inset.relative_offset,
                3 => &mut inset.boundary,
                4 => &mut inset.outset,
                _ => return Commit::Nothing,
            };
            *flag = !*flag;
            Commit::Applied
        }
        MenuType::TsBevel => {
            let bevel = &mut cx.ui.tools.bevel;
            match slot {
                0 => bevel.vertex_only = !bevel.vertex_only,
                2 if bevel.segments < MAX_SEGMENTS => bevel.segments += 1,
                1 if bevel.segments > 1 => bevel.segments -= 1,
                _ => return Commit::Nothing,
            }
            Commit::Applied
        }
        MenuType::TsLoopCut => {
            let loop_cut = &mut cx.ui.tools.loop_cut;
            match slot {
                0 => loop_cut.edge_slide = !loop_cut.edge_slide,
                4 => loop_cut.clamp = !loop_cut.clamp,
                2 if loop_cut.cuts < MAX_SEGMENTS => loop_cut.cuts += 1,
                1 if loop_cut.cuts > 1 => loop_cut.cuts -= 1,
                3 => loop_cut.flipped = !loop_cut.flipped,
                _ => return Commit::Nothing,
            }
            Commit::Applied
        }
        MenuType::TsKnife => {
            if !available(menu, slot, cx.ui.device_type) {
                return Commit::Nothing;
            }
            match slot {
                0 => click(cx, WidgetKind::SwitchSpace),
                1 => click(cx, WidgetKind::Undo),
                2 => click(cx, WidgetKind::Redo),
                _ => Commit::Nothing,
            }
        }
        MenuType::TsSculpt => ts_sculpt(slot, cx),
        MenuType::TsAnimation => {
            let animation = &mut cx.ui.tools.animation;
            animation.binding = match slot {
                0 => AnimationBinding::Hmd,
                1 => AnimationBinding::LeftController,
                2 => AnimationBinding::RightController,
                3 => AnimationBinding::Tracker,
                4 => AnimationBinding::None,
                _ => return Commit::Nothing,
            };
            if slot == 4 {
                cx.ui.push_action(HostAction::ClearAnimationBindings);
            }
            Commit::Applied
        }
        // self-closing submenus were handled above
        MenuType::TsSculptDraw
        | MenuType::TsSculptSmooth
        | MenuType::TsSculptGrab
        | MenuType::TsSculptOther
        | MenuType::TsSculptStrength => Commit::Nothing,
    }
}

fn click(cx: &mut Interaction, kind: WidgetKind) -> Commit {
    cx.click_widget(kind);
    Commit::Clicked(kind)
}

fn main(menu: MenuType, slot: usize, cx: &mut Interaction) -> Commit {
    let item = cx.ui.menus.session(cx.side).item(slot);
    match item.map(|item| item.entry) {
        Some(Entry::Widget(WidgetKind::Menu)) => Commit::Open(MenuType::Main8),
        Some(Entry::Widget(kind)) => click(cx, kind),
        _ => Commit::Nothing,
    }
}

fn switch_tool(slot: usize, cx: &mut Interaction) -> Commit {
    let Some(&tool) = SWITCH_TOOL_SLOTS.get(slot) else {
        return Commit::Nothing;
    };
    let side = cx.side;
    let tools = &mut cx.ui.tools;
    tools.set_current(side, Some(tool));
    match tool {
        ToolKind::Transform if tools.transform.manipulator => {
            tools.transform.do_render = [true; 2];
        }
        ToolKind::Extrude => {
            let t = &mut tools.transform;
            t.manipulator = true;
            t.omni = true;
            t.mode = TransformMode::Omni;
            t.snap_mode = SnapMode::Translation;
            tools.extrude.do_render = [true; 2];
        }
        ToolKind::Sculpt => {
            tools.sculpt.cursor_side = side;
            tools.sculpt.do_render = [true; 2];
        }
        _ => {}
    }
    debug!("{side:?} tool is now {tool:?}");
    Commit::SwitchTool(tool)
}

fn as_navi(slot: usize, cx: &mut Interaction) -> Commit {
    let tools = &mut cx.ui.tools;
    match slot {
        0 => tools.toggle_nav_lock(1, NavLock::Rot),
        4 => tools.toggle_nav_lock(1, NavLock::RotUp),
        2 => tools.toggle_nav_lock(2, NavLock::Scale),
        6 => tools.toggle_nav_lock(2, NavLock::ScaleReal),
        5 => tools.nav_lock = [NavLock::None; 3],
        1 => tools.toggle_nav_lock(0, NavLock::Trans),
        3 => tools.toggle_nav_lock(0, NavLock::TransUp),
        _ => return Commit::Nothing,
    }
    Commit::Applied
}

fn manipulator_size(t: &mut TransformSettings, slot: usize, max: f32) -> Commit {
    match slot {
        2 => t.manip_scale_factor = (t.manip_scale_factor * 1.2).min(max),
        1 => t.manip_scale_factor = (t.manip_scale_factor * 0.8).max(MANIPULATOR_SCALE_MIN),
        _ => return Commit::Nothing,
    }
    Commit::Applied
}

#[derive(Copy, Clone)]
enum Axes {
    X,
    Y,
    Z,
    XY,
    YZ,
    ZX,
}

impl Axes {
    fn flags(self) -> [bool; 3] {
        match self {
            Axes::X => [true, false, false],
            Axes::Y => [false, true, false],
            Axes::Z => [false, false, true],
            Axes::XY => [true, true, false],
            Axes::YZ => [false, true, true],
            Axes::ZX => [true, false, true],
        }
    }

    fn single(self) -> bool {
        matches!(self, Axes::X | Axes::Y | Axes::Z)
    }

    fn translation(self) -> ConstraintMode {
        match self {
            Axes::X => ConstraintMode::TransX,
            Axes::Y => ConstraintMode::TransY,
            Axes::Z => ConstraintMode::TransZ,
            Axes::XY => ConstraintMode::TransXY,
            Axes::YZ => ConstraintMode::TransYZ,
            Axes::ZX => ConstraintMode::TransZX,
        }
    }

    fn rotation(self) -> Option<ConstraintMode> {
        match self {
            Axes::X => Some(ConstraintMode::RotX),
            Axes::Y => Some(ConstraintMode::RotY),
            Axes::Z => Some(ConstraintMode::RotZ),
            _ => None,
        }
    }

    fn scale(self) -> ConstraintMode {
        match self {
            Axes::X => ConstraintMode::ScaleX,
            Axes::Y => ConstraintMode::ScaleY,
            Axes::Z => ConstraintMode::ScaleZ,
            Axes::XY => ConstraintMode::ScaleXY,
            Axes::YZ => ConstraintMode::ScaleYZ,
            Axes::ZX => ConstraintMode::ScaleZX,
        }
    }
}

fn as_transform(slot: usize, cx: &mut Interaction) -> Commit {
    let t = &mut cx.ui.tools.transform;
    if t.manipulator {
        return manipulator_size(t, slot, MANIPULATOR_SCALE_MAX);
    }

    let axes = match slot {
        0 => Axes::Y,
        4 => Axes::YZ,
        2 => Axes::Z,
        6 => Axes::ZX,
        1 => Axes::X,
        3 => Axes::XY,
        5 => {
            t.constraint_flag = [false; 3];
            t.snap_flag = [true; 3];
            t.constraint_mode = ConstraintMode::None;
            if t.omni {
                t.mode = TransformMode::Omni;
            }
            return Commit::Applied;
        }
        _ => return Commit::Nothing,
    };

    // Rotation can only be constrained to one axis.
    if t.mode == TransformMode::Rotate && !axes.single() {
        return Commit::Nothing;
    }
    t.constraint_flag = axes.flags();
    t.snap_flag = t.constraint_flag;
    match t.mode {
        TransformMode::Omni => {
            t.constraint_mode = axes.translation();
            t.mode = TransformMode::Move;
        }
        TransformMode::Move => t.constraint_mode = axes.translation(),
        TransformMode::Rotate => {
            if let Some(mode) = axes.rotation() {
                t.constraint_mode = mode;
            }
        }
        TransformMode::Scale => t.constraint_mode = axes.scale(),
    }
    Commit::Applied
}

fn as_animation(slot: usize, cx: &mut Interaction) -> Commit {
    let flags = &mut cx.ui.tools.animation.constraint_flag;
    let (kind, axis) = match slot {
        0 => (0, 2),
        4 => (1, 0),
        2 => (1, 1),
        6 => (1, 2),
        1 => (0, 0),
        3 => (0, 1),
        5 => {
            *flags = [[false; 3]; 2];
            return Commit::Applied;
        }
        _ => return Commit::Nothing,
    };
    flags[kind][axis] = !flags[kind][axis];
    Commit::Applied
}

fn ts_transform(slot: usize, cx: &mut Interaction) -> Commit {
    if slot == 5 || slot == 6 {
        // thumbstick controllers have dedicated buttons for these
        if !available(MenuType::TsTransform, slot, cx.ui.device_type) {
            return Commit::Nothing;
        }
        let kind = if slot == 6 {
            WidgetKind::Duplicate
        } else {
            WidgetKind::Delete
        };
        return click(cx, kind);
    }
    let t = &mut cx.ui.tools.transform;
    match slot {
        0 => t.toggle_manipulator(),
        4 => t.select_mode(TransformMode::Scale),
        2 => t.select_mode(TransformMode::Omni),
        1 => t.select_mode(TransformMode::Move),
        3 => t.select_mode(TransformMode::Rotate),
        _ => return Commit::Nothing,
    }
    Commit::Applied
}

fn ts_sculpt(slot: usize, cx: &mut Interaction) -> Commit {
    let sculpt = &mut cx.ui.tools.sculpt;
    match slot {
        0 => Commit::Open(MenuType::TsSculptStrength),
        4 => Commit::Open(MenuType::TsSculptGrab),
        2 => Commit::Open(MenuType::TsSculptOther),
        1 => Commit::Open(MenuType::TsSculptDraw),
        3 => Commit::Open(MenuType::TsSculptSmooth),
        6 => {
            sculpt.dyntopo = !sculpt.dyntopo;
            cx.ui.push_action(HostAction::ToggleDyntopo);
            Commit::Applied
        }
        5 => {
            sculpt.raycast = !sculpt.raycast;
            Commit::Applied
        }
        _ => Commit::Nothing,
    }
}

fn brush_for(menu: MenuType, slot: usize) -> Option<SculptBrush> {
    let table: &[Option<SculptBrush>] = match menu {
        MenuType::TsSculptDraw => &SCULPT_DRAW_BY_SLOT,
        MenuType::TsSculptSmooth => &SCULPT_SMOOTH_BY_SLOT,
        MenuType::TsSculptGrab => &SCULPT_GRAB_BY_SLOT,
        MenuType::TsSculptOther => &SCULPT_OTHER_BY_SLOT,
        _ => return None,
    };
    table.get(slot).copied().flatten()
}

fn sculpt_submenu(menu: MenuType, slot: usize, angle2: f32, cx: &mut Interaction) {
    let sculpt = &mut cx.ui.tools.sculpt;
    if menu == MenuType::TsSculptStrength {
        if let Some(strength) = radial::strength(angle2) {
            sculpt.strength = strength;
        } else if slot == 6 {
            sculpt.strength = 1.0;
        } else if slot == 5 {
            sculpt.use_trigger_pressure = !sculpt.use_trigger_pressure;
        }
        return;
    }
    if let Some(brush) = brush_for(menu, slot) {
        sculpt.brush = brush;
        debug!("sculpt brush is now {brush:?}");
    }
}

/// A press of the stick while it is centred on a quick-adjust menu.
pub(super) fn stick_center_click(menu: MenuType, cx: &mut Interaction) {
    let tools = &mut cx.ui.tools;
    match menu {
        MenuType::AsTransform | MenuType::AsExtrude => {
            tools.transform_space = SwitchSpace::next(tools.transform_space, cx.ui.edit_mode);
        }
        MenuType::AsSculpt => {
            tools.sculpt.stroke = match tools.sculpt.stroke {
                StrokeMode::Normal => StrokeMode::Invert,
                StrokeMode::Invert => StrokeMode::Normal,
            };
        }
        MenuType::AsAnimation => {
            let space = &mut tools.animation.transform_space;
            *space = match *space {
                TransformSpace::Local => TransformSpace::Global,
                _ => TransformSpace::Local,
            };
        }
        _ => {}
    }
}

/// Slots the host device has no use for. Drawn menus leave them empty.
pub(super) fn available(menu: MenuType, slot: usize, device: DeviceType) -> bool {
    match menu {
        MenuType::TsTransform if slot == 5 || slot == 6 => device.uses_dpad(),
        MenuType::TsKnife => device == DeviceType::MagicLeap,
        _ => true,
    }
}
