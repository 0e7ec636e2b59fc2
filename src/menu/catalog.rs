//! Which menus exist, what sits in each slot and how each slot reflects current tool state.

use super::radial::Ring;
use crate::tools::{
    AnimationBinding, ExtrudeMode, NavLock, Primitive, SculptBrush, SelectionMode, ToolKind,
    ToolState, TransformMode, ANNOTATION_LAYERS,
};
use crate::types::Side;
use crate::widget::WidgetKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MenuType {
    Main8,
    Main12,
    SwitchTool,
    TsSelect,
    TsCursor,
    TsTransform,
    TsAnnotate,
    TsMeasure,
    TsAddPrimitive,
    TsExtrude,
    TsInsetFaces,
    TsBevel,
    TsLoopCut,
    TsKnife,
    TsSculpt,
    TsSculptDraw,
    TsSculptSmooth,
    TsSculptGrab,
    TsSculptOther,
    TsSculptStrength,
    TsAnimation,
    AsNavi,
    AsTransform,
    AsExtrude,
    AsSculpt,
    AsAnimation,
}

impl MenuType {
    pub const ALL: [MenuType; 26] = [
        MenuType::Main8,
        MenuType::Main12,
        MenuType::SwitchTool,
        MenuType::TsSelect,
        MenuType::TsCursor,
        MenuType::TsTransform,
        MenuType::TsAnnotate,
        MenuType::TsMeasure,
        MenuType::TsAddPrimitive,
        MenuType::TsExtrude,
        MenuType::TsInsetFaces,
        MenuType::TsBevel,
        MenuType::TsLoopCut,
        MenuType::TsKnife,
        MenuType::TsSculpt,
        MenuType::TsSculptDraw,
        MenuType::TsSculptSmooth,
        MenuType::TsSculptGrab,
        MenuType::TsSculptOther,
        MenuType::TsSculptStrength,
        MenuType::TsAnimation,
        MenuType::AsNavi,
        MenuType::AsTransform,
        MenuType::AsExtrude,
        MenuType::AsSculpt,
        MenuType::AsAnimation,
    ];

    /// Clickable slots, not counting the exit region.
    pub fn num_items(self) -> usize {
        match self {
            MenuType::Main8 => 7,
            MenuType::Main12 => 11,
            MenuType::SwitchTool => 12,
            MenuType::TsSelect | MenuType::TsCursor => 3,
            MenuType::TsTransform => 7,
            MenuType::TsAnnotate => 11,
            MenuType::TsMeasure => 3,
            MenuType::TsAddPrimitive => 11,
            MenuType::TsExtrude | MenuType::TsInsetFaces => 5,
            MenuType::TsBevel => 3,
            MenuType::TsLoopCut => 5,
            MenuType::TsKnife => 3,
            MenuType::TsSculpt | MenuType::TsSculptDraw => 7,
            MenuType::TsSculptSmooth | MenuType::TsSculptGrab => 5,
            MenuType::TsSculptOther | MenuType::TsSculptStrength => 2,
            MenuType::TsAnimation => 5,
            MenuType::AsNavi | MenuType::AsTransform => 7,
            MenuType::AsExtrude => 2,
            MenuType::AsSculpt => 3,
            MenuType::AsAnimation => 7,
        }
    }

    #[inline]
    pub fn ring(self) -> Ring {
        Ring::for_items(self.num_items())
    }

    #[inline]
    pub fn is_action_settings(self) -> bool {
        matches!(
            self,
            MenuType::AsNavi
                | MenuType::AsTransform
                | MenuType::AsExtrude
                | MenuType::AsSculpt
                | MenuType::AsAnimation
        )
    }

    /// The tool-settings menu for a tool. Navigation has none.
    pub fn for_tool(tool: ToolKind) -> Option<MenuType> {
        Some(match tool {
            ToolKind::Select => MenuType::TsSelect,
            ToolKind::Cursor => MenuType::TsCursor,
            ToolKind::Transform => MenuType::TsTransform,
            ToolKind::Annotate => MenuType::TsAnnotate,
            ToolKind::Measure => MenuType::TsMeasure,
            ToolKind::AddPrimitive => MenuType::TsAddPrimitive,
            ToolKind::Extrude => MenuType::TsExtrude,
            ToolKind::InsetFaces => MenuType::TsInsetFaces,
            ToolKind::Bevel => MenuType::TsBevel,
            ToolKind::LoopCut => MenuType::TsLoopCut,
            ToolKind::Knife => MenuType::TsKnife,
            ToolKind::Sculpt => MenuType::TsSculpt,
            ToolKind::Animation => MenuType::TsAnimation,
            ToolKind::Navi => return None,
        })
    }

    /// The menu a tap on the stick selects: the current tool's settings, or the main menu.
    pub fn for_current(tool: Option<ToolKind>) -> MenuType {
        tool.and_then(Self::for_tool).unwrap_or(MenuType::Main12)
    }

    /// The quick-adjust menu shown while a tool is dragged, for tools that have one.
    pub fn action_settings_for(tool: ToolKind) -> Option<MenuType> {
        match tool {
            ToolKind::Navi => Some(MenuType::AsNavi),
            ToolKind::Transform => Some(MenuType::AsTransform),
            ToolKind::Extrude => Some(MenuType::AsExtrude),
            ToolKind::Sculpt => Some(MenuType::AsSculpt),
            ToolKind::Animation => Some(MenuType::AsAnimation),
            _ => None,
        }
    }

    /// Menus that close themselves after any selection, and where they return to.
    pub fn parent(self) -> Option<MenuType> {
        match self {
            MenuType::TsSculptDraw
            | MenuType::TsSculptSmooth
            | MenuType::TsSculptGrab
            | MenuType::TsSculptOther
            | MenuType::TsSculptStrength => Some(MenuType::TsSculpt),
            _ => None,
        }
    }

    /// Whether selecting `slot` backs out of the menu rather than choosing something.
    pub fn is_exit(self, slot: usize) -> bool {
        match self.ring() {
            Ring::Twelve => slot == Ring::Twelve.exit_slot() && self != MenuType::SwitchTool,
            Ring::Eight => match self.num_items() {
                7 => slot == 7,
                _ => {
                    ((5..=7).contains(&slot) && self.item(slot).is_none())
                        || (self == MenuType::TsSculptOther && slot == 0)
                }
            },
        }
    }

    /// Slot contents. Slots not listed are empty; the exit slot is never listed.
    pub fn items(self) -> &'static [MenuItem] {
        match self {
            MenuType::Main8 => MAIN_8,
            MenuType::Main12 => MAIN_12,
            MenuType::SwitchTool => SWITCH_TOOL,
            MenuType::TsSelect => TS_SELECT,
            MenuType::TsCursor => TS_CURSOR,
            MenuType::TsTransform => TS_TRANSFORM,
            MenuType::TsAnnotate => TS_ANNOTATE,
            MenuType::TsMeasure => TS_MEASURE,
            MenuType::TsAddPrimitive => TS_ADD_PRIMITIVE,
            MenuType::TsExtrude => TS_EXTRUDE,
            MenuType::TsInsetFaces => TS_INSET_FACES,
            MenuType::TsBevel => TS_BEVEL,
            MenuType::TsLoopCut => TS_LOOP_CUT,
            MenuType::TsKnife => TS_KNIFE,
            MenuType::TsSculpt => TS_SCULPT,
            MenuType::TsSculptDraw => TS_SCULPT_DRAW,
            MenuType::TsSculptSmooth => TS_SCULPT_SMOOTH,
            MenuType::TsSculptGrab => TS_SCULPT_GRAB,
            MenuType::TsSculptOther => TS_SCULPT_OTHER,
            MenuType::TsSculptStrength => TS_SCULPT_STRENGTH,
            MenuType::TsAnimation => TS_ANIMATION,
            MenuType::AsNavi => AS_NAVI,
            MenuType::AsTransform => AS_TRANSFORM,
            MenuType::AsExtrude => AS_EXTRUDE,
            MenuType::AsSculpt => AS_SCULPT,
            MenuType::AsAnimation => AS_ANIMATION,
        }
    }

    /// Slot contents given the current tool state. The transform quick-adjust menu turns into a
    /// manipulator size control while the manipulator is shown.
    pub fn items_for(self, tools: &ToolState) -> &'static [MenuItem] {
        if self == MenuType::AsTransform && tools.transform.manipulator {
            AS_TRANSFORM_MANIPULATOR
        } else {
            self.items()
        }
    }

    pub fn item(self, slot: usize) -> Option<&'static MenuItem> {
        self.items().iter().find(|item| item.slot == slot)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Another widget; selecting it runs its click.
    Widget(WidgetKind),
    /// A setting of the menu's tool.
    Option {
        icon: &'static str,
        label: &'static str,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub slot: usize,
    pub entry: Entry,
}

const fn widget(slot: usize, kind: WidgetKind) -> MenuItem {
    MenuItem {
        slot,
        entry: Entry::Widget(kind),
    }
}

const fn tool(slot: usize, kind: ToolKind) -> MenuItem {
    widget(slot, WidgetKind::Tool(kind))
}

const fn opt(slot: usize, icon: &'static str, label: &'static str) -> MenuItem {
    MenuItem {
        slot,
        entry: Entry::Option { icon, label },
    }
}

static MAIN_8: &[MenuItem] = &[
    widget(0, WidgetKind::Alt),
    widget(1, WidgetKind::Undo),
    widget(2, WidgetKind::Redo),
    widget(3, WidgetKind::SwitchComponent),
    widget(4, WidgetKind::SwitchSpace),
    widget(5, WidgetKind::Delete),
    widget(6, WidgetKind::Duplicate),
];

static MAIN_12: &[MenuItem] = &[
    widget(0, WidgetKind::Menu),
    widget(1, WidgetKind::Undo),
    widget(2, WidgetKind::Redo),
    widget(3, WidgetKind::SwitchComponent),
    widget(4, WidgetKind::SwitchSpace),
    widget(5, WidgetKind::Delete),
    widget(6, WidgetKind::Duplicate),
    widget(7, WidgetKind::Join),
    widget(8, WidgetKind::Separate),
    widget(9, WidgetKind::SwitchLayout),
    widget(10, WidgetKind::SwitchTool),
];

/// Slot to tool in the tool picker.
pub(crate) static SWITCH_TOOL_SLOTS: [ToolKind; 12] = [
    ToolKind::Transform,
    ToolKind::AddPrimitive,
    ToolKind::Extrude,
    ToolKind::Cursor,
    ToolKind::Annotate,
    ToolKind::Select,
    ToolKind::Measure,
    ToolKind::InsetFaces,
    ToolKind::Bevel,
    ToolKind::LoopCut,
    ToolKind::Knife,
    ToolKind::Sculpt,
];

static SWITCH_TOOL: &[MenuItem] = &[
    tool(0, ToolKind::Transform),
    tool(1, ToolKind::AddPrimitive),
    tool(2, ToolKind::Extrude),
    tool(3, ToolKind::Cursor),
    tool(4, ToolKind::Annotate),
    tool(5, ToolKind::Select),
    tool(6, ToolKind::Measure),
    tool(7, ToolKind::InsetFaces),
    tool(8, ToolKind::Bevel),
    tool(9, ToolKind::LoopCut),
    tool(10, ToolKind::Knife),
    tool(11, ToolKind::Sculpt),
];

static TS_SELECT: &[MenuItem] = &[
    opt(0, "mouse_cursor", "MOUSE CURSOR"),
    opt(1, "select_raycast", "RAYCAST"),
    opt(2, "select_proximity", "PROXIMITY"),
];

static TS_CURSOR: &[MenuItem] = &[
    opt(0, "cursor_teleport", "TELEPORT TO CURSOR"),
    opt(1, "cursor_world_origin", "CURSOR TO WORLD ORIGIN"),
    opt(2, "cursor_object_origin", "CURSOR TO OBJECT ORIGIN"),
];

static TS_TRANSFORM: &[MenuItem] = &[
    opt(0, "manipulator", "MANIPULATOR"),
    opt(1, "move", "MOVE"),
    opt(2, "transform", "TRANSFORM"),
    opt(3, "rotate", "ROTATE"),
    opt(4, "scale", "SCALE"),
    widget(5, WidgetKind::Delete),
    widget(6, WidgetKind::Duplicate),
];

/// Slot to annotation layer.
pub(crate) static ANNOTATE_LAYER_BY_SLOT: [Option<usize>; 12] = [
    Some(0),
    Some(8),
    Some(3),
    Some(10),
    Some(1),
    Some(9),
    Some(2),
    Some(7),
    Some(4),
    Some(6),
    Some(5),
    None,
];

static TS_ANNOTATE: &[MenuItem] = &[
    opt(0, "annotate_layer", "LAYER 1"),
    opt(1, "annotate_layer", "LAYER 9"),
    opt(2, "annotate_layer", "LAYER 4"),
    opt(3, "annotate_layer", "LAYER 11"),
    opt(4, "annotate_layer", "LAYER 2"),
    opt(5, "annotate_layer", "LAYER 10"),
    opt(6, "annotate_layer", "LAYER 3"),
    opt(7, "annotate_layer", "LAYER 8"),
    opt(8, "annotate_layer", "LAYER 5"),
    opt(9, "annotate_layer", "LAYER 7"),
    opt(10, "annotate_layer", "LAYER 6"),
];

static TS_MEASURE: &[MenuItem] = &[
    opt(0, "clip_reset", "RESET CLIPPING"),
    opt(1, "clip_far_decrease", "DECREASE FAR CLIP"),
    opt(2, "clip_far_increase", "INCREASE FAR CLIP"),
];

pub(crate) static PRIMITIVE_BY_SLOT: [Option<Primitive>; 9] = [
    Some(Primitive::Plane),
    Some(Primitive::Cube),
    Some(Primitive::Circle),
    Some(Primitive::Cylinder),
    Some(Primitive::Cone),
    Some(Primitive::Grid),
    Some(Primitive::Monkey),
    Some(Primitive::UvSphere),
    Some(Primitive::Icosphere),
];

static TS_ADD_PRIMITIVE: &[MenuItem] = &[
    opt(0, "mesh_plane", "PLANE"),
    opt(1, "mesh_cube", "CUBE"),
    opt(2, "mesh_circle", "CIRCLE"),
    opt(3, "mesh_cylinder", "CYLINDER"),
    opt(4, "mesh_cone", "CONE"),
    opt(5, "mesh_grid", "GRID"),
    opt(6, "mesh_monkey", "MONKEY"),
    opt(7, "mesh_uvsphere", "UV SPHERE"),
    opt(8, "mesh_icosphere", "ICOSPHERE"),
    widget(9, WidgetKind::Separate),
    widget(10, WidgetKind::Join),
];

static TS_EXTRUDE: &[MenuItem] = &[
    opt(0, "extrude_normals", "EXTRUDE NORMALS"),
    opt(1, "extrude_region", "EXTRUDE REGION"),
    opt(2, "extrude_individual", "EXTRUDE INDIVIDUAL"),
    opt(3, "flip_normals", "FLIP NORMALS"),
    opt(4, "transform", "TRANSFORM"),
];

static TS_INSET_FACES: &[MenuItem] = &[
    opt(0, "inset_individual", "INDIVIDUAL"),
    opt(1, "inset_even_offset", "EVEN OFFSET"),
    opt(2, "inset_relative_offset", "RELATIVE OFFSET"),
    opt(3, "inset_boundary", "BOUNDARY"),
    opt(4, "inset_outset", "OUTSET"),
];

static TS_BEVEL: &[MenuItem] = &[
    opt(0, "bevel_vertex_only", "VERTEX ONLY"),
    opt(1, "decrease", "DECREASE SEGMENTS"),
    opt(2, "increase", "INCREASE SEGMENTS"),
];

static TS_LOOP_CUT: &[MenuItem] = &[
    opt(0, "loopcut_edge_slide", "EDGE SLIDE"),
    opt(1, "decrease", "DECREASE CUTS"),
    opt(2, "increase", "INCREASE CUTS"),
    opt(3, "loopcut_flipped", "FLIPPED"),
    opt(4, "loopcut_clamp", "CLAMP"),
];

static TS_KNIFE: &[MenuItem] = &[
    widget(0, WidgetKind::SwitchSpace),
    widget(1, WidgetKind::Undo),
    widget(2, WidgetKind::Redo),
];

static TS_SCULPT: &[MenuItem] = &[
    opt(0, "sculpt_strength", "STRENGTH"),
    opt(1, "brush_draw", "DRAW BRUSHES"),
    opt(2, "brush_mask", "OTHER BRUSHES"),
    opt(3, "brush_smooth", "SMOOTH BRUSHES"),
    opt(4, "brush_grab", "GRAB BRUSHES"),
    opt(5, "sculpt_raycast", "RAYCAST"),
    opt(6, "sculpt_dyntopo", "DYNTOPO"),
];

pub(crate) static SCULPT_DRAW_BY_SLOT: [Option<SculptBrush>; 7] = [
    Some(SculptBrush::Draw),
    Some(SculptBrush::Layer),
    Some(SculptBrush::Inflate),
    Some(SculptBrush::Clay),
    Some(SculptBrush::ClayStrips),
    Some(SculptBrush::Blob),
    Some(SculptBrush::Crease),
];

pub(crate) static SCULPT_SMOOTH_BY_SLOT: [Option<SculptBrush>; 5] = [
    Some(SculptBrush::Smooth),
    Some(SculptBrush::Scrape),
    Some(SculptBrush::Pinch),
    Some(SculptBrush::Flatten),
    Some(SculptBrush::Fill),
];

pub(crate) static SCULPT_GRAB_BY_SLOT: [Option<SculptBrush>; 5] = [
    Some(SculptBrush::Grab),
    Some(SculptBrush::Nudge),
    Some(SculptBrush::Rotate),
    Some(SculptBrush::SnakeHook),
    Some(SculptBrush::Thumb),
];

pub(crate) static SCULPT_OTHER_BY_SLOT: [Option<SculptBrush>; 3] =
    [None, Some(SculptBrush::Mask), Some(SculptBrush::Simplify)];

static TS_SCULPT_DRAW: &[MenuItem] = &[
    opt(0, "brush_draw", "DRAW"),
    opt(1, "brush_layer", "LAYER"),
    opt(2, "brush_inflate", "INFLATE"),
    opt(3, "brush_clay", "CLAY"),
    opt(4, "brush_claystrips", "CLAY STRIPS"),
    opt(5, "brush_blob", "BLOB"),
    opt(6, "brush_crease", "CREASE"),
];

static TS_SCULPT_SMOOTH: &[MenuItem] = &[
    opt(0, "brush_smooth", "SMOOTH"),
    opt(1, "brush_scrape", "SCRAPE"),
    opt(2, "brush_pinch", "PINCH"),
    opt(3, "brush_flatten", "FLATTEN"),
    opt(4, "brush_fill", "FILL"),
];

static TS_SCULPT_GRAB: &[MenuItem] = &[
    opt(0, "brush_grab", "GRAB"),
    opt(1, "brush_nudge", "NUDGE"),
    opt(2, "brush_rotate", "ROTATE"),
    opt(3, "brush_snakehook", "SNAKE HOOK"),
    opt(4, "brush_thumb", "THUMB"),
];

static TS_SCULPT_OTHER: &[MenuItem] = &[
    opt(1, "brush_mask", "MASK"),
    opt(2, "brush_simplify", "SIMPLIFY"),
];

static TS_SCULPT_STRENGTH: &[MenuItem] = &[
    opt(5, "sculpt_trigger_pressure", "TRIGGER PRESSURE"),
    opt(6, "sculpt_strength_max", "FULL STRENGTH"),
];

static TS_ANIMATION: &[MenuItem] = &[
    opt(0, "bind_hmd", "BIND HMD"),
    opt(1, "bind_controller_left", "BIND LEFT CONTROLLER"),
    opt(2, "bind_controller_right", "BIND RIGHT CONTROLLER"),
    opt(3, "bind_tracker", "BIND TRACKER"),
    opt(4, "bind_none", "UNBIND"),
];

static AS_NAVI: &[MenuItem] = &[
    opt(0, "nav_lockrot", "LOCK ROTATION"),
    opt(1, "nav_locktrans", "LOCK TRANSLATION"),
    opt(2, "nav_lockscale", "LOCK SCALE"),
    opt(3, "nav_locktransup", "LOCK UP TRANSLATION"),
    opt(4, "nav_lockrotup", "LOCK UP ROTATION"),
    opt(5, "off", "OFF"),
    opt(6, "nav_lockscalereal", "REAL SCALE"),
];

static AS_TRANSFORM: &[MenuItem] = &[
    opt(0, "constraint_y", "Y"),
    opt(1, "constraint_x", "X"),
    opt(2, "constraint_z", "Z"),
    opt(3, "constraint_xy", "XY"),
    opt(4, "constraint_yz", "YZ"),
    opt(5, "off", "OFF"),
    opt(6, "constraint_zx", "ZX"),
];

static AS_TRANSFORM_MANIPULATOR: &[MenuItem] = &[
    opt(1, "decrease", "SMALLER MANIPULATOR"),
    opt(2, "increase", "LARGER MANIPULATOR"),
];

static AS_EXTRUDE: &[MenuItem] = &[
    opt(1, "decrease", "SMALLER MANIPULATOR"),
    opt(2, "increase", "LARGER MANIPULATOR"),
];

static AS_SCULPT: &[MenuItem] = &[
    opt(0, "symmetry_y", "MIRROR Y"),
    opt(1, "symmetry_x", "MIRROR X"),
    opt(2, "symmetry_z", "MIRROR Z"),
];

static AS_ANIMATION: &[MenuItem] = &[
    opt(0, "constraint_z", "Z"),
    opt(1, "constraint_x", "X"),
    opt(2, "rotconstraint_y", "ROT Y"),
    opt(3, "constraint_y", "Y"),
    opt(4, "rotconstraint_x", "ROT X"),
    opt(5, "off", "OFF"),
    opt(6, "rotconstraint_z", "ROT Z"),
];

/// How a slot's option relates to the current settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SlotState {
    Off,
    /// A toggle that is currently on.
    On,
    /// The chosen value of an exclusive setting.
    Selected,
    /// Drawn in its own colour.
    Tinted([f32; 4]),
}

/// Everything the renderer needs to know about one slot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlotView {
    pub slot: usize,
    pub entry: Entry,
    pub state: SlotState,
}

/// Settings a slot's state depends on beyond the tool state.
#[derive(Copy, Clone, Debug)]
pub struct SlotContext<'a> {
    pub tools: &'a ToolState,
    pub side: Side,
    pub alt: bool,
}

fn on(flag: bool) -> SlotState {
    if flag {
        SlotState::On
    } else {
        SlotState::Off
    }
}

fn selected(flag: bool) -> SlotState {
    if flag {
        SlotState::Selected
    } else {
        SlotState::Off
    }
}

fn brush_state(table: &[Option<SculptBrush>], slot: usize, current: SculptBrush) -> SlotState {
    selected(table.get(slot).copied().flatten() == Some(current))
}

/// State of a single slot.
pub fn slot_state(menu: MenuType, slot: usize, cx: &SlotContext) -> SlotState {
    let tools = cx.tools;
    match menu {
        MenuType::Main8 if slot == 0 => on(cx.alt),
        MenuType::SwitchTool => selected(
            SWITCH_TOOL_SLOTS.get(slot).copied() == tools.current(cx.side),
        ),
        MenuType::TsSelect => match slot {
            0 => on(tools.mouse_cursor),
            1 => selected(tools.selection_mode == SelectionMode::Raycast),
            2 => selected(tools.selection_mode == SelectionMode::Proximity),
            _ => SlotState::Off,
        },
        MenuType::TsTransform => {
            let mode = tools.transform.mode;
            match slot {
                0 => on(tools.transform.manipulator),
                1 => selected(mode == TransformMode::Move),
                2 => selected(mode == TransformMode::Omni),
                3 => selected(mode == TransformMode::Rotate),
                4 => selected(mode == TransformMode::Scale),
                _ => SlotState::Off,
            }
        }
        MenuType::TsAnnotate => match ANNOTATE_LAYER_BY_SLOT.get(slot).copied().flatten() {
            Some(layer) if layer == tools.annotate.active_layer => SlotState::Selected,
            Some(layer) if layer < ANNOTATION_LAYERS => {
                SlotState::Tinted(tools.annotate.colors[layer])
            }
            _ => SlotState::Off,
        },
        MenuType::TsAddPrimitive => selected(
            tools.primitive.is_some()
                && PRIMITIVE_BY_SLOT.get(slot).copied().flatten() == tools.primitive,
        ),
        MenuType::TsExtrude => match slot {
            0 => selected(tools.extrude.mode == ExtrudeMode::Normals),
            1 => selected(tools.extrude.mode == ExtrudeMode::Region),
            2 => selected(tools.extrude.mode == ExtrudeMode::Individual),
            3 => on(tools.extrude.flip_normals),
            4 => on(tools.extrude.transform),
            _ => SlotState::Off,
        },
        MenuType::TsInsetFaces => {
            let inset = &tools.inset;
            match slot {
                0 => on(inset.individual),
                1 => on(inset.even_offset),
                2 => on(inset.relative_offset),
                3 => on(inset.boundary),
                4 => on(inset.outset),
                _ => SlotState::Off,
            }
        }
        MenuType::TsBevel if slot == 0 => on(tools.bevel.vertex_only),
        MenuType::TsLoopCut => match slot {
            0 => on(tools.loop_cut.edge_slide),
            3 => on(tools.loop_cut.flipped),
            4 => on(tools.loop_cut.clamp),
            _ => SlotState::Off,
        },
        MenuType::TsSculpt => match slot {
            5 => on(tools.sculpt.raycast),
            6 => on(tools.sculpt.dyntopo),
            _ => SlotState::Off,
        },
        MenuType::TsSculptDraw => brush_state(&SCULPT_DRAW_BY_SLOT, slot, tools.sculpt.brush),
        MenuType::TsSculptSmooth => brush_state(&SCULPT_SMOOTH_BY_SLOT, slot, tools.sculpt.brush),
        MenuType::TsSculptGrab => brush_state(&SCULPT_GRAB_BY_SLOT, slot, tools.sculpt.brush),
        MenuType::TsSculptOther => brush_state(&SCULPT_OTHER_BY_SLOT, slot, tools.sculpt.brush),
        MenuType::TsSculptStrength => match slot {
            5 => on(tools.sculpt.use_trigger_pressure),
            6 => selected(tools.sculpt.strength >= 1.0),
            _ => SlotState::Off,
        },
        MenuType::TsAnimation => {
            let binding = tools.animation.binding;
            selected(match slot {
                0 => binding == AnimationBinding::Hmd,
                1 => binding == AnimationBinding::LeftController,
                2 => binding == AnimationBinding::RightController,
                3 => binding == AnimationBinding::Tracker,
                4 => binding == AnimationBinding::None,
                _ => false,
            })
        }
        MenuType::AsNavi => {
            let lock = &tools.nav_lock;
            selected(match slot {
                0 => lock[1] == NavLock::Rot,
                1 => lock[0] == NavLock::Trans,
                2 => lock[2] == NavLock::Scale,
                3 => lock[0] == NavLock::TransUp,
                4 => lock[1] == NavLock::RotUp,
                5 => lock.iter().all(|l| *l == NavLock::None),
                6 => lock[2] == NavLock::ScaleReal,
                _ => false,
            })
        }
        MenuType::AsTransform if !tools.transform.manipulator => {
            let flags = tools.transform.constraint_flag;
            let axes = match slot {
                0 => [false, true, false],
                1 => [true, false, false],
                2 => [false, false, true],
                3 => [true, true, false],
                4 => [false, true, true],
                6 => [true, false, true],
                5 => return selected(flags == [false; 3]),
                _ => return SlotState::Off,
            };
            selected(flags == axes)
        }
        MenuType::AsSculpt => match slot {
            0 => on(tools.sculpt.symmetry[1]),
            1 => on(tools.sculpt.symmetry[0]),
            2 => on(tools.sculpt.symmetry[2]),
            _ => SlotState::Off,
        },
        MenuType::AsAnimation => {
            let flags = &tools.animation.constraint_flag;
            match slot {
                0 => on(flags[0][2]),
                1 => on(flags[0][0]),
                3 => on(flags[0][1]),
                4 => on(flags[1][0]),
                2 => on(flags[1][1]),
                6 => on(flags[1][2]),
                5 => selected(flags.iter().flatten().all(|f| !f)),
                _ => SlotState::Off,
            }
        }
        _ => SlotState::Off,
    }
}

/// Every slot of `items`, as shown by `menu`, with its current state.
pub fn slots(menu: MenuType, items: &[MenuItem], cx: &SlotContext) -> Vec<SlotView> {
    items
        .iter()
        .map(|item| SlotView {
            slot: item.slot,
            entry: item.entry,
            state: slot_state(menu, item.slot, cx),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_tables_match_counts() {
        for menu in MenuType::ALL {
            let items = menu.items();
            assert_eq!(items.len(), menu.num_items(), "{menu:?}");
            let ring_slots = match menu.ring() {
                Ring::Eight => 8,
                Ring::Twelve => 12,
            };
            let mut seen = vec![false; ring_slots];
            for item in items {
                assert!(item.slot < ring_slots, "{menu:?} slot {}", item.slot);
                assert!(!seen[item.slot], "{menu:?} slot {} listed twice", item.slot);
                assert!(!menu.is_exit(item.slot), "{menu:?} slot {} is exit", item.slot);
                seen[item.slot] = true;
            }
        }
    }

    #[test]
    fn exit_slots() {
        assert!(MenuType::Main8.is_exit(7));
        assert!(MenuType::Main12.is_exit(11));
        assert!(!MenuType::SwitchTool.is_exit(11));
        for slot in 5..=7 {
            assert!(MenuType::TsSelect.is_exit(slot), "{slot}");
            assert!(MenuType::AsExtrude.is_exit(slot), "{slot}");
        }
        assert!(MenuType::TsSculptOther.is_exit(0));
        assert!(!MenuType::TsSculptStrength.is_exit(5));
        assert!(!MenuType::TsSculptStrength.is_exit(6));
        assert!(MenuType::TsSculptStrength.is_exit(7));
    }

    #[test]
    fn ring_follows_item_count() {
        assert_eq!(MenuType::Main8.ring(), Ring::Eight);
        assert_eq!(MenuType::TsSculptOther.ring(), Ring::Eight);
        assert_eq!(MenuType::Main12.ring(), Ring::Twelve);
        assert_eq!(MenuType::TsAnnotate.ring(), Ring::Twelve);
        assert_eq!(MenuType::SwitchTool.ring(), Ring::Twelve);
    }

    #[test]
    fn tool_menus() {
        assert_eq!(
            MenuType::for_current(Some(ToolKind::Transform)),
            MenuType::TsTransform
        );
        assert_eq!(MenuType::for_current(Some(ToolKind::Navi)), MenuType::Main12);
        assert_eq!(MenuType::for_current(None), MenuType::Main12);
        assert_eq!(
            MenuType::action_settings_for(ToolKind::Navi),
            Some(MenuType::AsNavi)
        );
        assert_eq!(MenuType::action_settings_for(ToolKind::Bevel), None);
        for menu in MenuType::ALL {
            if let Some(parent) = menu.parent() {
                assert_eq!(parent, MenuType::TsSculpt);
            }
        }
    }

    #[test]
    fn slot_states_follow_tools() {
        let mut tools = ToolState::default();
        tools.transform.select_mode(TransformMode::Rotate);
        tools.transform.manipulator = true;
        let cx = SlotContext {
            tools: &tools,
            side: Side::Right,
            alt: false,
        };
        let views = slots(MenuType::TsTransform, MenuType::TsTransform.items(), &cx);
        let state = |slot| {
            views
                .iter()
                .find(|v| v.slot == slot)
                .map(|v| v.state)
                .expect("slot present")
        };
        assert_eq!(state(0), SlotState::On);
        assert_eq!(state(3), SlotState::Selected);
        assert_eq!(state(2), SlotState::Off);

        // manipulator swaps the quick-adjust layout
        let menu = MenuType::AsTransform;
        let views = slots(menu, menu.items_for(&tools), &cx);
        assert_eq!(views.len(), 2);

        assert_eq!(
            slot_state(MenuType::SwitchTool, 0, &cx),
            SlotState::Selected,
            "right hand starts on transform"
        );
        assert_eq!(
            slot_state(MenuType::TsAnnotate, 0, &cx),
            SlotState::Selected,
            "layer 0 is active"
        );
        assert_eq!(
            slot_state(MenuType::TsAnnotate, 4, &cx),
            SlotState::Tinted(tools.annotate.colors[1])
        );
    }
}
