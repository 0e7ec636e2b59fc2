//! Tool settings shared between the pie menus (which change them) and the host (which reads
//! them when running operators).

use crate::types::Side;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Select,
    Cursor,
    Transform,
    Annotate,
    Measure,
    AddPrimitive,
    Extrude,
    InsetFaces,
    Bevel,
    LoopCut,
    Knife,
    Sculpt,
    Animation,
    Navi,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TransformMode {
    #[default]
    Omni,
    Move,
    Rotate,
    Scale,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ConstraintMode {
    #[default]
    None,
    TransX,
    TransY,
    TransZ,
    TransXY,
    TransYZ,
    TransZX,
    RotX,
    RotY,
    RotZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    ScaleXY,
    ScaleYZ,
    ScaleZX,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SnapMode {
    None,
    #[default]
    Translation,
    Rotation,
    Scale,
    Points,
    Curves,
    Mesh,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TransformSpace {
    Global,
    #[default]
    Local,
    Normal,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NavLock {
    #[default]
    None,
    Trans,
    TransUp,
    Rot,
    RotUp,
    Scale,
    ScaleReal,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    #[default]
    Raycast,
    Proximity,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExtrudeMode {
    #[default]
    Region,
    Individual,
    Normals,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SculptBrush {
    #[default]
    Draw,
    ClayStrips,
    Inflate,
    Crease,
    Blob,
    Layer,
    Clay,
    Smooth,
    Fill,
    Pinch,
    Scrape,
    Flatten,
    Grab,
    Thumb,
    Rotate,
    Nudge,
    SnakeHook,
    Simplify,
    Mask,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StrokeMode {
    #[default]
    Normal,
    Invert,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    Plane,
    Cube,
    Circle,
    Cylinder,
    Cone,
    Grid,
    Monkey,
    UvSphere,
    Icosphere,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AnimationBinding {
    #[default]
    None,
    Hmd,
    LeftController,
    RightController,
    Tracker,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransformSettings {
    pub mode: TransformMode,
    pub omni: bool,
    pub manipulator: bool,
    pub do_render: [bool; 2],
    pub manip_scale_factor: f32,
    pub constraint_flag: [bool; 3],
    pub snap_flag: [bool; 3],
    pub constraint_mode: ConstraintMode,
    pub snap_mode: SnapMode,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            mode: TransformMode::Omni,
            omni: true,
            manipulator: false,
            do_render: [false; 2],
            manip_scale_factor: 0.5,
            constraint_flag: [false; 3],
            snap_flag: [true; 3],
            constraint_mode: ConstraintMode::None,
            snap_mode: SnapMode::Translation,
        }
    }
}

impl TransformSettings {
    /// Switches mode and resets constraints, the way picking a mode from a menu does.
    pub fn select_mode(&mut self, mode: TransformMode) {
        self.mode = mode;
        self.omni = mode == TransformMode::Omni;
        self.snap_mode = match mode {
            TransformMode::Omni | TransformMode::Move => SnapMode::Translation,
            TransformMode::Rotate => SnapMode::Rotation,
            TransformMode::Scale => SnapMode::Scale,
        };
        self.snap_flag = [true; 3];
        self.constraint_mode = ConstraintMode::None;
        self.constraint_flag = [false; 3];
    }

    pub fn toggle_manipulator(&mut self) {
        self.manipulator = !self.manipulator;
        self.do_render = [self.manipulator; 2];
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtrudeSettings {
    pub mode: ExtrudeMode,
    pub transform: bool,
    pub flip_normals: bool,
    pub manip_scale_factor: f32,
    pub do_render: [bool; 2],
}

impl Default for ExtrudeSettings {
    fn default() -> Self {
        Self {
            mode: ExtrudeMode::Region,
            transform: false,
            flip_normals: false,
            manip_scale_factor: 1.0,
            do_render: [false; 2],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InsetSettings {
    pub individual: bool,
    pub outset: bool,
    pub relative_offset: bool,
    pub even_offset: bool,
    pub boundary: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BevelSettings {
    pub vertex_only: bool,
    pub segments: u32,
}

impl Default for BevelSettings {
    fn default() -> Self {
        Self {
            vertex_only: false,
            segments: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoopCutSettings {
    pub edge_slide: bool,
    pub clamp: bool,
    pub cuts: u32,
    pub flipped: bool,
}

impl Default for LoopCutSettings {
    fn default() -> Self {
        Self {
            edge_slide: false,
            clamp: true,
            cuts: 1,
            flipped: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SculptSettings {
    pub brush: SculptBrush,
    pub strength: f32,
    pub use_trigger_pressure: bool,
    /// X, Y, Z mirror axes.
    pub symmetry: [bool; 3],
    pub dyntopo: bool,
    pub raycast: bool,
    pub stroke: StrokeMode,
    pub cursor_side: Side,
    pub do_render: [bool; 2],
}

impl Default for SculptSettings {
    fn default() -> Self {
        Self {
            brush: SculptBrush::Draw,
            strength: 0.5,
            use_trigger_pressure: false,
            symmetry: [false; 3],
            dyntopo: false,
            raycast: true,
            stroke: StrokeMode::Normal,
            cursor_side: Side::Right,
            do_render: [false; 2],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationSettings {
    pub binding: AnimationBinding,
    /// Per constraint kind (translation, rotation), per axis.
    pub constraint_flag: [[bool; 3]; 2],
    pub transform_space: TransformSpace,
}

pub const ANNOTATION_LAYERS: usize = 11;

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotateSettings {
    pub active_layer: usize,
    pub colors: [[f32; 4]; ANNOTATION_LAYERS],
}

impl Default for AnnotateSettings {
    fn default() -> Self {
        Self {
            active_layer: 0,
            colors: [
                [0.0, 0.0, 0.0, 1.0],
                [1.0, 1.0, 1.0, 1.0],
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
                [1.0, 1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0, 1.0],
                [1.0, 0.0, 1.0, 1.0],
                [1.0, 0.5, 0.0, 1.0],
                [0.5, 0.0, 1.0, 1.0],
                [0.5, 0.5, 0.5, 1.0],
            ],
        }
    }
}

impl AnnotateSettings {
    pub fn active_color(&self) -> [f32; 4] {
        self.colors[self.active_layer.min(ANNOTATION_LAYERS - 1)]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolState {
    current: [Option<ToolKind>; 2],
    pub transform: TransformSettings,
    /// Transform space used by the transform and extrude tools.
    pub transform_space: TransformSpace,
    pub extrude: ExtrudeSettings,
    pub inset: InsetSettings,
    pub bevel: BevelSettings,
    pub loop_cut: LoopCutSettings,
    pub sculpt: SculptSettings,
    pub animation: AnimationSettings,
    pub annotate: AnnotateSettings,
    pub selection_mode: SelectionMode,
    pub mouse_cursor: bool,
    pub nav_lock: [NavLock; 3],
    pub primitive: Option<Primitive>,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            current: [Some(ToolKind::Select), Some(ToolKind::Transform)],
            transform: TransformSettings::default(),
            transform_space: TransformSpace::default(),
            extrude: ExtrudeSettings::default(),
            inset: InsetSettings::default(),
            bevel: BevelSettings::default(),
            loop_cut: LoopCutSettings::default(),
            sculpt: SculptSettings::default(),
            animation: AnimationSettings::default(),
            annotate: AnnotateSettings::default(),
            selection_mode: SelectionMode::default(),
            mouse_cursor: false,
            nav_lock: [NavLock::None; 3],
            primitive: None,
        }
    }
}

impl ToolState {
    #[inline]
    pub fn current(&self, side: Side) -> Option<ToolKind> {
        self.current[side.index()]
    }

    pub fn set_current(&mut self, side: Side, tool: Option<ToolKind>) {
        self.current[side.index()] = tool;
    }

    /// Toggles a navigation lock: setting it if it isn't the active lock of its group,
    /// clearing it otherwise.
    pub fn toggle_nav_lock(&mut self, group: usize, lock: NavLock) {
        let slot = &mut self.nav_lock[group];
        *slot = if *slot == lock { NavLock::None } else { lock };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selecting_a_mode_resets_constraints() {
        let mut t = TransformSettings {
            constraint_flag: [true, false, true],
            snap_flag: [false; 3],
            constraint_mode: ConstraintMode::TransZX,
            ..Default::default()
        };
        t.select_mode(TransformMode::Rotate);
        assert_eq!(t.mode, TransformMode::Rotate);
        assert!(!t.omni);
        assert_eq!(t.snap_mode, SnapMode::Rotation);
        assert_eq!(t.snap_flag, [true; 3]);
        assert_eq!(t.constraint_flag, [false; 3]);
        assert_eq!(t.constraint_mode, ConstraintMode::None);

        t.select_mode(TransformMode::Omni);
        assert!(t.omni);
        assert_eq!(t.snap_mode, SnapMode::Translation);
    }

    #[test]
    fn nav_lock_toggles() {
        let mut tools = ToolState::default();
        tools.toggle_nav_lock(1, NavLock::Rot);
        assert_eq!(tools.nav_lock[1], NavLock::Rot);
        tools.toggle_nav_lock(1, NavLock::RotUp);
        assert_eq!(tools.nav_lock[1], NavLock::RotUp);
        tools.toggle_nav_lock(1, NavLock::RotUp);
        assert_eq!(tools.nav_lock[1], NavLock::None);
    }
}
