//! Widgets are the things a controller button can be bound to. They hold no state of their own;
//! everything they change lives in [`UiState`] or the device session, so the registry can hand
//! out shared references while an interaction mutably borrows the rest of the UI.

use crate::cursor::WidgetEvent;
use crate::draw::{Canvas, Rect};
use crate::menu::{MenuType, PieMenu};
use crate::session::DeviceSession;
use crate::tools::{ToolKind, TransformSpace};
use crate::types::Side;
use crate::ui::{HostAction, UiState};
use glam::{Mat4, Vec3};
use log::debug;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;

new_key_type! {
    pub struct WidgetKey;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Menu,
    Alt,
    Undo,
    Redo,
    SwitchComponent,
    SwitchSpace,
    SwitchLayout,
    SwitchTool,
    Delete,
    Duplicate,
    Join,
    Separate,
    Tool(ToolKind),
}

impl WidgetKind {
    /// Upper-case display name, used for menu labels.
    pub fn name(self) -> &'static str {
        match self {
            WidgetKind::Menu => "MENU",
            WidgetKind::Alt => "ALT",
            WidgetKind::Undo => "UNDO",
            WidgetKind::Redo => "REDO",
            WidgetKind::SwitchComponent => "SWITCH COMPONENT",
            WidgetKind::SwitchSpace => "SWITCH SPACE",
            WidgetKind::SwitchLayout => "SWITCH LAYOUT",
            WidgetKind::SwitchTool => "SWITCH TOOL",
            WidgetKind::Delete => "DELETE",
            WidgetKind::Duplicate => "DUPLICATE",
            WidgetKind::Join => "JOIN",
            WidgetKind::Separate => "SEPARATE",
            WidgetKind::Tool(tool) => match tool {
                ToolKind::Select => "SELECT",
                ToolKind::Cursor => "CURSOR",
                ToolKind::Transform => "TRANSFORM",
                ToolKind::Annotate => "ANNOTATE",
                ToolKind::Measure => "MEASURE",
                ToolKind::AddPrimitive => "ADD PRIMITIVE",
                ToolKind::Extrude => "EXTRUDE",
                ToolKind::InsetFaces => "INSET FACES",
                ToolKind::Bevel => "BEVEL",
                ToolKind::LoopCut => "LOOP CUT",
                ToolKind::Knife => "KNIFE",
                ToolKind::Sculpt => "SCULPT",
                ToolKind::Animation => "ANIMATION",
                ToolKind::Navi => "NAVIGATION",
            },
        }
    }

    /// Name of the icon texture.
    pub fn icon(self) -> &'static str {
        match self {
            WidgetKind::Menu => "menu",
            WidgetKind::Alt => "alt",
            WidgetKind::Undo => "undo",
            WidgetKind::Redo => "redo",
            WidgetKind::SwitchComponent => "switch_component",
            WidgetKind::SwitchSpace => "switch_space",
            WidgetKind::SwitchLayout => "switch_layout",
            WidgetKind::SwitchTool => "switch_tool",
            WidgetKind::Delete => "delete",
            WidgetKind::Duplicate => "duplicate",
            WidgetKind::Join => "join",
            WidgetKind::Separate => "separate",
            WidgetKind::Tool(tool) => match tool {
                ToolKind::Select => "select",
                ToolKind::Cursor => "cursor",
                ToolKind::Transform => "transform",
                ToolKind::Annotate => "annotate",
                ToolKind::Measure => "measure",
                ToolKind::AddPrimitive => "mesh",
                ToolKind::Extrude => "extrude",
                ToolKind::InsetFaces => "insetfaces",
                ToolKind::Bevel => "bevel",
                ToolKind::LoopCut => "loopcut",
                ToolKind::Knife => "knife",
                ToolKind::Sculpt => "sculpt",
                ToolKind::Animation => "animation",
                ToolKind::Navi => "nav_grabair",
            },
        }
    }
}

pub(crate) const COLOR_WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
pub(crate) const COLOR_ACTIVE: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

/// Scale applied to an icon whose button is being touched.
pub(crate) fn touched_scale() -> Mat4 {
    Mat4::from_scale(Vec3::splat(1.1))
}

/// Where and how a widget draws its icon on a controller.
#[derive(Copy, Clone, Debug)]
pub struct IconDraw {
    /// Icon transform in scene space.
    pub transform: Mat4,
    pub side: Side,
    /// The widget is handling an interaction on this side.
    pub active: bool,
    /// The button the widget is bound to is touched.
    pub touched: bool,
}

/// Everything a widget may touch while handling an interaction.
pub struct Interaction<'a> {
    pub side: Side,
    /// Index of the cursor driving the interaction.
    pub cursor: usize,
    /// Milliseconds.
    pub now: u64,
    pub ui: &'a mut UiState,
    pub session: &'a mut DeviceSession,
    pub widgets: &'a WidgetRegistry,
}

impl Interaction<'_> {
    /// Runs another widget's click handler with this interaction.
    pub fn click_widget(&mut self, kind: WidgetKind) {
        match self.widgets.by_kind(kind) {
            Some(widget) => widget.click(self),
            None => debug!("no {kind:?} widget registered"),
        }
    }
}

pub trait Widget {
    fn kind(&self) -> WidgetKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn icon(&self) -> &'static str {
        self.kind().icon()
    }

    fn click(&self, _cx: &mut Interaction) {}
    fn drag_start(&self, _cx: &mut Interaction) {}
    fn drag_contd(&self, _cx: &mut Interaction) {}
    fn drag_stop(&self, _cx: &mut Interaction) {}

    fn render_icon(&self, icon: &IconDraw, _ui: &UiState, canvas: &mut dyn Canvas) {
        let t = if icon.touched {
            icon.transform * touched_scale()
        } else {
            icon.transform
        };
        canvas.update_modelview_matrix(Some(t), None);
        canvas.set_color(if icon.active { COLOR_ACTIVE } else { COLOR_WHITE });
        canvas.render_icon(self.icon(), Rect::square(0.009), 0.001);
    }

    fn dispatch(&self, event: WidgetEvent, cx: &mut Interaction) {
        match event {
            WidgetEvent::Click => self.click(cx),
            WidgetEvent::DragStart => self.drag_start(cx),
            WidgetEvent::DragContd => self.drag_contd(cx),
            WidgetEvent::DragStop => self.drag_stop(cx),
        }
    }
}

/// Owns every widget; cursors and menus refer to them by key.
pub struct WidgetRegistry {
    widgets: SlotMap<WidgetKey, Box<dyn Widget>>,
    kinds: HashMap<WidgetKind, WidgetKey>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        let mut registry = Self {
            widgets: SlotMap::with_key(),
            kinds: HashMap::new(),
        };
        registry.insert(Box::new(PieMenu));
        for action in ActionWidget::ALL {
            registry.insert(Box::new(action));
        }
        registry.insert(Box::new(AltToggle));
        registry.insert(Box::new(SwitchSpace));
        registry.insert(Box::new(SwitchTool));
        for tool in ToolWidget::ALL {
            registry.insert(Box::new(tool));
        }
        registry
    }
}

impl WidgetRegistry {
    /// Adds a widget. A widget of the same kind that was already registered is replaced.
    pub fn insert(&mut self, widget: Box<dyn Widget>) -> WidgetKey {
        let kind = widget.kind();
        if let Some(old) = self.kinds.remove(&kind) {
            self.widgets.remove(old);
        }
        let key = self.widgets.insert(widget);
        self.kinds.insert(kind, key);
        key
    }

    pub fn get(&self, key: WidgetKey) -> Option<&dyn Widget> {
        self.widgets.get(key).map(|w| w.as_ref())
    }

    #[inline]
    pub fn key(&self, kind: WidgetKind) -> Option<WidgetKey> {
        self.kinds.get(&kind).copied()
    }

    pub fn by_kind(&self, kind: WidgetKind) -> Option<&dyn Widget> {
        self.key(kind).and_then(|key| self.get(key))
    }
}

/// Widgets whose only effect is an operation the host runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ActionWidget {
    Undo,
    Redo,
    SwitchComponent,
    SwitchLayout,
    Delete,
    Duplicate,
    Join,
    Separate,
}

impl ActionWidget {
    const ALL: [ActionWidget; 8] = [
        ActionWidget::Undo,
        ActionWidget::Redo,
        ActionWidget::SwitchComponent,
        ActionWidget::SwitchLayout,
        ActionWidget::Delete,
        ActionWidget::Duplicate,
        ActionWidget::Join,
        ActionWidget::Separate,
    ];

    fn action(self) -> HostAction {
        match self {
            ActionWidget::Undo => HostAction::Undo,
            ActionWidget::Redo => HostAction::Redo,
            ActionWidget::SwitchComponent => HostAction::SwitchComponent,
            ActionWidget::SwitchLayout => HostAction::SwitchLayout,
            ActionWidget::Delete => HostAction::Delete,
            ActionWidget::Duplicate => HostAction::Duplicate,
            ActionWidget::Join => HostAction::Join,
            ActionWidget::Separate => HostAction::Separate,
        }
    }
}

impl Widget for ActionWidget {
    fn kind(&self) -> WidgetKind {
        match self {
            ActionWidget::Undo => WidgetKind::Undo,
            ActionWidget::Redo => WidgetKind::Redo,
            ActionWidget::SwitchComponent => WidgetKind::SwitchComponent,
            ActionWidget::SwitchLayout => WidgetKind::SwitchLayout,
            ActionWidget::Delete => WidgetKind::Delete,
            ActionWidget::Duplicate => WidgetKind::Duplicate,
            ActionWidget::Join => WidgetKind::Join,
            ActionWidget::Separate => WidgetKind::Separate,
        }
    }

    fn click(&self, cx: &mut Interaction) {
        cx.ui.push_action(self.action());
    }
}

/// Latches the alt modifier for both controllers.
pub struct AltToggle;

impl Widget for AltToggle {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Alt
    }

    fn click(&self, cx: &mut Interaction) {
        cx.ui.alt = !cx.ui.alt;
    }

    fn render_icon(&self, icon: &IconDraw, ui: &UiState, canvas: &mut dyn Canvas) {
        canvas.update_modelview_matrix(Some(icon.transform), None);
        canvas.set_color(if ui.alt || icon.active {
            COLOR_ACTIVE
        } else {
            COLOR_WHITE
        });
        canvas.render_icon(self.icon(), Rect::square(0.009), 0.001);
    }
}

/// Cycles the transform space used by the transform and extrude tools.
pub struct SwitchSpace;

impl SwitchSpace {
    /// Edit mode cycles Normal -> Global -> Local -> Normal; object mode has no normal space.
    pub fn next(space: TransformSpace, edit_mode: bool) -> TransformSpace {
        match (edit_mode, space) {
            (true, TransformSpace::Normal) => TransformSpace::Global,
            (true, TransformSpace::Global) => TransformSpace::Local,
            (true, TransformSpace::Local) => TransformSpace::Normal,
            (false, TransformSpace::Local) => TransformSpace::Global,
            (false, _) => TransformSpace::Local,
        }
    }
}

impl Widget for SwitchSpace {
    fn kind(&self) -> WidgetKind {
        WidgetKind::SwitchSpace
    }

    fn click(&self, cx: &mut Interaction) {
        let tools = &mut cx.ui.tools;
        tools.transform_space = Self::next(tools.transform_space, cx.ui.edit_mode);
        debug!("transform space now {:?}", tools.transform_space);
    }
}

/// Opens the tool picker on the clicking side.
pub struct SwitchTool;

impl Widget for SwitchTool {
    fn kind(&self) -> WidgetKind {
        WidgetKind::SwitchTool
    }

    fn click(&self, cx: &mut Interaction) {
        let ui = &mut *cx.ui;
        ui.menus.open(cx.side, MenuType::SwitchTool, &ui.tools);
    }
}

/// A tool bound to a trigger. The host performs the actual operation; the widget forwards the
/// interaction and keeps the tool's quick-adjust menu up while the trigger is held. Dragging
/// the navigation tool moves the scene directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ToolWidget(pub ToolKind);

impl ToolWidget {
    const ALL: [ToolWidget; 14] = [
        ToolWidget(ToolKind::Select),
        ToolWidget(ToolKind::Cursor),
        ToolWidget(ToolKind::Transform),
        ToolWidget(ToolKind::Annotate),
        ToolWidget(ToolKind::Measure),
        ToolWidget(ToolKind::AddPrimitive),
        ToolWidget(ToolKind::Extrude),
        ToolWidget(ToolKind::InsetFaces),
        ToolWidget(ToolKind::Bevel),
        ToolWidget(ToolKind::LoopCut),
        ToolWidget(ToolKind::Knife),
        ToolWidget(ToolKind::Sculpt),
        ToolWidget(ToolKind::Animation),
        ToolWidget(ToolKind::Navi),
    ];

    fn forward(&self, cx: &mut Interaction, event: WidgetEvent) {
        cx.ui.push_action(HostAction::Tool {
            tool: self.0,
            side: cx.side,
            event,
        });
    }
}

impl Widget for ToolWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Tool(self.0)
    }

    fn click(&self, cx: &mut Interaction) {
        self.forward(cx, WidgetEvent::Click);
    }

    fn drag_start(&self, cx: &mut Interaction) {
        let ui = &mut *cx.ui;
        ui.menus.open_action_settings(cx.side, self.0, &ui.tools);
        self.forward(cx, WidgetEvent::DragStart);
    }

    fn drag_contd(&self, cx: &mut Interaction) {
        PieMenu::action_settings_contd(cx);
        if self.0 == ToolKind::Navi {
            crate::ui::grab_air(cx);
            return;
        }
        self.forward(cx, WidgetEvent::DragContd);
    }

    fn drag_stop(&self, cx: &mut Interaction) {
        let ui = &mut *cx.ui;
        ui.menus.close_action_settings(cx.side, &ui.tools);
        self.forward(cx, WidgetEvent::DragStop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_one_widget_per_kind() {
        let registry = WidgetRegistry::default();
        for kind in [
            WidgetKind::Menu,
            WidgetKind::Alt,
            WidgetKind::Undo,
            WidgetKind::SwitchSpace,
            WidgetKind::SwitchTool,
            WidgetKind::Tool(ToolKind::Transform),
            WidgetKind::Tool(ToolKind::Navi),
        ] {
            let widget = registry.by_kind(kind).expect("registered");
            assert_eq!(widget.kind(), kind);
        }

        let mut registry = registry;
        let old = registry.key(WidgetKind::Undo).expect("undo");
        let new = registry.insert(Box::new(ActionWidget::Undo));
        assert_ne!(old, new);
        assert!(registry.get(old).is_none(), "replaced widget should be gone");
    }

    #[test]
    fn switch_space_cycles() {
        use TransformSpace::*;
        assert_eq!(SwitchSpace::next(Normal, true), Global);
        assert_eq!(SwitchSpace::next(Global, true), Local);
        assert_eq!(SwitchSpace::next(Local, true), Normal);
        assert_eq!(SwitchSpace::next(Local, false), Global);
        assert_eq!(SwitchSpace::next(Global, false), Local);
        assert_eq!(SwitchSpace::next(Normal, false), Local);
    }
}
