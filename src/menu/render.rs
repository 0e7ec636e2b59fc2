use super::catalog::{self, Entry, MenuType, SlotContext, SlotState};
use super::commit;
use super::radial::Ring;
use crate::draw::{Canvas, HAlign, Rect, VAlign};
use crate::tools::{StrokeMode, TransformSpace};
use crate::ui::UiState;
use crate::widget::{touched_scale, IconDraw, COLOR_ACTIVE, COLOR_WHITE};
use glam::{Mat4, Vec2, Vec3};

pub(super) const COLOR_RED: [f32; 4] = [0.926, 0.337, 0.337, 1.0];
pub(super) const COLOR_GREEN: [f32; 4] = [0.337, 0.926, 0.337, 1.0];
pub(super) const COLOR_BLUE: [f32; 4] = [0.337, 0.502, 0.761, 1.0];
const COLOR_BACKGROUND: [f32; 4] = [1.0, 1.0, 1.0, 0.9];

const P8: [Vec2; 8] = [
    Vec2::new(0.0, 0.06),
    Vec2::new(-0.06, 0.0),
    Vec2::new(0.06, 0.0),
    Vec2::new(-0.043, 0.043),
    Vec2::new(0.043, 0.043),
    Vec2::new(-0.043, -0.043),
    Vec2::new(0.043, -0.043),
    Vec2::new(0.0, -0.06),
];

const P12: [Vec2; 12] = [
    Vec2::new(0.0, 0.06),
    Vec2::new(-0.06, 0.0),
    Vec2::new(0.06, 0.0),
    Vec2::new(-0.032, 0.052),
    Vec2::new(0.032, 0.052),
    Vec2::new(-0.054, 0.028),
    Vec2::new(0.054, 0.028),
    Vec2::new(-0.054, -0.028),
    Vec2::new(0.054, -0.028),
    Vec2::new(-0.032, -0.052),
    Vec2::new(0.032, -0.052),
    Vec2::new(0.0, -0.06),
];

const P_AS: [Vec2; 8] = [
    Vec2::new(0.0, 0.02),
    Vec2::new(-0.02, 0.0),
    Vec2::new(0.02, 0.0),
    Vec2::new(-0.012, 0.012),
    Vec2::new(0.012, 0.012),
    Vec2::new(-0.012, -0.012),
    Vec2::new(0.012, -0.012),
    Vec2::new(0.0, -0.02),
];

const STICK_Z: f32 = 0.001;
const BACKGROUND_HALF: f32 = 0.1121;
const ICON_HALF: f32 = 0.011;
const AS_ICON_HALF: f32 = 0.006;
const BALL_DISTANCE: f32 = 0.06;
const BALL_RADIUS: f32 = 0.005;

/// Where a slot's icon sits relative to the menu centre.
pub(super) fn slot_position(ring: Ring, action_settings: bool, slot: usize) -> Option<Vec2> {
    if action_settings {
        P_AS.get(slot).copied()
    } else {
        match ring {
            Ring::Eight => P8.get(slot).copied(),
            Ring::Twelve => P12.get(slot).copied(),
        }
    }
}

/// Colour of a slot icon. Option state wins over the highlight.
pub(super) fn slot_color(state: SlotState, highlighted: bool) -> [f32; 4] {
    match state {
        SlotState::On => COLOR_RED,
        SlotState::Selected => COLOR_GREEN,
        SlotState::Tinted(color) => color,
        SlotState::Off if highlighted => COLOR_BLUE,
        SlotState::Off => COLOR_WHITE,
    }
}

/// Centre icon of quick-adjust menus that react to a press of the stick.
fn center_icon(menu: MenuType, ui: &UiState) -> Option<&'static str> {
    let space_icon = |space| match space {
        TransformSpace::Normal => "manip_normal",
        TransformSpace::Local => "manip_local",
        TransformSpace::Global => "manip_global",
    };
    match menu {
        MenuType::AsTransform | MenuType::AsExtrude => Some(space_icon(ui.tools.transform_space)),
        MenuType::AsAnimation => Some(space_icon(ui.tools.animation.transform_space)),
        MenuType::AsSculpt => Some(match ui.tools.sculpt.stroke {
            StrokeMode::Normal => "sculpt_stroke_normal",
            StrokeMode::Invert => "sculpt_stroke_invert",
        }),
        _ => None,
    }
}

pub(super) fn render(icon: &IconDraw, ui: &UiState, canvas: &mut dyn Canvas) {
    let session = ui.menus.session(icon.side);
    let t = icon.transform;

    if !session.active {
        let m = if icon.touched { t * touched_scale() } else { t };
        canvas.update_modelview_matrix(Some(m), None);
        let color = if session.menu_type == MenuType::TsAnnotate {
            ui.tools.annotate.active_color()
        } else if icon.active {
            COLOR_ACTIVE
        } else {
            COLOR_WHITE
        };
        canvas.set_color(color);
        canvas.render_icon("toolsettings", Rect::square(0.009), STICK_Z);
        return;
    }

    let menu = session.menu_type;
    let action_settings = session.action_settings;
    canvas.update_modelview_matrix(Some(t), None);
    if !action_settings {
        canvas.set_color(COLOR_BACKGROUND);
        canvas.render_icon("background_menu", Rect::square(BACKGROUND_HALF), -0.005);
    }

    if icon.touched && !action_settings {
        let offset = Vec2::new(session.angle.sin(), session.angle.cos()) * BALL_DISTANCE;
        canvas.update_modelview_matrix(Some(t * Mat4::from_translation(offset.extend(0.0))), None);
        canvas.set_color(COLOR_WHITE);
        canvas.render_ball(BALL_RADIUS);
    }

    let cx = SlotContext {
        tools: &ui.tools,
        side: icon.side,
        alt: ui.alt,
    };
    let half = if action_settings {
        AS_ICON_HALF
    } else {
        ICON_HALF
    };
    let ring = Ring::for_items(session.num_items);
    let mut label = None;
    for view in catalog::slots(menu, session.items, &cx) {
        if !commit::available(menu, view.slot, ui.device_type) {
            continue;
        }
        let Some(pos) = slot_position(ring, action_settings, view.slot) else {
            continue;
        };
        let highlighted = session.highlight == Some(view.slot);
        let (icon_name, text) = match view.entry {
            Entry::Widget(kind) => (kind.icon(), kind.name()),
            Entry::Option { icon, label } => (icon, label),
        };
        if highlighted {
            label = Some(text);
        }

        let mut m = t * Mat4::from_translation(pos.extend(0.0));
        if highlighted {
            m *= touched_scale();
        }
        canvas.update_modelview_matrix(Some(m), None);
        canvas.set_color(slot_color(view.state, highlighted));
        canvas.render_icon(icon_name, Rect::square(half), STICK_Z);
    }

    if action_settings {
        if let Some(name) = center_icon(menu, ui) {
            let m = if icon.touched && session.highlight.is_none() {
                t * touched_scale()
            } else {
                t
            };
            canvas.update_modelview_matrix(Some(m), None);
            canvas.set_color(COLOR_WHITE);
            canvas.render_icon(name, Rect::square(0.009), STICK_Z);
        }
        return;
    }

    if let Some(text) = label {
        canvas.update_modelview_matrix(
            Some(t * Mat4::from_translation(Vec3::new(0.0, 0.0, STICK_Z))),
            None,
        );
        canvas.set_color(COLOR_WHITE);
        canvas.render_string(
            text,
            0.009,
            0.012,
            HAlign::Center,
            VAlign::Top,
            Vec3::new(0.0, 0.005, 0.001),
        );
    }
}
