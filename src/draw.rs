//! Immediate-mode drawing for controller icons and menus.

mod gl;
mod text;

pub use self::gl::{DrawError, GlDraw};
pub use text::{glyph_uv, layout_string, Glyph, GLYPH_COLUMNS, GLYPH_ROWS};

use glam::{Mat4, Vec3};

/// An axis-aligned rectangle in the current model space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Rect {
    /// A square of half-size `half` centred on the origin.
    #[inline]
    pub fn square(half: f32) -> Self {
        Self {
            left: -half,
            right: half,
            top: half,
            bottom: -half,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VAlign {
    #[default]
    Top,
    /// Lays out like `Top`.
    Center,
    Bottom,
}

/// Draw calls widgets and menus issue. Every call leaves the host's graphics state as it found
/// it.
pub trait Canvas {
    fn set_color(&mut self, color: [f32; 4]);
    /// Replaces the model and/or view matrix; `None` keeps the current one.
    fn update_modelview_matrix(&mut self, model: Option<Mat4>, view: Option<Mat4>);
    fn render_rect(&mut self, rect: Rect, z: f32);
    /// Draws the named icon texture over `rect`.
    fn render_icon(&mut self, name: &str, rect: Rect, z: f32);
    /// A border of width `border` around `rect`.
    fn render_frame(&mut self, rect: Rect, border: f32, z: f32);
    fn render_box(&mut self, p0: Vec3, p1: Vec3, outline: bool);
    fn render_ball(&mut self, radius: f32);
    fn render_arrow(&mut self, from: Vec3, to: Vec3, width: f32);
    fn render_string(
        &mut self,
        text: &str,
        width: f32,
        height: f32,
        h_align: HAlign,
        v_align: VAlign,
        offset: Vec3,
    );
}
