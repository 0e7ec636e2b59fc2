use super::{HAlign, VAlign};
use glam::Vec2;

/// The glyph atlas holds printable ASCII in a 14x7 grid, starting at the space character.
pub const GLYPH_COLUMNS: usize = 14;
pub const GLYPH_ROWS: usize = 7;

const FIRST_GLYPH: u8 = b' ';
const LAST_GLYPH: u8 = b'~';
const TAB_WIDTH: f32 = 4.0;
const LINE_SPACING: f32 = 1.2;

/// A character placed by [`layout_string`]. `x`/`y` is the glyph's top-left corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Glyph {
    pub x: f32,
    pub y: f32,
    pub column: usize,
    pub row: usize,
}

/// Texture coordinates of an atlas cell as bottom-left, bottom-right, top-left, top-right.
pub fn glyph_uv(column: usize, row: usize) -> [[f32; 2]; 4] {
    let (c, r) = (GLYPH_COLUMNS as f32, GLYPH_ROWS as f32);
    let (u0, u1) = (column as f32 / c, (column + 1) as f32 / c);
    let (v0, v1) = (row as f32 / r, (row + 1) as f32 / r);
    [[u0, v1], [u1, v1], [u0, v0], [u1, v0]]
}

fn extent(text: &str, w: f32, h: f32) -> Vec2 {
    let mut width = 0.0f32;
    let mut height = h;
    let mut line = 0.0f32;
    for b in text.bytes() {
        match b {
            b'\n' => {
                height += h * LINE_SPACING;
                width = width.max(line);
                line = 0.0;
            }
            b'\t' => line += w * TAB_WIDTH,
            FIRST_GLYPH..=LAST_GLYPH => line += w,
            _ => {}
        }
    }
    Vec2::new(width.max(line), height)
}

/// Places every printable character of `text` on glyph cells `w` wide and `h` tall. Other
/// characters are skipped without advancing.
pub fn layout_string(
    text: &str,
    w: f32,
    h: f32,
    h_align: HAlign,
    v_align: VAlign,
    offset: Vec2,
) -> Vec<Glyph> {
    let size = extent(text, w, h);
    let mut origin = offset;
    match h_align {
        HAlign::Left => {}
        HAlign::Center => origin.x -= size.x / 2.0,
        HAlign::Right => origin.x -= size.x,
    }
    // Centre has always laid out from the top.
    if v_align == VAlign::Bottom {
        origin.y += size.y;
    }

    let mut glyphs = Vec::with_capacity(text.len());
    let (mut x, mut y) = (origin.x, origin.y);
    for b in text.bytes() {
        match b {
            b'\n' => {
                y -= h * LINE_SPACING;
                x = origin.x;
            }
            b'\t' => x += w * TAB_WIDTH,
            FIRST_GLYPH..=LAST_GLYPH => {
                let index = (b - FIRST_GLYPH) as usize;
                glyphs.push(Glyph {
                    x,
                    y,
                    column: index % GLYPH_COLUMNS,
                    row: index / GLYPH_COLUMNS,
                });
                x += w;
            }
            _ => {}
        }
    }
    glyphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_and_atlas_cells() {
        let glyphs = layout_string("A b", 1.0, 2.0, HAlign::Left, VAlign::Top, Vec2::ZERO);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(
            glyphs.iter().map(|g| g.x).collect::<Vec<_>>(),
            [0.0, 1.0, 2.0]
        );
        // 'A' is 33 past the space.
        assert_eq!((glyphs[0].column, glyphs[0].row), (5, 2));
        assert_eq!((glyphs[1].column, glyphs[1].row), (0, 0));
        let last = layout_string("~", 1.0, 1.0, HAlign::Left, VAlign::Top, Vec2::ZERO);
        assert_eq!((last[0].column, last[0].row), (10, 6));
    }

    #[test]
    fn tabs_newlines_and_unprintables() {
        let glyphs = layout_string(
            "a\tb\nc\u{7f}d",
            1.0,
            1.0,
            HAlign::Left,
            VAlign::Top,
            Vec2::new(10.0, 0.0),
        );
        let positions: Vec<_> = glyphs.iter().map(|g| (g.x, g.y)).collect();
        assert_eq!(
            positions,
            [(10.0, 0.0), (15.0, 0.0), (10.0, -1.2), (11.0, -1.2)]
        );
    }

    #[test]
    fn alignment() {
        let center = layout_string("abcd", 0.5, 1.0, HAlign::Center, VAlign::Top, Vec2::ZERO);
        assert_eq!(center[0].x, -1.0);
        let right = layout_string("ab\nabcd", 1.0, 1.0, HAlign::Right, VAlign::Top, Vec2::ZERO);
        assert_eq!(right[0].x, -4.0, "widest line decides");

        let bottom = layout_string("a\nb", 1.0, 1.0, HAlign::Left, VAlign::Bottom, Vec2::ZERO);
        assert!((bottom[0].y - 2.2).abs() < 1e-6);
        let center = layout_string("a\nb", 1.0, 1.0, HAlign::Left, VAlign::Center, Vec2::ZERO);
        let top = layout_string("a\nb", 1.0, 1.0, HAlign::Left, VAlign::Top, Vec2::ZERO);
        assert_eq!(center, top);
    }

    #[test]
    fn atlas_uvs() {
        let uv = glyph_uv(0, 0);
        assert_eq!(uv[2], [0.0, 0.0]);
        assert_eq!(uv[1], [1.0 / 14.0, 1.0 / 7.0]);
        let uv = glyph_uv(13, 6);
        assert_eq!(uv[3], [1.0, 6.0 / 7.0]);
    }
}
