use super::{glyph_uv, layout_string, Canvas, HAlign, Rect, VAlign};
use gl::types::{GLboolean, GLenum, GLint, GLuint};
use glam::{Mat4, Vec3};
use log::{debug, warn};
use std::collections::HashMap;
use std::ffi::CString;

const COLOR_VERT: &str = include_str!("shaders/color.vert");
const COLOR_FRAG: &str = include_str!("shaders/color.frag");
const TEXTURE_VERT: &str = include_str!("shaders/texture.vert");
const TEXTURE_FRAG: &str = include_str!("shaders/texture.frag");

/// Latitude and longitude steps of [`GlDraw::render_ball`].
const BALL_RESOLUTION: usize = 16;
const OUTLINE_WIDTH: f32 = 2.0;
const OUTLINE_DASHES: usize = 8;

#[derive(Debug)]
pub enum DrawError {
    Compile { stage: &'static str, log: String },
    Link(String),
}

/// A linked program and the locations the draw calls feed.
#[derive(Copy, Clone, Debug)]
struct Program {
    id: GLuint,
    position: GLuint,
    normal: Option<GLuint>,
    uv: Option<GLuint>,
    modelview: GLint,
    projection: GLint,
    normal_matrix: GLint,
    color: GLint,
}

impl Program {
    unsafe fn compile(stage: GLenum, source: &str) -> Result<GLuint, DrawError> {
        let name = if stage == gl::VERTEX_SHADER {
            "vertex"
        } else {
            "fragment"
        };
        let source = CString::new(source).map_err(|_| DrawError::Compile {
            stage: name,
            log: "source contains a nul byte".into(),
        })?;
        let shader = gl::CreateShader(stage);
        gl::ShaderSource(shader, 1, &source.as_ptr(), std::ptr::null());
        gl::CompileShader(shader);

        let mut ok = 0;
        gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut ok);
        if ok == 0 {
            let log = info_log(shader, gl::GetShaderiv, gl::GetShaderInfoLog);
            gl::DeleteShader(shader);
            return Err(DrawError::Compile { stage: name, log });
        }
        Ok(shader)
    }

    unsafe fn link(vert: &str, frag: &str, textured: bool) -> Result<Self, DrawError> {
        let vs = Self::compile(gl::VERTEX_SHADER, vert)?;
        let fs = match Self::compile(gl::FRAGMENT_SHADER, frag) {
            Ok(fs) => fs,
            Err(e) => {
                gl::DeleteShader(vs);
                return Err(e);
            }
        };

        let id = gl::CreateProgram();
        gl::AttachShader(id, vs);
        gl::AttachShader(id, fs);
        gl::LinkProgram(id);
        gl::DeleteShader(vs);
        gl::DeleteShader(fs);

        let mut ok = 0;
        gl::GetProgramiv(id, gl::LINK_STATUS, &mut ok);
        if ok == 0 {
            let log = info_log(id, gl::GetProgramiv, gl::GetProgramInfoLog);
            gl::DeleteProgram(id);
            return Err(DrawError::Link(log));
        }

        let attrib = |name: &std::ffi::CStr| {
            let loc = gl::GetAttribLocation(id, name.as_ptr());
            (loc >= 0).then_some(loc as GLuint)
        };
        let uniform = |name: &std::ffi::CStr| gl::GetUniformLocation(id, name.as_ptr());

        let program = Self {
            id,
            position: attrib(c"position").unwrap_or(0),
            normal: textured.then(|| attrib(c"normal")).flatten(),
            uv: textured.then(|| attrib(c"uv")).flatten(),
            modelview: uniform(c"modelview"),
            projection: uniform(c"projection"),
            normal_matrix: uniform(c"normal_matrix"),
            color: uniform(c"color"),
        };
        if textured {
            let mut previous = 0;
            gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut previous);
            gl::UseProgram(id);
            gl::Uniform1i(uniform(c"tex"), 0);
            gl::UseProgram(previous as GLuint);
        }
        Ok(program)
    }
}

unsafe fn info_log(
    object: GLuint,
    get_iv: unsafe fn(GLuint, GLenum, *mut GLint),
    get_log: unsafe fn(GLuint, gl::types::GLsizei, *mut gl::types::GLsizei, *mut gl::types::GLchar),
) -> String {
    let mut len = 0;
    get_iv(object, gl::INFO_LOG_LENGTH, &mut len);
    let mut buf = vec![0u8; len.max(1) as usize];
    let mut written = 0;
    get_log(object, len, &mut written, buf.as_mut_ptr().cast());
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Shape {
    Rect,
    Frame,
    Box,
    Ball,
    Arrow,
    Glyphs,
}

impl Shape {
    const COUNT: usize = 6;
}

/// Vertex array and buffers of one shape. Created on first use, rewritten on every draw.
#[derive(Copy, Clone, Debug)]
struct Buffers {
    vao: GLuint,
    positions: GLuint,
    normals: GLuint,
    uvs: GLuint,
}

impl Buffers {
    unsafe fn create() -> Self {
        let mut vao = 0;
        gl::GenVertexArrays(1, &mut vao);
        let mut bufs = [0; 3];
        gl::GenBuffers(bufs.len() as i32, bufs.as_mut_ptr());
        Self {
            vao,
            positions: bufs[0],
            normals: bufs[1],
            uvs: bufs[2],
        }
    }
}

/// Texture unit selection and 2D bindings. Draws only ever bind on unit 0.
trait TextureUnits {
    fn active(&self) -> GLenum;
    fn set_active(&mut self, unit: GLenum);
    fn bound(&self) -> GLuint;
    fn bind(&mut self, texture: GLuint);
}

/// The current context's texture units.
struct CurrentUnits;

impl TextureUnits for CurrentUnits {
    fn active(&self) -> GLenum {
        let mut v = 0;
        unsafe { gl::GetIntegerv(gl::ACTIVE_TEXTURE, &mut v) };
        v as GLenum
    }

    fn set_active(&mut self, unit: GLenum) {
        unsafe { gl::ActiveTexture(unit) };
    }

    fn bound(&self) -> GLuint {
        let mut v = 0;
        unsafe { gl::GetIntegerv(gl::TEXTURE_BINDING_2D, &mut v) };
        v as GLuint
    }

    fn bind(&mut self, texture: GLuint) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture) };
    }
}

/// The active unit and whatever unit 0 has bound. Capturing leaves the active unit unchanged.
#[derive(Copy, Clone, Debug, PartialEq)]
struct SavedUnits {
    active: GLenum,
    unit0: GLuint,
}

impl SavedUnits {
    fn capture(units: &mut impl TextureUnits) -> Self {
        let active = units.active();
        units.set_active(gl::TEXTURE0);
        let unit0 = units.bound();
        units.set_active(active);
        Self { active, unit0 }
    }

    fn restore(&self, units: &mut impl TextureUnits) {
        units.set_active(gl::TEXTURE0);
        units.bind(self.unit0);
        units.set_active(self.active);
    }
}

/// The host's GL state, as captured before a draw.
struct SavedState {
    program: GLint,
    vao: GLint,
    array_buffer: GLint,
    units: SavedUnits,
    line_width: f32,
    depth_mask: GLboolean,
    cull: bool,
    blend: bool,
    depth: bool,
    texture_2d: bool,
}

impl SavedState {
    unsafe fn capture() -> Self {
        let int = |name| {
            let mut v = 0;
            gl::GetIntegerv(name, &mut v);
            v
        };
        let mut line_width = 1.0;
        gl::GetFloatv(gl::LINE_WIDTH, &mut line_width);
        let mut depth_mask = gl::TRUE;
        gl::GetBooleanv(gl::DEPTH_WRITEMASK, &mut depth_mask);
        Self {
            program: int(gl::CURRENT_PROGRAM),
            vao: int(gl::VERTEX_ARRAY_BINDING),
            array_buffer: int(gl::ARRAY_BUFFER_BINDING),
            units: SavedUnits::capture(&mut CurrentUnits),
            line_width,
            depth_mask,
            cull: gl::IsEnabled(gl::CULL_FACE) == gl::TRUE,
            blend: gl::IsEnabled(gl::BLEND) == gl::TRUE,
            depth: gl::IsEnabled(gl::DEPTH_TEST) == gl::TRUE,
            texture_2d: gl::IsEnabled(gl::TEXTURE_2D) == gl::TRUE,
        }
    }

    unsafe fn restore(&self) {
        let toggle = |cap, on| {
            if on {
                gl::Enable(cap)
            } else {
                gl::Disable(cap)
            }
        };
        gl::BindVertexArray(self.vao as GLuint);
        gl::BindBuffer(gl::ARRAY_BUFFER, self.array_buffer as GLuint);
        self.units.restore(&mut CurrentUnits);
        gl::UseProgram(self.program as GLuint);
        gl::LineWidth(self.line_width);
        gl::DepthMask(self.depth_mask);
        toggle(gl::CULL_FACE, self.cull);
        toggle(gl::BLEND, self.blend);
        toggle(gl::DEPTH_TEST, self.depth);
        toggle(gl::TEXTURE_2D, self.texture_2d);
    }
}

/// One draw: geometry plus what to shade it with.
struct Batch<'a> {
    shape: Shape,
    mode: GLenum,
    positions: &'a [[f32; 3]],
    /// Textured draws carry a texture and one uv per vertex.
    texture: Option<(GLuint, &'a [[f32; 2]])>,
    /// Leave the depth buffer untouched.
    no_depth_write: bool,
}

/// [`Canvas`] on the host's current GL context.
///
/// Programs and buffers are created on first use and kept for the lifetime of the context.
/// Icon textures and the glyph atlas are GL textures owned by the host and registered by name.
pub struct GlDraw {
    color: [f32; 4],
    model: Mat4,
    view: Mat4,
    projection: Mat4,
    modelview: Mat4,
    modelview_inv: Mat4,
    color_program: Option<Result<Program, ()>>,
    texture_program: Option<Result<Program, ()>>,
    buffers: [Option<Buffers>; Shape::COUNT],
    textures: HashMap<String, GLuint>,
    glyph_atlas: Option<GLuint>,
}

impl Default for GlDraw {
    fn default() -> Self {
        Self::new()
    }
}

impl GlDraw {
    /// GL must have been loaded, see [`crate::graphics::load_gl_with`].
    pub fn new() -> Self {
        Self {
            color: [1.0; 4],
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            modelview: Mat4::IDENTITY,
            modelview_inv: Mat4::IDENTITY,
            color_program: None,
            texture_program: None,
            buffers: [None; Shape::COUNT],
            textures: HashMap::new(),
            glyph_atlas: None,
        }
    }

    pub fn register_texture(&mut self, name: impl Into<String>, texture: GLuint) {
        self.textures.insert(name.into(), texture);
    }

    /// The 14x7 printable ASCII atlas used by `render_string`.
    pub fn set_glyph_atlas(&mut self, texture: GLuint) {
        self.glyph_atlas = Some(texture);
    }

    pub fn update_projection_matrix(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn set_blend(&mut self, on: bool) {
        unsafe {
            if on {
                gl::Enable(gl::BLEND);
                gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
            } else {
                gl::Disable(gl::BLEND);
            }
        }
    }

    pub fn set_depth_test(&mut self, test: bool, write: bool) {
        unsafe {
            if test {
                gl::Enable(gl::DEPTH_TEST);
            } else {
                gl::Disable(gl::DEPTH_TEST);
            }
            gl::DepthMask(if write { gl::TRUE } else { gl::FALSE });
        }
    }

    /// Releases programs and buffers. The context they were created on must be current.
    pub fn release(&mut self) {
        unsafe {
            for program in [self.color_program.take(), self.texture_program.take()]
                .into_iter()
                .flatten()
                .flatten()
            {
                gl::DeleteProgram(program.id);
            }
            for b in self.buffers.iter_mut().filter_map(Option::take) {
                gl::DeleteVertexArrays(1, &b.vao);
                gl::DeleteBuffers(3, [b.positions, b.normals, b.uvs].as_ptr());
            }
        }
    }

    /// Builds both programs now rather than on first draw, reporting what went wrong.
    pub fn compile_programs(&mut self) -> Result<(), DrawError> {
        for textured in [false, true] {
            let (slot, vert, frag, _) = self.program_slot(textured);
            if !matches!(slot, Some(Ok(_))) {
                *slot = Some(Ok(unsafe { Program::link(vert, frag, textured) }?));
            }
        }
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn program_slot(
        &mut self,
        textured: bool,
    ) -> (&mut Option<Result<Program, ()>>, &'static str, &'static str, &'static str) {
        if textured {
            (&mut self.texture_program, TEXTURE_VERT, TEXTURE_FRAG, "texture")
        } else {
            (&mut self.color_program, COLOR_VERT, COLOR_FRAG, "color")
        }
    }

    fn program(&mut self, textured: bool) -> Option<Program> {
        let (slot, vert, frag, name) = self.program_slot(textured);
        let program = slot.get_or_insert_with(|| {
            unsafe { Program::link(vert, frag, textured) }
                .inspect(|_| debug!("{name} program ready"))
                .map_err(|e| warn!("failed to build the {name} program: {e:?}"))
        });
        program.as_ref().ok().copied()
    }

    fn buffers(&mut self, shape: Shape) -> Buffers {
        *self.buffers[shape as usize].get_or_insert_with(|| unsafe { Buffers::create() })
    }

    /// Saves the host state, draws, then puts everything back.
    fn draw(&mut self, batch: Batch, then: impl FnOnce(&mut Self, &Program)) {
        if !crate::graphics::gl_loaded() {
            crate::warn_once!("GL is not loaded, nothing will be drawn");
            return;
        }
        let Some(program) = self.program(batch.texture.is_some()) else {
            return;
        };
        let buffers = self.buffers(batch.shape);

        unsafe {
            let saved = SavedState::capture();
            gl::Disable(gl::CULL_FACE);
            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
            if batch.no_depth_write {
                gl::DepthMask(gl::FALSE);
            }

            gl::UseProgram(program.id);
            gl::BindVertexArray(buffers.vao);
            self.load_uniforms(&program);

            upload(buffers.positions, program.position, 3, batch.positions);
            if let Some((texture, uvs)) = batch.texture {
                gl::Enable(gl::TEXTURE_2D);
                gl::ActiveTexture(gl::TEXTURE0);
                gl::BindTexture(gl::TEXTURE_2D, texture);
                if let Some(loc) = program.normal {
                    let normals = vec![[0.0f32, 0.0, 1.0]; batch.positions.len()];
                    upload(buffers.normals, loc, 3, normals.as_slice());
                }
                if let Some(loc) = program.uv {
                    upload(buffers.uvs, loc, 2, uvs);
                }
            }

            gl::DrawArrays(batch.mode, 0, batch.positions.len() as i32);
            then(self, &program);

            gl::DisableVertexAttribArray(program.position);
            for loc in [program.normal, program.uv].into_iter().flatten() {
                gl::DisableVertexAttribArray(loc);
            }
            saved.restore();
        }
    }

    unsafe fn load_uniforms(&self, program: &Program) {
        gl::UniformMatrix4fv(
            program.modelview,
            1,
            gl::FALSE,
            self.modelview.to_cols_array().as_ptr(),
        );
        gl::UniformMatrix4fv(
            program.projection,
            1,
            gl::FALSE,
            self.projection.to_cols_array().as_ptr(),
        );
        if program.normal_matrix >= 0 {
            let normal_matrix = self.modelview_inv.transpose();
            gl::UniformMatrix4fv(
                program.normal_matrix,
                1,
                gl::FALSE,
                normal_matrix.to_cols_array().as_ptr(),
            );
        }
        gl::Uniform4fv(program.color, 1, self.color.as_ptr());
    }

    fn textured_rect(&mut self, rect: Rect, z: f32, texture: GLuint) {
        let uvs = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];
        self.draw(
            Batch {
                shape: Shape::Rect,
                mode: gl::TRIANGLE_STRIP,
                positions: &rect_corners(rect, z),
                texture: Some((texture, &uvs)),
                no_depth_write: false,
            },
            |_, _| {},
        );
    }
}

/// Writes `data` into `buffer` and points attribute `location` at it.
unsafe fn upload<const N: usize>(buffer: GLuint, location: GLuint, size: i32, data: &[[f32; N]]) {
    gl::BindBuffer(gl::ARRAY_BUFFER, buffer);
    gl::BufferData(
        gl::ARRAY_BUFFER,
        std::mem::size_of_val(data) as isize,
        data.as_ptr().cast(),
        gl::STATIC_DRAW,
    );
    gl::VertexAttribPointer(location, size, gl::FLOAT, gl::FALSE, 0, std::ptr::null());
    gl::EnableVertexAttribArray(location);
}

/// Bottom-left, bottom-right, top-left, top-right.
fn rect_corners(r: Rect, z: f32) -> [[f32; 3]; 4] {
    [
        [r.left, r.bottom, z],
        [r.right, r.bottom, z],
        [r.left, r.top, z],
        [r.right, r.top, z],
    ]
}

/// Triangle strip between `r` and `r` grown by `b`.
fn frame_strip(r: Rect, b: f32, z: f32) -> [[f32; 3]; 10] {
    [
        [r.left - b, r.top + b, z],
        [r.left, r.top, z],
        [r.right + b, r.top + b, z],
        [r.right, r.top, z],
        [r.right + b, r.bottom - b, z],
        [r.right, r.bottom, z],
        [r.left - b, r.bottom - b, z],
        [r.left, r.bottom, z],
        [r.left - b, r.top + b, z],
        [r.left, r.top, z],
    ]
}

/// A single triangle strip covering all six faces.
fn box_strip(p0: Vec3, p1: Vec3) -> [[f32; 3]; 14] {
    [
        [p0.x, p0.y, p0.z],
        [p0.x, p0.y, p1.z],
        [p0.x, p1.y, p0.z],
        [p0.x, p1.y, p1.z],
        [p1.x, p1.y, p1.z],
        [p0.x, p0.y, p1.z],
        [p1.x, p0.y, p1.z],
        [p0.x, p0.y, p0.z],
        [p1.x, p0.y, p0.z],
        [p0.x, p1.y, p0.z],
        [p1.x, p1.y, p0.z],
        [p1.x, p1.y, p1.z],
        [p1.x, p0.y, p0.z],
        [p1.x, p0.y, p1.z],
    ]
}

/// The twelve edges of the box, as line segments.
fn box_edges(p0: Vec3, p1: Vec3) -> Vec<[Vec3; 2]> {
    let corner = |i: usize| {
        Vec3::new(
            if i & 1 == 0 { p0.x } else { p1.x },
            if i & 2 == 0 { p0.y } else { p1.y },
            if i & 4 == 0 { p0.z } else { p1.z },
        )
    };
    let mut edges = Vec::with_capacity(12);
    for i in 0..8 {
        for bit in [1, 2, 4] {
            if i & bit == 0 {
                edges.push([corner(i), corner(i | bit)]);
            }
        }
    }
    edges
}

/// Every other piece of each edge, split into `dashes` pieces.
fn dashed(edges: &[[Vec3; 2]], dashes: usize) -> Vec<[f32; 3]> {
    let mut out = Vec::new();
    for [a, b] in edges {
        for i in (0..dashes).step_by(2) {
            let t0 = i as f32 / dashes as f32;
            let t1 = (i + 1) as f32 / dashes as f32;
            out.push(a.lerp(*b, t0).to_array());
            out.push(a.lerp(*b, t1).to_array());
        }
    }
    out
}

fn ball_triangles(r: f32) -> Vec<[f32; 3]> {
    use std::f32::consts::PI;
    let res = BALL_RESOLUTION as i32;
    let mut out = Vec::with_capacity(BALL_RESOLUTION * BALL_RESOLUTION * 6);
    for x in 0..res {
        for y in -res / 2..res / 2 {
            let n1 = x as f32 / res as f32 * 2.0 * PI;
            let n2 = (x + 1) as f32 / res as f32 * 2.0 * PI;
            let n3 = y as f32 / res as f32 * PI;
            let n4 = (y + 1) as f32 / res as f32 * PI;

            let (x1, y1) = n1.sin_cos();
            let (x2, y2) = n2.sin_cos();
            let (z1, z2) = (r * n3.sin(), r * n4.sin());
            let (r1, r2) = (r * n3.cos(), r * n4.cos());

            out.extend_from_slice(&[
                [r1 * x1, r1 * y1, z1],
                [r1 * x2, r1 * y2, z1],
                [r2 * x2, r2 * y2, z2],
                [r1 * x1, r1 * y1, z1],
                [r2 * x2, r2 * y2, z2],
                [r2 * x1, r2 * y1, z2],
            ]);
        }
    }
    out
}

/// A flat arrowhead from `from` to `to`, `width` wide at the base.
fn arrow_strip(from: Vec3, to: Vec3, width: f32) -> [[f32; 3]; 4] {
    let d = (to - from).normalize_or_zero() * width;
    [
        [to.x, to.y, to.z],
        [from.x + d.y, from.y - d.x, from.z],
        [from.x - d.y, from.y + d.x, from.z],
        [from.x - d.x, from.y - d.y, from.z],
    ]
}

impl Canvas for GlDraw {
    fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }

    fn update_modelview_matrix(&mut self, model: Option<Mat4>, view: Option<Mat4>) {
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(view) = view {
            self.view = view;
        }
        self.modelview = self.view * self.model;
        self.modelview_inv = self.modelview.inverse();
    }

    fn render_rect(&mut self, rect: Rect, z: f32) {
        self.draw(
            Batch {
                shape: Shape::Rect,
                mode: gl::TRIANGLE_STRIP,
                positions: &rect_corners(rect, z),
                texture: None,
                no_depth_write: false,
            },
            |_, _| {},
        );
    }

    fn render_icon(&mut self, name: &str, rect: Rect, z: f32) {
        match self.textures.get(name) {
            Some(&texture) => self.textured_rect(rect, z, texture),
            None => {
                crate::warn_once!("Some icon textures are not registered");
                debug!("no texture for icon {name:?}");
            }
        }
    }

    fn render_frame(&mut self, rect: Rect, border: f32, z: f32) {
        self.draw(
            Batch {
                shape: Shape::Frame,
                mode: gl::TRIANGLE_STRIP,
                positions: &frame_strip(rect, border, z),
                texture: None,
                no_depth_write: false,
            },
            |_, _| {},
        );
    }

    fn render_box(&mut self, p0: Vec3, p1: Vec3, outline: bool) {
        let outline = outline.then(|| {
            let edges = box_edges(p0, p1);
            let solid: Vec<[f32; 3]> = edges
                .iter()
                .flat_map(|[a, b]| [a.to_array(), b.to_array()])
                .collect();
            (solid, dashed(&edges, OUTLINE_DASHES))
        });
        self.draw(
            Batch {
                shape: Shape::Box,
                mode: gl::TRIANGLE_STRIP,
                positions: &box_strip(p0, p1),
                texture: None,
                no_depth_write: true,
            },
            |this, program| {
                let Some((solid, dashes)) = outline else {
                    return;
                };
                let buffers = this.buffers(Shape::Box);
                unsafe {
                    gl::LineWidth(OUTLINE_WIDTH);
                    let passes = [([0.0f32, 0.0, 0.0, 0.4], &solid), ([1.0, 1.0, 1.0, 0.7], &dashes)];
                    for (color, lines) in passes {
                        gl::Uniform4fv(program.color, 1, color.as_ptr());
                        upload(buffers.positions, program.position, 3, lines.as_slice());
                        gl::DrawArrays(gl::LINES, 0, lines.len() as i32);
                    }
                }
            },
        );
    }

    fn render_ball(&mut self, radius: f32) {
        self.draw(
            Batch {
                shape: Shape::Ball,
                mode: gl::TRIANGLES,
                positions: &ball_triangles(radius),
                texture: None,
                no_depth_write: true,
            },
            |_, _| {},
        );
    }

    fn render_arrow(&mut self, from: Vec3, to: Vec3, width: f32) {
        self.draw(
            Batch {
                shape: Shape::Arrow,
                mode: gl::TRIANGLE_STRIP,
                positions: &arrow_strip(from, to, width),
                texture: None,
                no_depth_write: true,
            },
            |_, _| {},
        );
    }

    fn render_string(
        &mut self,
        text: &str,
        width: f32,
        height: f32,
        h_align: HAlign,
        v_align: VAlign,
        offset: Vec3,
    ) {
        let Some(atlas) = self.glyph_atlas else {
            crate::warn_once!("No glyph atlas registered, strings are not drawn");
            return;
        };
        let glyphs = layout_string(text, width, height, h_align, v_align, offset.truncate());
        if glyphs.is_empty() {
            return;
        }

        // Two triangles per glyph so the whole string goes out in one draw.
        let mut positions = Vec::with_capacity(glyphs.len() * 6);
        let mut uvs = Vec::with_capacity(glyphs.len() * 6);
        let z = offset.z;
        for g in &glyphs {
            let (x, y) = (g.x, g.y);
            let corners = [
                [x, y - height, z],
                [x + width, y - height, z],
                [x, y, z],
                [x + width, y, z],
            ];
            let uv = glyph_uv(g.column, g.row);
            for i in [0, 1, 2, 2, 1, 3] {
                positions.push(corners[i]);
                uvs.push(uv[i]);
            }
        }
        self.draw(
            Batch {
                shape: Shape::Glyphs,
                mode: gl::TRIANGLES,
                positions: &positions,
                texture: Some((atlas, &uvs)),
                no_depth_write: false,
            },
            |_, _| {},
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Four texture units and nothing else.
    struct Units {
        active: GLenum,
        bound: [GLuint; 4],
    }

    impl TextureUnits for Units {
        fn active(&self) -> GLenum {
            self.active
        }
        fn set_active(&mut self, unit: GLenum) {
            self.active = unit;
        }
        fn bound(&self) -> GLuint {
            self.bound[(self.active - gl::TEXTURE0) as usize]
        }
        fn bind(&mut self, texture: GLuint) {
            self.bound[(self.active - gl::TEXTURE0) as usize] = texture;
        }
    }

    #[test]
    fn texture_units_survive_a_draw() {
        let mut units = Units {
            active: gl::TEXTURE1,
            bound: [10, 11, 0, 0],
        };
        let saved = SavedUnits::capture(&mut units);
        assert_eq!(units.active, gl::TEXTURE1, "capturing changes nothing");
        assert_eq!(saved.unit0, 10);

        // what a textured draw does
        units.set_active(gl::TEXTURE0);
        units.bind(42);

        saved.restore(&mut units);
        assert_eq!(units.bound, [10, 11, 0, 0]);
        assert_eq!(units.active, gl::TEXTURE1);
    }

    #[test]
    fn box_edges_cover_every_corner_pair_once() {
        let edges = box_edges(Vec3::ZERO, Vec3::ONE);
        assert_eq!(edges.len(), 12);
        for [a, b] in &edges {
            assert!((b.distance(*a) - 1.0).abs() < 1e-6, "{a} {b}");
        }
        assert_eq!(dashed(&edges, OUTLINE_DASHES).len(), 12 * OUTLINE_DASHES);
    }

    #[test]
    fn ball_vertices_lie_on_the_sphere() {
        let verts = ball_triangles(0.5);
        assert_eq!(verts.len(), BALL_RESOLUTION * BALL_RESOLUTION * 6);
        for v in verts {
            assert!((Vec3::from_array(v).length() - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn arrow_points_at_target() {
        let strip = arrow_strip(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), 0.1);
        assert_eq!(strip[0], [0.0, 1.0, 0.0]);
        assert_eq!(strip[1], [0.1, 0.0, 0.0]);
        assert_eq!(strip[2], [-0.1, 0.0, 0.0]);
    }

    #[test]
    fn frame_surrounds_rect() {
        let strip = frame_strip(Rect::square(1.0), 0.5, 0.0);
        assert_eq!(strip[0], [-1.5, 1.5, 0.0]);
        assert_eq!(strip[1], [-1.0, 1.0, 0.0]);
        assert_eq!(strip[0], strip[8], "strip closes on itself");
    }
}
