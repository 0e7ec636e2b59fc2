use std::ffi::{c_char, c_ulong, c_void, CStr};
use std::sync::Once;

/// Handles of the host's current GL context, handed to the vendor module at init.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GraphicsContext {
    /// Windows device context and GL rendering context.
    Wgl {
        device: *mut c_void,
        context: *mut c_void,
    },
    /// X11 display connection, drawable and GLX context.
    Glx {
        display: *mut c_void,
        drawable: c_ulong,
        context: *mut c_void,
    },
}

impl GraphicsContext {
    /// Captures the context current on the calling thread.
    pub fn current() -> Option<Self> {
        current_context()
    }
}

#[cfg(target_os = "linux")]
mod glx {
    use glutin_glx_sys::glx::Glx;
    use log::warn;
    use std::ffi::{c_void, CString};
    use std::sync::LazyLock;

    static LIBGLX: LazyLock<Option<libloading::Library>> = LazyLock::new(|| {
        unsafe { libloading::Library::new("libGLX.so.0") }
            .inspect_err(|e| warn!("Failed to load libGLX: {e}"))
            .ok()
    });

    pub(super) fn lookup(name: &str) -> *const c_void {
        let Some(lib) = LIBGLX.as_ref() else {
            return std::ptr::null();
        };
        let Ok(name) = CString::new(name) else {
            return std::ptr::null();
        };
        // SAFETY: the symbol is only used as an opaque address.
        unsafe { lib.get::<*const c_void>(name.as_bytes_with_nul()) }
            .map(|sym| *sym)
            .unwrap_or(std::ptr::null())
    }

    pub(super) fn load() -> Option<Glx> {
        LIBGLX.as_ref()?;
        Some(Glx::load_with(lookup))
    }
}

#[cfg(target_os = "linux")]
fn current_context() -> Option<GraphicsContext> {
    let glx = glx::load()?;
    let (display, drawable, context) = unsafe {
        (
            glx.GetCurrentDisplay(),
            glx.GetCurrentDrawable(),
            glx.GetCurrentContext(),
        )
    };
    if display.is_null() || context.is_null() {
        log::warn!("No GLX context is current on this thread");
        return None;
    }
    Some(GraphicsContext::Glx {
        display: display.cast(),
        drawable,
        context: context.cast_mut(),
    })
}

#[cfg(not(target_os = "linux"))]
fn current_context() -> Option<GraphicsContext> {
    crate::warn_unimplemented!("GraphicsContext::current");
    None
}

/// Loads GL entry points once. Later calls are no-ops.
pub fn load_gl_with(mut loader: impl FnMut(&str) -> *const c_void) {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        gl::load_with(&mut loader);

        if log::log_enabled!(log::Level::Debug) && gl::DebugMessageCallback::is_loaded() {
            unsafe {
                gl::DebugMessageCallback(Some(debug_message), std::ptr::null());
                gl::Enable(gl::DEBUG_OUTPUT);
            }
        }
    });
}

/// Loads GL through GLX's proc address lookup.
#[cfg(target_os = "linux")]
pub fn load_gl() {
    let Some(glx) = glx::load() else {
        return;
    };
    load_gl_with(|f| {
        let Ok(f) = std::ffi::CString::new(f) else {
            return std::ptr::null();
        };
        unsafe { glx.GetProcAddress(f.as_ptr().cast()) }.cast()
    });
}

#[inline]
pub fn gl_loaded() -> bool {
    gl::UseProgram::is_loaded()
}

/// Eye textures are sampled 1:1, so turn off mipmapping and filtering.
pub fn configure_eye_texture(texture: u32) {
    if !gl::TexParameteri::is_loaded() {
        crate::warn_once!("GL is not loaded, eye textures keep their default sampling");
        return;
    }
    unsafe {
        let mut previous = 0;
        gl::GetIntegerv(gl::TEXTURE_BINDING_2D, &mut previous);
        gl::BindTexture(gl::TEXTURE_2D, texture);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAX_LEVEL, 0);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as i32);
        gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as i32);
        gl::BindTexture(gl::TEXTURE_2D, previous as u32);
    }
}

extern "system" fn debug_message(
    source: gl::types::GLenum,
    ty: gl::types::GLenum,
    id: gl::types::GLuint,
    severity: gl::types::GLenum,
    _: gl::types::GLsizei,
    message: *const c_char,
    _: *mut c_void,
) {
    let source = match source {
        gl::DEBUG_SOURCE_API => "OpenGL Api",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "Shader Compiler",
        gl::DEBUG_SOURCE_OTHER => "Other",
        _ => "<unknown>",
    };

    let ty = match ty {
        gl::DEBUG_TYPE_ERROR => "Error",
        gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "Deprecated Behavior",
        gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "Undefined Behavior",
        gl::DEBUG_TYPE_PORTABILITY => "Portability Issue",
        gl::DEBUG_TYPE_PERFORMANCE => "Performance Issue",
        gl::DEBUG_TYPE_OTHER => "Other",
        _ => "<unknown>",
    };

    let severity = match severity {
        gl::DEBUG_SEVERITY_HIGH => "High",
        gl::DEBUG_SEVERITY_MEDIUM => "Medium",
        gl::DEBUG_SEVERITY_LOW => "Low",
        gl::DEBUG_SEVERITY_NOTIFICATION => "Notification",
        _ => "<unknown>",
    };
    let message = unsafe { CStr::from_ptr(message) };
    log::debug!("(severity: {severity}, id: {id}) {ty} message from {source}: {message:?}");
}
