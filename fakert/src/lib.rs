//! A fake vendor runtime module. Exports the same C entry points a real headset module does and
//! lets tests script poses, controller input and failures.
//!
//! State is per thread, so tests running in parallel each see their own "device".

use glam::Mat4;
use paste::paste;
use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::c_void;

pub const MAX_CONTROLLERS: usize = 3;

pub type RawMatrix = [[f32; 4]; 4];

/// Mirror of the controller record the host reads.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FakeController {
    pub side: i32,
    pub available: i32,
    pub buttons: u64,
    pub buttons_touched: u64,
    pub trigger_pressure: f32,
    pub grip_pressure: f32,
    pub stick: [f32; 2],
    pub dpad: [f32; 2],
}

struct State {
    created: bool,
    initialized: bool,
    hmd_type: i32,
    eye_params: [[f32; 4]; 2],
    tex_size: (i32, i32),
    hmd: RawMatrix,
    eyes: [RawMatrix; 2],
    controllers: [RawMatrix; MAX_CONTROLLERS],
    controller_states: [FakeController; MAX_CONTROLLERS],
    failing: HashSet<&'static str>,
    calls: Vec<&'static str>,
    blits: Vec<(u32, u32)>,
    submitted: u32,
}

impl Default for State {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            created: false,
            initialized: false,
            hmd_type: 2,
            eye_params: [[0.9, 1.0, 0.55, 0.5], [0.9, 1.0, 0.45, 0.5]],
            tex_size: (1512, 1680),
            hmd: identity,
            eyes: [identity; 2],
            controllers: [identity; MAX_CONTROLLERS],
            controller_states: Default::default(),
            failing: HashSet::new(),
            calls: Vec::new(),
            blits: Vec::new(),
            submitted: 0,
        }
    }
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

fn with_state<T>(f: impl FnOnce(&mut State) -> T) -> T {
    STATE.with_borrow_mut(f)
}

/// Forgets everything: the device is powered off and all scripted values are back to defaults.
pub fn reset() {
    with_state(|s| *s = State::default());
}

pub fn set_hmd_type(raw: i32) {
    with_state(|s| s.hmd_type = raw);
}

pub fn set_eye_texture_size(width: i32, height: i32) {
    with_state(|s| s.tex_size = (width, height));
}

pub fn set_hmd_position(pose: Mat4) {
    with_state(|s| s.hmd = pose.to_cols_array_2d());
}

pub fn set_eye_positions(left: Mat4, right: Mat4) {
    with_state(|s| s.eyes = [left.to_cols_array_2d(), right.to_cols_array_2d()]);
}

pub fn set_controller_position(index: usize, pose: Mat4) {
    with_state(|s| s.controllers[index] = pose.to_cols_array_2d());
}

pub fn set_controller_state(index: usize, state: FakeController) {
    with_state(|s| s.controller_states[index] = state);
}

/// Makes the named entry point (e.g. `"c_updateTrackingVR"`) return an error until cleared.
pub fn set_failing(call: &'static str, failing: bool) {
    with_state(|s| {
        if failing {
            s.failing.insert(call);
        } else {
            s.failing.remove(call);
        }
    });
}

/// Every entry point called since the last reset, in order.
pub fn calls() -> Vec<&'static str> {
    with_state(|s| s.calls.clone())
}

/// Texture pairs passed to `c_blitEyes`.
pub fn blitted() -> Vec<(u32, u32)> {
    with_state(|s| s.blits.clone())
}

pub fn submitted_frames() -> u32 {
    with_state(|s| s.submitted)
}

pub fn is_initialized() -> bool {
    with_state(|s| s.initialized)
}

macro_rules! entry_point {
    ($name:ident($($arg:ident: $ty:ty),*) |$state:ident| $body:block) => {
        paste! {
            /// # Safety
            /// Pointer arguments must be valid for the reads and writes the contract describes.
            #[no_mangle]
            #[allow(non_snake_case)]
            pub unsafe extern "system" fn [<c_ $name>]($($arg: $ty),*) -> i32 {
                with_state(|$state| {
                    $state.calls.push(stringify!([<c_ $name>]));
                    if $state.failing.contains(stringify!([<c_ $name>])) {
                        return -1;
                    }
                    $body
                })
            }
        }
    };
}

fn require_init(state: &State) -> Result<(), i32> {
    if state.initialized {
        Ok(())
    } else {
        Err(-1)
    }
}

entry_point!(createVR() |s| {
    s.created = true;
    0
});

#[cfg(windows)]
entry_point!(initVR(_device: *mut c_void, _context: *mut c_void) |s| {
    if !s.created {
        return -1;
    }
    s.initialized = true;
    0
});

#[cfg(not(windows))]
entry_point!(initVR(_display: *mut c_void, drawable: *mut c_void, context: *mut c_void) |s| {
    if !s.created || drawable.is_null() || context.is_null() {
        return -1;
    }
    s.initialized = true;
    0
});

entry_point!(getHMDType(out: *mut i32) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    *out = s.hmd_type;
    0
});

entry_point!(setEyeParams(side: i32, fx: f32, fy: f32, cx: f32, cy: f32) |s| {
    let Some(params) = s.eye_params.get_mut(side as usize) else {
        return -1;
    };
    *params = [fx, fy, cx, cy];
    0
});

entry_point!(getDefaultEyeParams(side: i32, fx: *mut f32, fy: *mut f32, cx: *mut f32, cy: *mut f32) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    let Some(&[x, y, u, v]) = s.eye_params.get(side as usize) else {
        return -1;
    };
    *fx = x;
    *fy = y;
    *cx = u;
    *cy = v;
    0
});

entry_point!(getDefaultEyeTexSize(w: *mut i32, h: *mut i32, _side: i32) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    (*w, *h) = s.tex_size;
    0
});

entry_point!(updateTrackingVR() |s| {
    match require_init(s) {
        Ok(()) => 0,
        Err(e) => e,
    }
});

entry_point!(getEyePositions(out: *mut [RawMatrix; 2]) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    *out = s.eyes;
    0
});

entry_point!(getHMDPosition(out: *mut RawMatrix) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    *out = s.hmd;
    0
});

entry_point!(getControllerPositions(out: *mut [RawMatrix; MAX_CONTROLLERS]) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    *out = s.controllers;
    0
});

entry_point!(getControllerStates(out: *mut *mut c_void) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    let targets = std::slice::from_raw_parts(out, MAX_CONTROLLERS);
    for (target, state) in targets.iter().zip(&s.controller_states) {
        if !target.is_null() {
            *(*target).cast::<FakeController>() = *state;
        }
    }
    0
});

entry_point!(blitEye(_side: i32, texture: *const c_void, _u: *const f32, _v: *const f32) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    if texture.is_null() {
        return -1;
    }
    0
});

entry_point!(blitEyes(left: *const c_void, right: *const c_void, _u: *const f32, _v: *const f32) |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    if left.is_null() || right.is_null() {
        return -1;
    }
    s.blits.push((*left.cast::<u32>(), *right.cast::<u32>()));
    0
});

entry_point!(submitFrame() |s| {
    if let Err(e) = require_init(s) {
        return e;
    }
    s.submitted += 1;
    0
});

entry_point!(uninitVR() |s| {
    s.initialized = false;
    s.created = false;
    0
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_requires_init() {
        reset();
        assert_eq!(unsafe { c_updateTrackingVR() }, -1);
        assert_eq!(unsafe { c_createVR() }, 0);
        #[cfg(not(windows))]
        {
            let mut drawable = 0u64;
            let mut context = std::ptr::null_mut::<c_void>();
            let ret = unsafe {
                c_initVR(
                    std::ptr::null_mut(),
                    (&raw mut drawable).cast(),
                    (&raw mut context).cast(),
                )
            };
            assert_eq!(ret, 0);
        }
        #[cfg(windows)]
        assert_eq!(
            unsafe { c_initVR(std::ptr::null_mut(), std::ptr::null_mut()) },
            0
        );
        assert_eq!(unsafe { c_updateTrackingVR() }, 0);
        assert_eq!(calls(), ["c_updateTrackingVR", "c_createVR", "c_initVR", "c_updateTrackingVR"]);
    }

    #[test]
    fn scripted_failure() {
        reset();
        set_failing("c_createVR", true);
        assert_eq!(unsafe { c_createVR() }, -1);
        set_failing("c_createVR", false);
        assert_eq!(unsafe { c_createVR() }, 0);
    }
}
