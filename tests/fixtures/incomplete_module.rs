//! A vendor module that forgot to export `c_submitFrame`.

use std::ffi::c_void;

type RawMatrix = [[f32; 4]; 4];

#[no_mangle]
pub extern "system" fn c_createVR() -> i32 {
    0
}

#[cfg(windows)]
#[no_mangle]
pub extern "system" fn c_initVR(_device: *mut c_void, _context: *mut c_void) -> i32 {
    0
}

#[cfg(not(windows))]
#[no_mangle]
pub extern "system" fn c_initVR(
    _display: *mut c_void,
    _drawable: *mut c_void,
    _context: *mut c_void,
) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_getHMDType(_out: *mut i32) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_setEyeParams(_side: i32, _fx: f32, _fy: f32, _cx: f32, _cy: f32) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_getDefaultEyeParams(
    _side: i32,
    _fx: *mut f32,
    _fy: *mut f32,
    _cx: *mut f32,
    _cy: *mut f32,
) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_getDefaultEyeTexSize(_w: *mut i32, _h: *mut i32, _side: i32) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_updateTrackingVR() -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_getEyePositions(_out: *mut [RawMatrix; 2]) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_getHMDPosition(_out: *mut RawMatrix) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_getControllerPositions(_out: *mut [RawMatrix; 3]) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_getControllerStates(_out: *mut *mut c_void) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_blitEye(
    _side: i32,
    _texture: *const c_void,
    _u: *const f32,
    _v: *const f32,
) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_blitEyes(
    _left: *const c_void,
    _right: *const c_void,
    _u: *const f32,
    _v: *const f32,
) -> i32 {
    0
}

#[no_mangle]
pub extern "system" fn c_uninitVR() -> i32 {
    0
}
