//! Binding to vendor runtime modules.
//!
//! Every supported headset family ships a shared module exporting the same small C function
//! table. We pick the module from the configuration (or try them in turn), resolve the table, and
//! hide it behind [`DeviceDriver`] so the session code never touches raw entry points.

use crate::config::Config;
use crate::graphics::GraphicsContext;
use crate::types::{ControllerState, DeviceType, Side, VendorRuntime, MAX_CONTROLLERS};
use derive_more::From;
use glam::Mat4;
use libloading::Library;
use log::{debug, info, warn};
use std::ffi::c_void;
use std::path::{Path, PathBuf};

/// Column-major 4x4 matrix as it crosses the module boundary.
pub type RawMatrix = [[f32; 4]; 4];

#[cfg(windows)]
pub type InitFn = unsafe extern "system" fn(device: *mut c_void, context: *mut c_void) -> i32;
#[cfg(not(windows))]
pub type InitFn = unsafe extern "system" fn(
    display: *mut c_void,
    drawable: *mut c_void,
    context: *mut c_void,
) -> i32;

macro_rules! entry_points {
    ($($field:ident: $symbol:literal => $ty:ty,)*) => {
        /// The function table every vendor module exports.
        #[derive(Clone, Copy)]
        pub struct EntryPoints {
            $(pub $field: $ty,)*
        }

        impl EntryPoints {
            /// Symbol names, in resolution order.
            pub const SYMBOLS: &'static [&'static str] = &[$($symbol),*];

            /// # Safety
            /// The module must export these symbols with the declared signatures.
            unsafe fn resolve(lib: &Library, runtime: VendorRuntime) -> Result<Self, BindError> {
                Ok(Self {
                    $($field: *lib
                        .get::<$ty>(concat!($symbol, "\0").as_bytes())
                        .map_err(|_| BindError::IncompleteModule { runtime, symbol: $symbol })?,)*
                })
            }
        }
    };
}

entry_points! {
    create: "c_createVR" => unsafe extern "system" fn() -> i32,
    init: "c_initVR" => InitFn,
    hmd_type: "c_getHMDType" => unsafe extern "system" fn(*mut i32) -> i32,
    set_eye_params: "c_setEyeParams" => unsafe extern "system" fn(i32, f32, f32, f32, f32) -> i32,
    default_eye_params: "c_getDefaultEyeParams" =>
        unsafe extern "system" fn(i32, *mut f32, *mut f32, *mut f32, *mut f32) -> i32,
    default_eye_tex_size: "c_getDefaultEyeTexSize" =>
        unsafe extern "system" fn(*mut i32, *mut i32, i32) -> i32,
    update_tracking: "c_updateTrackingVR" => unsafe extern "system" fn() -> i32,
    eye_positions: "c_getEyePositions" => unsafe extern "system" fn(*mut [RawMatrix; 2]) -> i32,
    hmd_position: "c_getHMDPosition" => unsafe extern "system" fn(*mut RawMatrix) -> i32,
    controller_positions: "c_getControllerPositions" =>
        unsafe extern "system" fn(*mut [RawMatrix; MAX_CONTROLLERS]) -> i32,
    controller_states: "c_getControllerStates" => unsafe extern "system" fn(*mut *mut c_void) -> i32,
    blit_eye: "c_blitEye" =>
        unsafe extern "system" fn(i32, *const c_void, *const f32, *const f32) -> i32,
    blit_eyes: "c_blitEyes" =>
        unsafe extern "system" fn(*const c_void, *const c_void, *const f32, *const f32) -> i32,
    submit_frame: "c_submitFrame" => unsafe extern "system" fn() -> i32,
    uninit: "c_uninitVR" => unsafe extern "system" fn() -> i32,
}

#[derive(Debug)]
#[allow(dead_code)] // Results aren't used, but they're printed
pub enum BindError {
    ModuleNotFound {
        runtime: VendorRuntime,
        path: PathBuf,
        reason: String,
    },
    IncompleteModule {
        runtime: VendorRuntime,
        symbol: &'static str,
    },
    Unsupported(VendorRuntime),
    NoCandidates,
}

#[derive(Debug, From)]
#[allow(dead_code)]
pub enum DeviceError {
    #[from]
    Bind(BindError),
    Call {
        call: &'static str,
        code: i32,
    },
    NotInitialized,
    AlreadyInitialized,
    InvalidDevice,
}

#[derive(Debug)]
#[allow(dead_code)]
pub enum TrackingError {
    Call { call: &'static str, code: i32 },
    NotInitialized,
}

impl From<TrackingError> for DeviceError {
    fn from(e: TrackingError) -> Self {
        match e {
            TrackingError::Call { call, code } => DeviceError::Call { call, code },
            TrackingError::NotInitialized => DeviceError::NotInitialized,
        }
    }
}

/// Normalized eye intrinsics: focal lengths and principal point as fractions of the eye texture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EyeParams {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

/// A bound vendor runtime.
pub trait DeviceDriver {
    fn runtime(&self) -> VendorRuntime;
    fn create(&mut self) -> Result<(), DeviceError>;
    fn init(&mut self, context: &GraphicsContext) -> Result<(), DeviceError>;
    fn hmd_type(&mut self) -> Result<DeviceType, DeviceError>;
    fn set_eye_params(&mut self, side: Side, params: EyeParams) -> Result<(), DeviceError>;
    fn default_eye_params(&mut self, side: Side) -> Result<EyeParams, DeviceError>;
    /// Recommended eye texture size, width then height.
    fn default_eye_texture_size(&mut self, side: Side) -> Result<(u32, u32), DeviceError>;
    fn update_tracking(&mut self) -> Result<(), TrackingError>;
    fn eye_positions(&mut self) -> Result<[Mat4; 2], TrackingError>;
    fn hmd_position(&mut self) -> Result<Mat4, TrackingError>;
    fn controller_positions(&mut self) -> Result<[Mat4; MAX_CONTROLLERS], TrackingError>;
    fn controller_states(
        &mut self,
        states: &mut [ControllerState; MAX_CONTROLLERS],
    ) -> Result<(), TrackingError>;
    fn blit_eye(&mut self, side: Side, texture: u32, aperture: [f32; 2]) -> Result<(), DeviceError>;
    fn blit_eyes(&mut self, textures: [u32; 2], aperture: [f32; 2]) -> Result<(), DeviceError>;
    fn submit_frame(&mut self) -> Result<(), DeviceError>;
    fn uninit(&mut self) -> Result<(), DeviceError>;

    /// Whether this runtime takes eye textures from us every frame.
    fn submits_frames(&self) -> bool {
        !self.runtime().is_remote()
    }
}

/// Opens drivers for a runtime. The default implementation loads shared modules.
pub trait DriverFactory {
    fn open(&mut self, runtime: VendorRuntime) -> Result<Box<dyn DeviceDriver>, BindError>;
}

/// A driver backed by a resolved [`EntryPoints`] table.
pub struct DynamicDriver {
    runtime: VendorRuntime,
    fns: EntryPoints,
    // keeps the entry points mapped
    _module: Option<Library>,
}

fn check(call: &'static str, code: i32) -> Result<(), DeviceError> {
    match code {
        0 => Ok(()),
        code => Err(DeviceError::Call { call, code }),
    }
}

fn check_tracking(call: &'static str, code: i32) -> Result<(), TrackingError> {
    match code {
        0 => Ok(()),
        code => Err(TrackingError::Call { call, code }),
    }
}

impl DynamicDriver {
    /// Opens the module at `path` and resolves its entry points.
    ///
    /// # Safety
    /// Loading a module runs its initializers. The module must implement the entry point contract.
    pub unsafe fn open(path: &Path, runtime: VendorRuntime) -> Result<Self, BindError> {
        let module = Library::new(path).map_err(|e| BindError::ModuleNotFound {
            runtime,
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        let fns = EntryPoints::resolve(&module, runtime)?;
        debug!("resolved {} entry points from {path:?}", EntryPoints::SYMBOLS.len());
        Ok(Self {
            runtime,
            fns,
            _module: Some(module),
        })
    }

    /// Wraps an entry point table that is already linked into the process.
    pub fn from_entry_points(runtime: VendorRuntime, fns: EntryPoints) -> Self {
        Self {
            runtime,
            fns,
            _module: None,
        }
    }
}

impl DeviceDriver for DynamicDriver {
    fn runtime(&self) -> VendorRuntime {
        self.runtime
    }

    fn create(&mut self) -> Result<(), DeviceError> {
        check("c_createVR", unsafe { (self.fns.create)() })
    }

    fn init(&mut self, context: &GraphicsContext) -> Result<(), DeviceError> {
        let code = match *context {
            #[cfg(windows)]
            GraphicsContext::Wgl { device, context } => unsafe { (self.fns.init)(device, context) },
            #[cfg(not(windows))]
            GraphicsContext::Glx {
                display,
                mut drawable,
                mut context,
            } => unsafe {
                (self.fns.init)(
                    display,
                    (&raw mut drawable).cast(),
                    (&raw mut context).cast(),
                )
            },
            #[allow(unreachable_patterns)]
            _ => {
                warn!("{context:?} cannot be used on this platform");
                return Err(DeviceError::Call {
                    call: "c_initVR",
                    code: -1,
                });
            }
        };
        check("c_initVR", code)
    }

    fn hmd_type(&mut self) -> Result<DeviceType, DeviceError> {
        let mut raw = 0;
        check("c_getHMDType", unsafe { (self.fns.hmd_type)(&mut raw) })?;
        DeviceType::from_raw(raw).ok_or(DeviceError::Call {
            call: "c_getHMDType",
            code: raw,
        })
    }

    fn set_eye_params(&mut self, side: Side, p: EyeParams) -> Result<(), DeviceError> {
        check("c_setEyeParams", unsafe {
            (self.fns.set_eye_params)(side as i32, p.fx, p.fy, p.cx, p.cy)
        })
    }

    fn default_eye_params(&mut self, side: Side) -> Result<EyeParams, DeviceError> {
        let mut p = EyeParams::default();
        check("c_getDefaultEyeParams", unsafe {
            (self.fns.default_eye_params)(side as i32, &mut p.fx, &mut p.fy, &mut p.cx, &mut p.cy)
        })?;
        Ok(p)
    }

    fn default_eye_texture_size(&mut self, side: Side) -> Result<(u32, u32), DeviceError> {
        let [mut w, mut h] = [0i32; 2];
        check("c_getDefaultEyeTexSize", unsafe {
            (self.fns.default_eye_tex_size)(&mut w, &mut h, side as i32)
        })?;
        if w <= 0 || h <= 0 {
            return Err(DeviceError::Call {
                call: "c_getDefaultEyeTexSize",
                code: -1,
            });
        }
        Ok((w as u32, h as u32))
    }

    fn update_tracking(&mut self) -> Result<(), TrackingError> {
        check_tracking("c_updateTrackingVR", unsafe { (self.fns.update_tracking)() })
    }

    fn eye_positions(&mut self) -> Result<[Mat4; 2], TrackingError> {
        let mut raw = [RawMatrix::default(); 2];
        check_tracking("c_getEyePositions", unsafe {
            (self.fns.eye_positions)(&mut raw)
        })?;
        Ok(raw.map(|m| Mat4::from_cols_array_2d(&m)))
    }

    fn hmd_position(&mut self) -> Result<Mat4, TrackingError> {
        let mut raw = RawMatrix::default();
        check_tracking("c_getHMDPosition", unsafe {
            (self.fns.hmd_position)(&mut raw)
        })?;
        Ok(Mat4::from_cols_array_2d(&raw))
    }

    fn controller_positions(&mut self) -> Result<[Mat4; MAX_CONTROLLERS], TrackingError> {
        let mut raw = [RawMatrix::default(); MAX_CONTROLLERS];
        check_tracking("c_getControllerPositions", unsafe {
            (self.fns.controller_positions)(&mut raw)
        })?;
        Ok(raw.map(|m| Mat4::from_cols_array_2d(&m)))
    }

    fn controller_states(
        &mut self,
        states: &mut [ControllerState; MAX_CONTROLLERS],
    ) -> Result<(), TrackingError> {
        let mut ptrs: [*mut c_void; MAX_CONTROLLERS] =
            std::array::from_fn(|i| (&raw mut states[i]).cast());
        check_tracking("c_getControllerStates", unsafe {
            (self.fns.controller_states)(ptrs.as_mut_ptr())
        })
    }

    fn blit_eye(&mut self, side: Side, texture: u32, aperture: [f32; 2]) -> Result<(), DeviceError> {
        check("c_blitEye", unsafe {
            (self.fns.blit_eye)(
                side as i32,
                (&raw const texture).cast(),
                &aperture[0],
                &aperture[1],
            )
        })
    }

    fn blit_eyes(&mut self, textures: [u32; 2], aperture: [f32; 2]) -> Result<(), DeviceError> {
        check("c_blitEyes", unsafe {
            (self.fns.blit_eyes)(
                (&raw const textures[0]).cast(),
                (&raw const textures[1]).cast(),
                &aperture[0],
                &aperture[1],
            )
        })
    }

    fn submit_frame(&mut self) -> Result<(), DeviceError> {
        check("c_submitFrame", unsafe { (self.fns.submit_frame)() })
    }

    fn uninit(&mut self) -> Result<(), DeviceError> {
        check("c_uninitVR", unsafe { (self.fns.uninit)() })
    }
}

/// Which runtimes to try, and whether a failure may fall through to the next one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindPlan {
    pub runtimes: Vec<VendorRuntime>,
    pub autodetect: bool,
}

impl BindPlan {
    pub fn from_config(config: &Config) -> Result<Self, DeviceError> {
        if config.use_openxr {
            let runtime = match config.device {
                Some(DeviceType::MagicLeap) => VendorRuntime::MagicLeap,
                _ => VendorRuntime::OpenXr,
            };
            return Ok(Self::explicit(runtime));
        }

        match config.device {
            None => Ok(Self {
                runtimes: [
                    VendorRuntime::Oculus,
                    VendorRuntime::Steam,
                    VendorRuntime::Fove,
                ]
                .into_iter()
                .filter(|r| r.available_on_platform())
                .collect(),
                autodetect: true,
            }),
            Some(device) => device
                .runtime()
                .map(Self::explicit)
                .ok_or(DeviceError::InvalidDevice),
        }
    }

    fn explicit(runtime: VendorRuntime) -> Self {
        Self {
            runtimes: vec![runtime],
            autodetect: false,
        }
    }
}

/// Opens the first runtime of `plan` that binds.
pub fn bind(
    factory: &mut dyn DriverFactory,
    plan: &BindPlan,
) -> Result<Box<dyn DeviceDriver>, BindError> {
    let mut last = BindError::NoCandidates;
    for &runtime in &plan.runtimes {
        match factory.open(runtime) {
            Ok(driver) => {
                info!("Bound {runtime:?} runtime");
                return Ok(driver);
            }
            Err(e) if plan.autodetect => {
                debug!("{runtime:?} unavailable: {e:?}");
                last = e;
            }
            Err(e) => return Err(e),
        }
    }
    Err(last)
}

/// Loads vendor modules from disk.
pub struct ModuleLoader {
    dir: PathBuf,
    prefix: String,
}

impl ModuleLoader {
    pub fn new(config: &Config) -> Self {
        let dir = config.module_dir.clone().unwrap_or_else(|| {
            std::env::current_exe()
                .map(|exe| module_dir_for_exe(&exe))
                .unwrap_or_else(|e| {
                    warn!("Could not locate the running executable ({e}), using the working directory");
                    PathBuf::from(".")
                })
        });
        Self {
            dir,
            prefix: config.module_prefix.clone(),
        }
    }

    pub fn module_path(&self, runtime: VendorRuntime) -> PathBuf {
        self.dir.join(module_file_name(&self.prefix, runtime))
    }
}

impl DriverFactory for ModuleLoader {
    fn open(&mut self, runtime: VendorRuntime) -> Result<Box<dyn DeviceDriver>, BindError> {
        if !runtime.available_on_platform() {
            return Err(BindError::Unsupported(runtime));
        }
        let path = self.module_path(runtime);
        debug!("loading {runtime:?} from {path:?}");
        // SAFETY: modules named after our prefix implement the entry point contract.
        let driver = unsafe { DynamicDriver::open(&path, runtime)? };
        Ok(Box::new(driver))
    }
}

pub fn module_file_name(prefix: &str, runtime: VendorRuntime) -> String {
    let name = runtime.module_name();
    if cfg!(windows) {
        format!("{prefix}_{name}.dll")
    } else if cfg!(target_os = "macos") {
        format!("lib{prefix}_{name}.dylib")
    } else {
        format!("lib{prefix}_{name}.so")
    }
}

/// Modules sit next to the executable, or next to the application bundle on macOS.
pub fn module_dir_for_exe(exe: &Path) -> PathBuf {
    let Some(dir) = exe.parent() else {
        return PathBuf::from(".");
    };
    if dir.ends_with("Contents/MacOS") {
        if let Some(bundle) = dir.parent().and_then(Path::parent) {
            if bundle.extension().is_some_and(|ext| ext == "app") {
                if let Some(outer) = bundle.parent() {
                    return outer.to_owned();
                }
            }
        }
    }
    dir.to_owned()
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn autodetect_order() {
        let plan = BindPlan::from_config(&Config::default()).expect("autodetect plan");
        assert!(plan.autodetect);
        if cfg!(windows) {
            assert_eq!(
                plan.runtimes,
                [
                    VendorRuntime::Oculus,
                    VendorRuntime::Steam,
                    VendorRuntime::Fove
                ]
            );
        } else {
            assert_eq!(plan.runtimes, [VendorRuntime::Steam]);
        }
        assert!(!plan.runtimes.contains(&VendorRuntime::MagicLeap));
        assert!(!plan.runtimes.contains(&VendorRuntime::OpenXr));
    }

    #[test]
    fn openxr_overrides_device_except_magic_leap() {
        let mut config = Config {
            use_openxr: true,
            device: Some(DeviceType::Vive),
            ..Default::default()
        };
        let plan = BindPlan::from_config(&config).expect("plan");
        assert_eq!(plan.runtimes, [VendorRuntime::OpenXr]);
        assert!(!plan.autodetect);

        config.device = Some(DeviceType::MagicLeap);
        let plan = BindPlan::from_config(&config).expect("plan");
        assert_eq!(plan.runtimes, [VendorRuntime::MagicLeap]);
    }

    #[test]
    fn null_device_is_invalid() {
        let config = Config {
            device: Some(DeviceType::Null),
            ..Default::default()
        };
        assert!(matches!(
            BindPlan::from_config(&config),
            Err(DeviceError::InvalidDevice)
        ));
    }

    #[test]
    fn explicit_bind_does_not_fall_through() {
        let mut factory = FakeFactory::new(&[VendorRuntime::Steam]);
        let plan = BindPlan {
            runtimes: vec![VendorRuntime::Oculus, VendorRuntime::Steam],
            autodetect: false,
        };
        let err = bind(&mut factory, &plan).err().expect("bind should fail");
        assert!(matches!(err, BindError::ModuleNotFound { .. }), "{err:?}");
        assert_eq!(factory.opened, [VendorRuntime::Oculus]);
    }

    #[test]
    fn autodetect_falls_through() {
        let mut factory = FakeFactory::new(&[VendorRuntime::Steam]);
        let plan = BindPlan {
            runtimes: vec![VendorRuntime::Oculus, VendorRuntime::Steam],
            autodetect: true,
        };
        let driver = bind(&mut factory, &plan).expect("steam should bind");
        assert_eq!(driver.runtime(), VendorRuntime::Steam);
        assert_eq!(factory.opened, [VendorRuntime::Oculus, VendorRuntime::Steam]);
    }

    #[test]
    fn missing_module_is_reported() {
        let config = Config {
            module_dir: Some(PathBuf::from("/nonexistent/pievr")),
            ..Default::default()
        };
        let mut loader = ModuleLoader::new(&config);
        let err = loader
            .open(VendorRuntime::Steam)
            .err()
            .expect("no module on disk");
        assert!(
            matches!(err, BindError::ModuleNotFound { runtime: VendorRuntime::Steam, .. }),
            "{err:?}"
        );
        assert!(matches!(
            loader.open(VendorRuntime::MagicLeap).err(),
            Some(BindError::Unsupported(VendorRuntime::MagicLeap))
        ));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn module_names() {
        let config = Config {
            module_dir: Some(PathBuf::from("/opt/host")),
            ..Default::default()
        };
        let loader = ModuleLoader::new(&config);
        assert_eq!(
            loader.module_path(VendorRuntime::Steam),
            Path::new("/opt/host/libBlenderXR_SteamVR.so")
        );
        assert_eq!(
            module_file_name("Foo", VendorRuntime::OpenXr),
            "libFoo_OpenXR.so"
        );
    }

    #[test]
    fn bundle_directory() {
        assert_eq!(
            module_dir_for_exe(Path::new("/Applications/blender.app/Contents/MacOS/blender")),
            Path::new("/Applications")
        );
        assert_eq!(
            module_dir_for_exe(Path::new("/usr/local/bin/blender")),
            Path::new("/usr/local/bin")
        );
    }

    #[test]
    fn driver_round_trips_through_entry_points() {
        fakert::reset();
        let mut driver =
            DynamicDriver::from_entry_points(VendorRuntime::Steam, fake_entry_points());
        assert!(
            matches!(driver.update_tracking(), Err(TrackingError::Call { .. })),
            "tracking before init must fail"
        );
        driver.create().expect("create");
        driver.init(&fake_context()).expect("init");

        fakert::set_hmd_type(DeviceType::Index as i32);
        assert_eq!(driver.hmd_type().expect("hmd type"), DeviceType::Index);

        let pose = Mat4::from_translation(glam::Vec3::new(0.0, 1.5, 0.2));
        fakert::set_hmd_position(pose);
        driver.update_tracking().expect("tracking");
        assert_eq!(driver.hmd_position().expect("hmd"), pose);

        let mut controller = fakert::FakeController {
            available: 1,
            stick: [0.0, 1.0],
            buttons: crate::types::buttons::STICK,
            ..Default::default()
        };
        controller.side = 1;
        fakert::set_controller_state(1, controller);
        let mut states = [ControllerState::default(); MAX_CONTROLLERS];
        driver.controller_states(&mut states).expect("states");
        assert!(states[1].is_available());
        assert_eq!(states[1].stick, [0.0, 1.0]);
        assert!(states[1].pressed(crate::types::buttons::STICK));
        assert!(!states[0].is_available());

        driver.blit_eyes([3, 4], [1.0, 1.0]).expect("blit");
        driver.submit_frame().expect("submit");
        assert_eq!(fakert::blitted(), [(3, 4)]);
        assert_eq!(fakert::submitted_frames(), 1);
        driver.uninit().expect("uninit");
    }
}
