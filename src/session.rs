//! Session lifecycle: binding a runtime, per-eye render targets, the tracking poll, per-eye
//! view/projection setup and frame submission.

use crate::config::Config;
use crate::draw::Canvas;
use crate::graphics::{self, GraphicsContext};
use crate::lmatrix::LMatrix2;
use crate::navigation::Navigation;
use crate::runtime::{
    BindError, BindPlan, DeviceDriver, DeviceError, DriverFactory, EyeParams, ModuleLoader,
    TrackingError,
};
use crate::types::{ControllerState, DeviceType, Side, Space, VendorRuntime, MAX_CONTROLLERS};
use crate::ui::{HostAction, Ui};
use derive_more::From;
use glam::Mat4;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::time::Instant;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionId(pub u64);
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionId(pub u64);
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OffscreenId(pub u64);
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewportId(pub u64);

/// An offscreen color buffer and the GL texture holding its color output.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Offscreen {
    pub id: OffscreenId,
    pub color_texture: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub xmin: i32,
    pub xmax: i32,
    pub ymin: i32,
    pub ymax: i32,
}

/// Services the host application provides: scene objects and GPU render targets.
pub trait HostScene {
    fn create_offscreen(&mut self, width: u32, height: u32) -> Option<Offscreen>;
    fn free_offscreen(&mut self, offscreen: OffscreenId);
    fn create_viewport(&mut self, region: RegionId, offscreen: &Offscreen) -> Option<ViewportId>;
    fn free_viewport(&mut self, viewport: ViewportId);
    /// Switches the region's 3D view to device driven perspective. Returns false if the region
    /// has no 3D view.
    fn mark_region_vr(&mut self, region: RegionId) -> bool;
    fn bind_viewport(&mut self, viewport: ViewportId, rect: PixelRect);
    fn unbind_viewport(&mut self, viewport: ViewportId);

    fn active_collection(&self) -> Option<CollectionId>;
    fn create_camera(&mut self, collection: CollectionId) -> Option<ObjectId>;
    fn select_and_activate(&mut self, object: ObjectId);
    /// Flags transform, geometry and animation data for re-evaluation.
    fn tag_recalc(&mut self, object: ObjectId);
    fn object_exists(&self, object: ObjectId) -> bool;
    fn is_referenced_elsewhere(&self, object: ObjectId) -> bool;
    fn delete_object(&mut self, object: ObjectId);
    fn write_camera(&mut self, camera: ObjectId, lens: f32, clip_start: f32, clip_end: f32);
}

#[derive(Debug)]
#[allow(dead_code)]
pub enum ResourceError {
    NoSession,
    Offscreen(Side),
    Viewport(Side),
    NoRegionView,
    Camera,
}

#[derive(Debug, From)]
#[allow(dead_code)]
pub enum SessionError {
    Device(DeviceError),
    Tracking(TrackingError),
    Resource(ResourceError),
}

impl From<BindError> for SessionError {
    fn from(e: BindError) -> Self {
        Self::Device(e.into())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    UiReady,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SensorFit {
    #[default]
    Auto,
    Horizontal,
    Vertical,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ViewPlane {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
}

/// Projection inputs and outputs for one eye.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraParams {
    pub is_ortho: bool,
    pub sensor_fit: SensorFit,
    pub sensor_x: f32,
    pub sensor_y: f32,
    pub zoom: f32,
    pub ortho_scale: f32,

    pub lens: f32,
    pub clip_start: f32,
    pub clip_end: f32,
    pub ycor: f32,
    pub offsetx: f32,
    pub offsety: f32,
    pub viewdx: f32,
    pub viewdy: f32,
    pub viewplane: ViewPlane,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            is_ortho: false,
            sensor_fit: SensorFit::Auto,
            sensor_x: 36.0,
            sensor_y: 24.0,
            zoom: 1.0,
            ortho_scale: 6.0,
            lens: 50.0,
            clip_start: 0.1,
            clip_end: 100.0,
            ycor: 1.0,
            offsetx: 0.0,
            offsety: 0.0,
            viewdx: 0.0,
            viewdy: 0.0,
            viewplane: ViewPlane::default(),
        }
    }
}

/// The host's 3D view as far as projection setup is concerned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewParams {
    pub camera: Option<ObjectId>,
    pub lens: f32,
    pub clip_start: f32,
    pub clip_end: f32,
}

/// Fills in `params` from the eye intrinsics. `res` is the eye texture size, `aspect` the pixel
/// aspect (x, y).
pub fn compute_view_plane(
    eye: EyeParams,
    res: (u32, u32),
    aspect: [f32; 2],
    clip: (f32, f32),
    params: &mut CameraParams,
) {
    let (res_x, res_y) = (res.0 as f32, res.1 as f32);
    let [xasp, yasp] = aspect;

    params.clip_start = clip.0;
    params.clip_end = clip.1;
    params.ycor = xasp / yasp;

    let mut pixsize = if params.is_ortho {
        params.ortho_scale
    } else {
        let sensor = match params.sensor_fit {
            SensorFit::Auto | SensorFit::Horizontal => {
                params.lens = eye.fx * params.zoom * params.sensor_x;
                params.sensor_x
            }
            SensorFit::Vertical => {
                params.lens = eye.fy * params.zoom * params.sensor_y;
                params.sensor_y
            }
        };
        sensor * params.clip_start / params.lens
    };

    let viewfac = match params.sensor_fit {
        SensorFit::Auto if xasp * res_x >= yasp * res_y => res_x,
        SensorFit::Auto => params.ycor * res_y,
        SensorFit::Horizontal => res_x,
        SensorFit::Vertical => params.ycor * res_y,
    };
    pixsize /= viewfac;
    pixsize *= params.zoom;

    params.offsetx = (eye.cx - 0.5) * 2.0 * xasp;
    params.offsety = (eye.cy - 0.5) * 2.0 * yasp;

    let pfx = eye.fx * res_x;
    let pfy = eye.fy * res_y;
    let pcx = eye.cx * res_x;
    let pcy = (1.0 - eye.cy) * res_y;
    let cs = params.clip_start;
    params.viewplane = ViewPlane {
        xmin: (-pcx / pfx) * cs,
        xmax: ((res_x - pcx) / pfx) * cs,
        ymin: (-pcy / pfy) * cs,
        ymax: ((res_y - pcy) / pfy) * cs,
    };

    params.viewdx = pixsize;
    params.viewdy = params.ycor * pixsize;
}

/// Everything known about the live device: intrinsics, poses and the navigation transform.
#[derive(Clone, Debug)]
pub struct DeviceSession {
    pub runtime: Option<VendorRuntime>,
    /// Controller family. `Null` until the UI starts.
    pub device_type: DeviceType,
    pub eye_params: [EyeParams; 2],
    pub tex_width: u32,
    pub tex_height: u32,
    pub aperture_u: f32,
    pub aperture_v: f32,
    pub clip_start: f32,
    pub clip_end: f32,
    pub eye_baseline: f32,
    pub eye_dominance: Side,
    pub hand_dominance: Side,
    pub navigation: Navigation,
    pub hmd: LMatrix2,
    pub eyes: [LMatrix2; 2],
    pub controllers: [LMatrix2; MAX_CONTROLLERS],
    pub controller_states: Option<Box<[ControllerState; MAX_CONTROLLERS]>>,
    /// False when the last poll failed; poses then hold the last good values.
    pub tracking: bool,
}

impl DeviceSession {
    pub fn new(config: &Config) -> Self {
        Self {
            runtime: None,
            device_type: DeviceType::Null,
            eye_params: Default::default(),
            tex_width: 0,
            tex_height: 0,
            aperture_u: 1.0,
            aperture_v: 1.0,
            clip_start: config.clip_near,
            clip_end: config.clip_far,
            eye_baseline: 0.0,
            eye_dominance: config.eye_dominance,
            hand_dominance: config.hand_dominance,
            navigation: Navigation::new(config.min_navigation_scale, config.max_navigation_scale),
            hmd: LMatrix2::default(),
            eyes: Default::default(),
            controllers: Default::default(),
            controller_states: None,
            tracking: false,
        }
    }

    pub fn hmd(&mut self, space: Space) -> Mat4 {
        self.hmd.get(space, false, &self.navigation)
    }

    pub fn eye(&mut self, side: Side, space: Space) -> Mat4 {
        self.eyes[side.index()].get(space, false, &self.navigation)
    }

    pub fn controller(&mut self, index: usize, space: Space) -> Mat4 {
        self.controllers[index].get(space, false, &self.navigation)
    }

    pub fn controller_state(&self, index: usize) -> Option<&ControllerState> {
        self.controller_states.as_ref().map(|states| &states[index])
    }

    /// Replaces the navigation; scene-space poses are re-derived on next access.
    pub fn set_navigation(&mut self, m: Mat4) {
        self.navigation.set(m);
        self.invalidate_scene_poses();
    }

    pub fn apply_navigation(&mut self, m: Mat4, space: Space) {
        self.navigation.apply(m, space);
        self.invalidate_scene_poses();
    }

    pub fn reset_navigation(&mut self) {
        self.navigation.reset();
        self.invalidate_scene_poses();
    }

    fn invalidate_scene_poses(&mut self) {
        self.hmd.invalidate_except(Space::Real);
        for m in self.eyes.iter_mut().chain(self.controllers.iter_mut()) {
            m.invalidate_except(Space::Real);
        }
    }

    fn poll(&mut self, device: &mut dyn DeviceDriver) -> Result<(), TrackingError> {
        device.update_tracking()?;
        self.hmd.set(device.hmd_position()?, Space::Real);
        let eyes = device.eye_positions()?;
        for (slot, eye) in self.eyes.iter_mut().zip(eyes) {
            slot.set(eye, Space::Real);
        }
        self.eye_baseline = eyes[0].w_axis.distance(eyes[1].w_axis);
        let controllers = device.controller_positions()?;
        for (slot, pose) in self.controllers.iter_mut().zip(controllers) {
            slot.set(pose, Space::Real);
        }
        if let Some(states) = self.controller_states.as_deref_mut() {
            device.controller_states(states)?;
        }
        Ok(())
    }
}

struct EyeTarget {
    offscreen: Offscreen,
    viewport: ViewportId,
}

fn create_eye_target(
    scene: &mut dyn HostScene,
    region: RegionId,
    (w, h): (u32, u32),
    side: Side,
) -> Result<EyeTarget, ResourceError> {
    let offscreen = scene
        .create_offscreen(w, h)
        .ok_or(ResourceError::Offscreen(side))?;
    graphics::configure_eye_texture(offscreen.color_texture);
    let Some(viewport) = scene.create_viewport(region, &offscreen) else {
        scene.free_offscreen(offscreen.id);
        return Err(ResourceError::Viewport(side));
    };
    Ok(EyeTarget {
        offscreen,
        viewport,
    })
}

fn release_eye_targets<const N: usize>(scene: &mut dyn HostScene, targets: [EyeTarget; N]) {
    for t in targets {
        scene.free_viewport(t.viewport);
        scene.free_offscreen(t.offscreen.id);
    }
}

/// A device that came up, with what it told us about its eyes.
struct StartedDevice {
    device: Box<dyn DeviceDriver>,
    eye_params: [EyeParams; 2],
    tex_size: (u32, u32),
}

/// Owns the bound runtime and drives the per-frame sequence: poll, UI update, render, submit.
pub struct Driver {
    config: Config,
    factory: Box<dyn DriverFactory>,
    device: Option<Box<dyn DeviceDriver>>,
    state: SessionState,
    pub session: DeviceSession,
    ui: Option<Ui>,
    viewports: HashMap<RegionId, [EyeTarget; 2]>,
    /// The region whose eye targets are sent to the device.
    eye_region: Option<RegionId>,
    temp_camera: Option<ObjectId>,
    epoch: Instant,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        let loader = ModuleLoader::new(&config);
        Self::with_factory(config, Box::new(loader))
    }

    pub fn with_factory(config: Config, factory: Box<dyn DriverFactory>) -> Self {
        Self {
            session: DeviceSession::new(&config),
            config,
            factory,
            device: None,
            state: SessionState::Uninitialized,
            ui: None,
            viewports: HashMap::new(),
            eye_region: None,
            temp_camera: None,
            epoch: Instant::now(),
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ui(&self) -> Option<&Ui> {
        self.ui.as_ref()
    }

    pub fn ui_mut(&mut self) -> Option<&mut Ui> {
        self.ui.as_mut()
    }

    pub fn temp_camera(&self) -> Option<ObjectId> {
        self.temp_camera
    }

    /// Binds a runtime and brings the device up with the given graphics context.
    pub fn start_session(&mut self, context: &GraphicsContext) -> Result<(), DeviceError> {
        if self.state != SessionState::Uninitialized {
            return Err(DeviceError::AlreadyInitialized);
        }

        let plan = BindPlan::from_config(&self.config)?;
        let mut last_err = DeviceError::Bind(BindError::NoCandidates);
        let mut started = None;
        for &runtime in &plan.runtimes {
            match self.try_start(runtime, context) {
                Ok(device) => {
                    started = Some(device);
                    break;
                }
                Err(e) => {
                    warn!("Failed to start {runtime:?} runtime: {e:?}");
                    if !plan.autodetect {
                        return Err(e);
                    }
                    last_err = e;
                }
            }
        }
        let Some(StartedDevice {
            mut device,
            eye_params,
            tex_size,
        }) = started
        else {
            return Err(last_err);
        };

        let runtime = device.runtime();
        self.session = DeviceSession::new(&self.config);
        self.session.runtime = Some(runtime);
        self.session.eye_params = eye_params;
        (self.session.tex_width, self.session.tex_height) = tex_size;
        match self.session.poll(device.as_mut()) {
            Ok(()) => self.session.tracking = true,
            Err(e) => warn!("Initial tracking poll failed: {e:?}"),
        }
        self.device = Some(device);
        self.state = SessionState::Initialized;
        info!(
            "{runtime:?} session started, eye textures {}x{}",
            self.session.tex_width, self.session.tex_height
        );
        Ok(())
    }

    fn try_start(
        &mut self,
        runtime: VendorRuntime,
        context: &GraphicsContext,
    ) -> Result<StartedDevice, DeviceError> {
        let mut device = self.factory.open(runtime)?;
        let queried = device
            .create()
            .and_then(|()| device.init(context))
            .and_then(|()| {
                let eye_params = [
                    device.default_eye_params(Side::Left)?,
                    device.default_eye_params(Side::Right)?,
                ];
                let tex_size = device.default_eye_texture_size(Side::Left)?;
                Ok((eye_params, tex_size))
            });
        match queried {
            Ok((eye_params, tex_size)) => Ok(StartedDevice {
                device,
                eye_params,
                tex_size,
            }),
            Err(e) => {
                if let Err(uninit) = device.uninit() {
                    debug!("uninit after failed start also failed: {uninit:?}");
                }
                Err(e)
            }
        }
    }

    /// Picks the controller family, allocates controller records and brings up the UI.
    pub fn start_ui(&mut self) -> Result<(), DeviceError> {
        if self.state != SessionState::Initialized {
            return Err(DeviceError::NotInitialized);
        }
        let Some(device) = self.device.as_deref_mut() else {
            return Err(DeviceError::NotInitialized);
        };

        let device_type = if device.runtime() == VendorRuntime::MagicLeap {
            Ok(DeviceType::MagicLeap)
        } else {
            device.hmd_type()
        };
        let device_type = match device_type {
            Ok(t) => t,
            Err(e) => {
                self.session.device_type = DeviceType::Null;
                return Err(e);
            }
        };

        let mut states = Box::new([ControllerState::default(); MAX_CONTROLLERS]);
        if let Err(e) = device.controller_states(&mut states) {
            self.session.device_type = DeviceType::Null;
            return Err(e.into());
        }
        self.session.controller_states = Some(states);
        self.session.device_type = device_type;
        self.ui = Some(Ui::new(&self.config, device_type));
        self.state = SessionState::UiReady;
        info!("UI started for {device_type:?} controllers");
        Ok(())
    }

    /// Creates both eye render targets for `region`. Does nothing if it already has them.
    pub fn create_viewports(
        &mut self,
        scene: &mut dyn HostScene,
        region: RegionId,
    ) -> Result<(), ResourceError> {
        if self.state == SessionState::Uninitialized {
            return Err(ResourceError::NoSession);
        }
        if self.viewports.contains_key(&region) {
            return Ok(());
        }

        let (w, h) = (self.session.tex_width, self.session.tex_height);
        let left = create_eye_target(scene, region, (w, h), Side::Left)?;
        let right = match create_eye_target(scene, region, (w, h), Side::Right) {
            Ok(target) => target,
            Err(e) => {
                release_eye_targets(scene, [left]);
                return Err(e);
            }
        };
        if !scene.mark_region_vr(region) {
            release_eye_targets(scene, [left, right]);
            return Err(ResourceError::NoRegionView);
        }

        self.viewports.insert(region, [left, right]);
        self.eye_region = Some(region);
        debug!("created eye viewports for {region:?}");
        Ok(())
    }

    pub fn free_viewports(&mut self, scene: &mut dyn HostScene, region: RegionId) {
        let Some(targets) = self.viewports.remove(&region) else {
            return;
        };
        release_eye_targets(scene, targets);
        if self.eye_region == Some(region) {
            self.eye_region = self.viewports.keys().next().copied();
        }
    }

    fn eye_textures(&self) -> Option<[u32; 2]> {
        let targets = self.viewports.get(&self.eye_region?)?;
        let [left, right] = targets;
        Some([left.offscreen.color_texture, right.offscreen.color_texture])
    }

    /// Directs rendering into `side`'s eye target for `region`.
    pub fn bind_region(&self, scene: &mut dyn HostScene, region: RegionId, side: Side) -> bool {
        let Some(targets) = self.viewports.get(&region) else {
            return false;
        };
        scene.bind_viewport(
            targets[side.index()].viewport,
            PixelRect {
                xmin: 0,
                xmax: self.session.tex_width as i32,
                ymin: 0,
                ymax: self.session.tex_height as i32,
            },
        );
        true
    }

    pub fn unbind_region(&self, scene: &mut dyn HostScene, region: RegionId, side: Side) {
        if let Some(targets) = self.viewports.get(&region) {
            scene.unbind_viewport(targets[side.index()].viewport);
        }
    }

    /// Polls the device and runs the UI update. A failed poll keeps the last poses.
    pub fn update_tracking(&mut self) -> Result<(), TrackingError> {
        let now = self.epoch.elapsed().as_millis() as u64;
        self.update_tracking_at(now)
    }

    /// Like [`Self::update_tracking`] with an explicit timestamp in milliseconds.
    pub fn update_tracking_at(&mut self, now: u64) -> Result<(), TrackingError> {
        crate::tracy_span!("Driver::update_tracking");
        let Some(device) = self.device.as_deref_mut() else {
            return Err(TrackingError::NotInitialized);
        };

        let result = self.session.poll(device);
        self.session.tracking = result.is_ok();
        if let Err(e) = &result {
            crate::warn_once!("Tracking poll failed, reusing last poses");
            debug!("tracking poll failed: {e:?}");
        }

        if let Some(ui) = self.ui.as_mut() {
            crate::tracy_span!("Ui::update_tracking");
            ui.update_tracking(&mut self.session, now);
        }
        result
    }

    /// View matrix for `side`, including the navigation once the UI is running.
    pub fn compute_view_matrix(&mut self, side: Side) -> Mat4 {
        let eye_real = self.session.eye(side, Space::Real);
        if self.ui.is_some() {
            (self.session.navigation.matrix() * eye_real).inverse()
        } else {
            eye_real.inverse()
        }
    }

    /// Takes an eye transform given in scene space and stores it as the real-space eye pose.
    pub fn update_view_matrix(&mut self, side: Side, eye_scene: Mat4) {
        let real = self.session.navigation.inverse() * eye_scene;
        self.session.eyes[side.index()].set(real, Space::Real);
    }

    /// Derives `side`'s projection and writes it back to the view and its camera. Creates a
    /// temporary camera when the view has none.
    pub fn compute_view_plane(
        &mut self,
        scene: &mut dyn HostScene,
        view: &mut ViewParams,
        params: &mut CameraParams,
        side: Side,
        aspect: [f32; 2],
    ) -> Result<(), ResourceError> {
        if self.state == SessionState::Uninitialized {
            return Err(ResourceError::NoSession);
        }
        compute_view_plane(
            self.session.eye_params[side.index()],
            (self.session.tex_width, self.session.tex_height),
            aspect,
            (self.session.clip_start, self.session.clip_end),
            params,
        );

        view.clip_start = params.clip_start;
        view.clip_end = params.clip_end;
        view.lens = params.lens;

        let camera = match view.camera.filter(|&c| scene.object_exists(c)) {
            Some(camera) => camera,
            None => {
                let camera = self.temp_camera_for(scene)?;
                view.camera = Some(camera);
                camera
            }
        };
        scene.write_camera(camera, params.lens, params.clip_start, params.clip_end);
        Ok(())
    }

    fn temp_camera_for(&mut self, scene: &mut dyn HostScene) -> Result<ObjectId, ResourceError> {
        if let Some(camera) = self.temp_camera.filter(|&c| scene.object_exists(c)) {
            return Ok(camera);
        }
        let collection = scene.active_collection().ok_or(ResourceError::Camera)?;
        let camera = scene
            .create_camera(collection)
            .ok_or(ResourceError::Camera)?;
        scene.select_and_activate(camera);
        scene.tag_recalc(camera);
        debug!("created temporary camera {camera:?}");
        self.temp_camera = Some(camera);
        Ok(camera)
    }

    pub fn pre_scene_render(&mut self, side: Side) -> Mat4 {
        self.compute_view_matrix(side)
    }

    /// Draws menus and controller visuals for one eye after the scene.
    pub fn post_scene_render(&mut self, side: Side, canvas: &mut dyn Canvas) {
        crate::tracy_span!("Driver::post_scene_render");
        let view = self.compute_view_matrix(side);
        if let Some(ui) = self.ui.as_mut() {
            ui.render(side, view, &mut self.session, canvas);
        }
    }

    /// Host actions queued by widgets, released at most as often as the update interval allows.
    pub fn execute_operations(&mut self) -> Vec<HostAction> {
        let now = self.epoch.elapsed().as_millis() as u64;
        self.execute_operations_at(now)
    }

    pub fn execute_operations_at(&mut self, now: u64) -> Vec<HostAction> {
        self.ui
            .as_mut()
            .map(|ui| ui.take_actions(now))
            .unwrap_or_default()
    }

    /// Sends both eye textures to the device and submits the frame.
    pub fn blit_and_submit(&mut self) -> Result<(), DeviceError> {
        crate::tracy_span!("Driver::blit_and_submit");
        let textures = self.eye_textures();
        let Some(device) = self.device.as_deref_mut() else {
            return Err(DeviceError::NotInitialized);
        };
        if !device.submits_frames() {
            return Ok(());
        }
        let Some(textures) = textures else {
            crate::warn_once!("Frame submitted before eye viewports exist");
            return Err(DeviceError::NotInitialized);
        };
        device.blit_eyes(textures, [self.session.aperture_u, self.session.aperture_v])?;
        device.submit_frame()
    }

    /// Tears everything down. Safe to call when no session is running.
    pub fn end_session(&mut self, scene: &mut dyn HostScene) {
        if self.state == SessionState::Uninitialized && self.device.is_none() {
            return;
        }

        self.ui = None;
        self.session.controller_states = None;
        if let Some(mut device) = self.device.take() {
            if let Err(e) = device.uninit() {
                warn!("Runtime uninit failed: {e:?}");
            }
        }

        let regions: Vec<RegionId> = self.viewports.keys().copied().collect();
        for region in regions {
            self.free_viewports(scene, region);
        }

        if let Some(camera) = self.temp_camera.take() {
            if !scene.object_exists(camera) {
                debug!("temporary camera already gone");
            } else if scene.is_referenced_elsewhere(camera) {
                info!("Keeping temporary camera {camera:?}, it is in use elsewhere");
            } else {
                scene.delete_object(camera);
            }
        }

        self.session = DeviceSession::new(&self.config);
        self.state = SessionState::Uninitialized;
        info!("Session ended");
    }

    /// Starts the session and UI and creates the eye targets for `region` in one go.
    pub fn begin(
        &mut self,
        context: &GraphicsContext,
        scene: &mut dyn HostScene,
        region: RegionId,
    ) -> Result<(), SessionError> {
        self.start_session(context)?;
        let ui_and_viewports = self
            .start_ui()
            .map_err(SessionError::from)
            .and_then(|()| {
                self.create_viewports(scene, region)
                    .map_err(SessionError::from)
            });
        if let Err(e) = ui_and_viewports {
            self.end_session(scene);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;

    /// In-memory host scene that records what it was asked to do.
    #[derive(Default)]
    pub struct FakeScene {
        pub(crate) next_id: u64,
        pub offscreens: HashSet<OffscreenId>,
        pub viewports: HashSet<ViewportId>,
        pub objects: HashSet<ObjectId>,
        pub referenced: HashSet<ObjectId>,
        pub vr_regions: HashSet<RegionId>,
        pub region_without_view: Option<RegionId>,
        pub fail_offscreen_after: Option<usize>,
        pub cameras: HashMap<ObjectId, (f32, f32, f32)>,
        pub bound: Vec<(ViewportId, PixelRect)>,
        pub tagged: Vec<ObjectId>,
    }

    impl FakeScene {
        fn id(&mut self) -> u64 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl HostScene for FakeScene {
        fn create_offscreen(&mut self, _w: u32, _h: u32) -> Option<Offscreen> {
            if let Some(n) = self.fail_offscreen_after.as_mut() {
                if *n == 0 {
                    return None;
                }
                *n -= 1;
            }
            let id = OffscreenId(self.id());
            self.offscreens.insert(id);
            Some(Offscreen {
                id,
                color_texture: id.0 as u32 + 100,
            })
        }
        fn free_offscreen(&mut self, offscreen: OffscreenId) {
            assert!(self.offscreens.remove(&offscreen), "double free");
        }
        fn create_viewport(&mut self, _: RegionId, _: &Offscreen) -> Option<ViewportId> {
            let id = ViewportId(self.id());
            self.viewports.insert(id);
            Some(id)
        }
        fn free_viewport(&mut self, viewport: ViewportId) {
            assert!(self.viewports.remove(&viewport), "double free");
        }
        fn mark_region_vr(&mut self, region: RegionId) -> bool {
            if self.region_without_view == Some(region) {
                return false;
            }
            self.vr_regions.insert(region);
            true
        }
        fn bind_viewport(&mut self, viewport: ViewportId, rect: PixelRect) {
            self.bound.push((viewport, rect));
        }
        fn unbind_viewport(&mut self, _: ViewportId) {}
        fn active_collection(&self) -> Option<CollectionId> {
            Some(CollectionId(1))
        }
        fn create_camera(&mut self, _: CollectionId) -> Option<ObjectId> {
            let id = ObjectId(self.id());
            self.objects.insert(id);
            Some(id)
        }
        fn select_and_activate(&mut self, _: ObjectId) {}
        fn tag_recalc(&mut self, object: ObjectId) {
            self.tagged.push(object);
        }
        fn object_exists(&self, object: ObjectId) -> bool {
            self.objects.contains(&object)
        }
        fn is_referenced_elsewhere(&self, object: ObjectId) -> bool {
            self.referenced.contains(&object)
        }
        fn delete_object(&mut self, object: ObjectId) {
            self.objects.remove(&object);
        }
        fn write_camera(&mut self, camera: ObjectId, lens: f32, start: f32, end: f32) {
            self.cameras.insert(camera, (lens, start, end));
        }
    }
}
