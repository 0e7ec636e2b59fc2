use fakert::FakeController;
use glam::{Mat4, Vec3};
use pievr::cursor::WidgetEvent;
use pievr::draw::{Canvas, HAlign, Rect, VAlign};
use pievr::graphics::GraphicsContext;
use pievr::runtime::{
    module_file_name, BindError, DeviceDriver, DeviceError, DriverFactory, DynamicDriver,
    EntryPoints, ModuleLoader,
};
use pievr::session::{
    CollectionId, HostScene, ObjectId, Offscreen, OffscreenId, PixelRect, RegionId, ViewportId,
};
use pievr::tools::ToolKind;
use pievr::types::buttons;
use pievr::ui::HostAction;
use pievr::{Config, DeviceType, Driver, SessionState, Side, VendorRuntime};
use std::path::{Path, PathBuf};

/// Links the fake module's entry points directly instead of loading a shared object.
struct Linked;

impl DriverFactory for Linked {
    fn open(&mut self, runtime: VendorRuntime) -> Result<Box<dyn DeviceDriver>, BindError> {
        let fns = EntryPoints {
            create: fakert::c_createVR,
            init: fakert::c_initVR,
            hmd_type: fakert::c_getHMDType,
            set_eye_params: fakert::c_setEyeParams,
            default_eye_params: fakert::c_getDefaultEyeParams,
            default_eye_tex_size: fakert::c_getDefaultEyeTexSize,
            update_tracking: fakert::c_updateTrackingVR,
            eye_positions: fakert::c_getEyePositions,
            hmd_position: fakert::c_getHMDPosition,
            controller_positions: fakert::c_getControllerPositions,
            controller_states: fakert::c_getControllerStates,
            blit_eye: fakert::c_blitEye,
            blit_eyes: fakert::c_blitEyes,
            submit_frame: fakert::c_submitFrame,
            uninit: fakert::c_uninitVR,
        };
        Ok(Box::new(DynamicDriver::from_entry_points(runtime, fns)))
    }
}

fn context() -> GraphicsContext {
    #[cfg(windows)]
    return GraphicsContext::Wgl {
        device: std::ptr::null_mut(),
        context: std::ptr::null_mut(),
    };
    #[cfg(not(windows))]
    return GraphicsContext::Glx {
        display: std::ptr::null_mut(),
        drawable: 1,
        context: std::ptr::null_mut(),
    };
}

#[derive(Default)]
struct Scene {
    next: u64,
    live_offscreens: usize,
}

impl HostScene for Scene {
    fn create_offscreen(&mut self, _: u32, _: u32) -> Option<Offscreen> {
        self.next += 1;
        self.live_offscreens += 1;
        Some(Offscreen {
            id: OffscreenId(self.next),
            color_texture: self.next as u32,
        })
    }
    fn free_offscreen(&mut self, _: OffscreenId) {
        self.live_offscreens -= 1;
    }
    fn create_viewport(&mut self, _: RegionId, _: &Offscreen) -> Option<ViewportId> {
        self.next += 1;
        Some(ViewportId(self.next))
    }
    fn free_viewport(&mut self, _: ViewportId) {}
    fn mark_region_vr(&mut self, _: RegionId) -> bool {
        true
    }
    fn bind_viewport(&mut self, _: ViewportId, _: PixelRect) {}
    fn unbind_viewport(&mut self, _: ViewportId) {}
    fn active_collection(&self) -> Option<CollectionId> {
        None
    }
    fn create_camera(&mut self, _: CollectionId) -> Option<ObjectId> {
        None
    }
    fn select_and_activate(&mut self, _: ObjectId) {}
    fn tag_recalc(&mut self, _: ObjectId) {}
    fn object_exists(&self, _: ObjectId) -> bool {
        false
    }
    fn is_referenced_elsewhere(&self, _: ObjectId) -> bool {
        false
    }
    fn delete_object(&mut self, _: ObjectId) {}
    fn write_camera(&mut self, _: ObjectId, _: f32, _: f32, _: f32) {}
}

/// Only remembers which icons were drawn.
#[derive(Default)]
struct Icons(Vec<String>);

impl Canvas for Icons {
    fn set_color(&mut self, _: [f32; 4]) {}
    fn update_modelview_matrix(&mut self, _: Option<Mat4>, _: Option<Mat4>) {}
    fn render_rect(&mut self, _: Rect, _: f32) {}
    fn render_icon(&mut self, name: &str, _: Rect, _: f32) {
        self.0.push(name.to_owned());
    }
    fn render_frame(&mut self, _: Rect, _: f32, _: f32) {}
    fn render_box(&mut self, _: Vec3, _: Vec3, _: bool) {}
    fn render_ball(&mut self, _: f32) {}
    fn render_arrow(&mut self, _: Vec3, _: Vec3, _: f32) {}
    fn render_string(&mut self, _: &str, _: f32, _: f32, _: HAlign, _: VAlign, _: Vec3) {}
}

fn hand(buttons: u64) -> FakeController {
    FakeController {
        side: 1,
        available: 1,
        buttons,
        ..Default::default()
    }
}

fn index_driver() -> Driver {
    pievr::init_logging();
    fakert::reset();
    fakert::set_hmd_type(DeviceType::Index as i32);
    Driver::with_factory(
        Config {
            device: Some(DeviceType::Index),
            ..Default::default()
        },
        Box::new(Linked),
    )
}

#[test]
fn frame_loop() {
    let mut driver = index_driver();
    let mut scene = Scene::default();
    driver
        .begin(&context(), &mut scene, RegionId(1))
        .expect("session should start");
    assert_eq!(driver.state(), SessionState::UiReady);

    fakert::set_controller_state(1, hand(buttons::A));
    driver.update_tracking_at(0).expect("tracking");
    fakert::set_controller_state(1, hand(0));
    driver.update_tracking_at(30).expect("tracking");
    assert_eq!(
        driver.execute_operations_at(30),
        [HostAction::Undo, HostAction::Redraw]
    );

    let mut canvas = Icons::default();
    driver.post_scene_render(Side::Left, &mut canvas);
    for icon in ["toolsettings", "undo", "redo", "transform", "nav_grabair"] {
        assert!(canvas.0.iter().any(|i| i == icon), "{icon} missing: {:?}", canvas.0);
    }
    assert!(
        !canvas.0.iter().any(|i| i == "select"),
        "left controller is not tracked"
    );

    driver.blit_and_submit().expect("submit");
    assert_eq!(fakert::submitted_frames(), 1);

    driver.end_session(&mut scene);
    assert_eq!(driver.state(), SessionState::Uninitialized);
    assert_eq!(scene.live_offscreens, 0);
    assert!(!fakert::is_initialized());
}

#[test]
fn grip_drag_moves_the_scene() {
    let mut driver = index_driver();
    let mut scene = Scene::default();
    driver
        .begin(&context(), &mut scene, RegionId(1))
        .expect("session should start");

    fakert::set_controller_state(1, hand(buttons::GRIP));
    driver.update_tracking_at(0).expect("tracking");
    driver.update_tracking_at(200).expect("tracking");
    assert_eq!(driver.session.navigation.matrix(), Mat4::IDENTITY);

    fakert::set_controller_position(1, Mat4::from_translation(Vec3::new(0.1, 0.0, 0.0)));
    driver.update_tracking_at(220).expect("tracking");
    let moved = driver.session.navigation.matrix().w_axis.truncate();
    assert!((moved.length() - 0.1).abs() < 1e-4, "{moved}");

    fakert::set_controller_state(1, hand(0));
    driver.update_tracking_at(240).expect("tracking");
    let actions = driver.execute_operations_at(240);
    let forwarded = |event| {
        actions.contains(&HostAction::Tool {
            tool: ToolKind::Navi,
            side: Side::Right,
            event,
        })
    };
    assert!(forwarded(WidgetEvent::DragStart) && forwarded(WidgetEvent::DragStop));
    assert!(
        !forwarded(WidgetEvent::DragContd),
        "the scene moves without the host: {actions:?}"
    );
    driver.end_session(&mut scene);
}

/// Installs `lib` as the Steam module of a fresh module directory.
fn install_module(lib: &Path, name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pievr-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("module dir");
    std::fs::copy(lib, dir.join(module_file_name("Test", VendorRuntime::Steam)))
        .expect("copy module");
    dir
}

#[test]
#[cfg_attr(miri, ignore)]
fn module_missing_an_entry_point_is_rejected() {
    pievr::init_logging();
    let lib = test_cdylib::build_file("tests/fixtures/incomplete_module.rs");
    let config = Config {
        device: Some(DeviceType::Vive),
        module_prefix: "Test".into(),
        module_dir: Some(install_module(&lib, "incomplete")),
        ..Default::default()
    };

    let err = ModuleLoader::new(&config)
        .open(VendorRuntime::Steam)
        .err()
        .expect("module should not bind");
    assert!(
        matches!(
            err,
            BindError::IncompleteModule {
                runtime: VendorRuntime::Steam,
                symbol: "c_submitFrame"
            }
        ),
        "{err:?}"
    );

    let mut driver = Driver::new(config);
    let err = driver.start_session(&context()).err().expect("session should fail");
    assert!(
        matches!(
            err,
            DeviceError::Bind(BindError::IncompleteModule { .. })
        ),
        "{err:?}"
    );
    assert_eq!(driver.state(), SessionState::Uninitialized);
}
