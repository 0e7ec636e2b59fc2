use pievr::graphics::GraphicsContext;
use pievr::runtime::{module_file_name, DeviceDriver, DriverFactory, ModuleLoader};
use pievr::{Config, DeviceType, Driver, SessionState, VendorRuntime};

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

/// Builds this crate as a shared module and installs it where the loader looks for SteamVR.
fn steam_config() -> Config {
    let lib = test_cdylib::build_current_project();
    let dir = std::env::temp_dir().join(format!("fakert-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("module dir");
    std::fs::copy(&lib, dir.join(module_file_name("Test", VendorRuntime::Steam)))
        .expect("copy module");
    Config {
        device: Some(DeviceType::Vive),
        module_prefix: "Test".into(),
        module_dir: Some(dir),
        ..Default::default()
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn loads_as_a_vendor_module() {
    pievr::init_logging();
    let config = steam_config();

    let mut device = ModuleLoader::new(&config)
        .open(VendorRuntime::Steam)
        .expect("every entry point resolves");
    device.create().expect("create");
    device.init(&context()).expect("init");
    assert_eq!(device.hmd_type().expect("hmd type"), DeviceType::Vive);
    device.submit_frame().expect("submit");
    device.uninit().expect("uninit");

    let mut driver = Driver::new(config);
    driver.start_session(&context()).expect("session");
    driver.start_ui().expect("ui");
    assert_eq!(driver.state(), SessionState::UiReady);
    assert_eq!(
        (driver.session.tex_width, driver.session.tex_height),
        (1512, 1680)
    );
    assert_eq!(driver.session.device_type, DeviceType::Vive);
}
