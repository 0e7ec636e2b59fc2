//! Small shared vocabulary types: controller sides, coordinate spaces, device kinds and the
//! controller record that crosses the vendor module boundary.

use serde::Deserialize;

/// Number of controller slots a vendor module reports: left hand, right hand and one auxiliary
/// tracker.
pub const MAX_CONTROLLERS: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[repr(u8)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn other(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl TryFrom<usize> for Side {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::Left),
            1 => Ok(Side::Right),
            _ => Err(()),
        }
    }
}

/// The two coordinate frames every tracked pose is known in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Space {
    /// As reported by the tracking system, in meters.
    Real = 0,
    /// After the navigation transform, in scene units.
    Scene = 1,
}

impl Space {
    pub const COUNT: usize = 2;

    #[inline]
    pub fn other(self) -> Self {
        match self {
            Space::Real => Space::Scene,
            Space::Scene => Space::Real,
        }
    }
}

/// Which vendor module drives the session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VendorRuntime {
    Oculus,
    Steam,
    Fove,
    MagicLeap,
    OpenXr,
}

impl VendorRuntime {
    /// Name used in the module file name.
    pub fn module_name(self) -> &'static str {
        match self {
            Self::Oculus => "Oculus",
            Self::Steam => "SteamVR",
            Self::Fove => "Fove",
            Self::MagicLeap => "MagicLeap",
            Self::OpenXr => "OpenXR",
        }
    }

    /// Remote runtimes render elsewhere and never take eye textures from us.
    pub fn is_remote(self) -> bool {
        matches!(self, Self::MagicLeap)
    }

    /// Whether a module for this runtime can exist on the current platform.
    pub fn available_on_platform(self) -> bool {
        match self {
            Self::Oculus | Self::Fove => cfg!(windows),
            Self::MagicLeap => false,
            Self::Steam | Self::OpenXr => true,
        }
    }
}

/// Headset/controller family. Also decides which analog input a menu samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[repr(i32)]
pub enum DeviceType {
    #[default]
    Null = 0,
    Oculus = 1,
    Vive = 2,
    WindowsMr = 3,
    Fove = 4,
    Pimax = 5,
    Index = 6,
    MagicLeap = 7,
}

impl DeviceType {
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => Self::Null,
            1 => Self::Oculus,
            2 => Self::Vive,
            3 => Self::WindowsMr,
            4 => Self::Fove,
            5 => Self::Pimax,
            6 => Self::Index,
            7 => Self::MagicLeap,
            _ => return None,
        })
    }

    /// Devices whose controllers expose a touchpad instead of a thumbstick.
    pub fn uses_dpad(self) -> bool {
        matches!(self, Self::Vive | Self::Pimax | Self::MagicLeap)
    }

    /// The runtime that drives this device when it is requested explicitly.
    pub fn runtime(self) -> Option<VendorRuntime> {
        match self {
            Self::Null => None,
            Self::Oculus => Some(VendorRuntime::Oculus),
            Self::Vive | Self::WindowsMr | Self::Pimax | Self::Index => Some(VendorRuntime::Steam),
            Self::Fove => Some(VendorRuntime::Fove),
            Self::MagicLeap => Some(VendorRuntime::MagicLeap),
        }
    }
}

/// Button bits reported in [`ControllerState::buttons`].
pub mod buttons {
    pub const TRIGGER: u64 = 1 << 0;
    pub const GRIP: u64 = 1 << 1;
    pub const STICK: u64 = 1 << 2;
    pub const DPAD: u64 = 1 << 3;
    pub const MENU: u64 = 1 << 4;
    pub const SYSTEM: u64 = 1 << 5;
    pub const A: u64 = 1 << 6;
    pub const B: u64 = 1 << 7;
    pub const THUMBREST: u64 = 1 << 8;

    /// Every bit the cursor state machine tracks.
    pub const ALL: [u64; 9] = [TRIGGER, GRIP, STICK, DPAD, MENU, SYSTEM, A, B, THUMBREST];
}

/// Per-controller input record, filled in by the vendor module.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ControllerState {
    pub side: i32,
    pub available: i32,
    pub buttons: u64,
    pub buttons_touched: u64,
    pub trigger_pressure: f32,
    pub grip_pressure: f32,
    pub stick: [f32; 2],
    pub dpad: [f32; 2],
}

impl ControllerState {
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available != 0
    }

    #[inline]
    pub fn pressed(&self, bit: u64) -> bool {
        self.buttons & bit != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_device_runtime_mapping() {
        assert_eq!(DeviceType::Null.runtime(), None);
        assert_eq!(DeviceType::Oculus.runtime(), Some(VendorRuntime::Oculus));
        for dev in [
            DeviceType::Vive,
            DeviceType::WindowsMr,
            DeviceType::Pimax,
            DeviceType::Index,
        ] {
            assert_eq!(dev.runtime(), Some(VendorRuntime::Steam), "{dev:?}");
        }
        assert_eq!(DeviceType::Fove.runtime(), Some(VendorRuntime::Fove));
        assert_eq!(
            DeviceType::MagicLeap.runtime(),
            Some(VendorRuntime::MagicLeap)
        );
    }

    #[test]
    fn raw_device_types() {
        for raw in 0..8 {
            let dev = DeviceType::from_raw(raw).expect("known device id");
            assert_eq!(dev as i32, raw);
        }
        assert_eq!(DeviceType::from_raw(8), None);
        assert_eq!(DeviceType::from_raw(-1), None);
    }

    #[test]
    fn controller_record_layout() {
        // Must stay in sync with what vendor modules write.
        assert_eq!(std::mem::size_of::<ControllerState>(), 48);
    }
}
