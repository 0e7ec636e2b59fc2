use crate::types::Space;
use glam::{Mat4, Vec3};
use log::debug;

/// Maps tracked real-world poses (meters) into scene space. The uniform scale is kept within
/// `[min_scale, max_scale]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Navigation {
    matrix: Mat4,
    inverse: Mat4,
    scale: f32,
    min_scale: f32,
    max_scale: f32,
}

/// Where a freshly fitted scene should appear relative to the user's head.
#[derive(Clone, Copy, Debug)]
pub struct Workspace {
    pub size: f32,
    pub distance: f32,
    pub height: f32,
}

impl Navigation {
    pub fn new(min_scale: f32, max_scale: f32) -> Self {
        Self {
            matrix: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
            scale: 1.0,
            min_scale,
            max_scale,
        }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    #[inline]
    pub fn inverse(&self) -> Mat4 {
        self.inverse
    }

    /// Scene units per meter.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set(&mut self, mut m: Mat4) {
        let scale = m.x_axis.truncate().length();
        let clamped = scale.clamp(self.min_scale, self.max_scale);
        if scale > 0.0 && clamped != scale {
            let fix = clamped / scale;
            m.x_axis *= fix;
            m.y_axis *= fix;
            m.z_axis *= fix;
        }
        self.matrix = m;
        self.inverse = m.inverse();
        self.scale = clamped;
    }

    /// Composes `m` onto the navigation, either as a scene-space or a real-space transform.
    pub fn apply(&mut self, m: Mat4, space: Space) {
        let composed = match space {
            Space::Scene => m * self.matrix,
            Space::Real => self.matrix * m,
        };
        self.set(composed);
    }

    pub fn reset(&mut self) {
        self.matrix = Mat4::IDENTITY;
        self.inverse = Mat4::IDENTITY;
        self.scale = 1.0;
    }

    pub fn convert(&self, m: Mat4, from: Space, to: Space) -> Mat4 {
        match (from, to) {
            (Space::Real, Space::Scene) => self.matrix * m,
            (Space::Scene, Space::Real) => self.inverse * m,
            _ => m,
        }
    }

    /// Places the scene bounding box in front of the headset so its largest dimension spans the
    /// workspace size.
    pub fn fit(&mut self, bounds: (Vec3, Vec3), hmd: Mat4, workspace: Workspace) {
        let (min, max) = bounds;
        let center = (min + max) * 0.5;
        let extent = (max - min).max_element().max(f32::EPSILON);
        let scale = (extent / workspace.size).clamp(self.min_scale, self.max_scale);

        let mut forward = -hmd.z_axis.truncate();
        forward.z = 0.0;
        let forward = forward.try_normalize().unwrap_or(Vec3::Y);
        let target = hmd.w_axis.truncate()
            + forward * workspace.distance
            + Vec3::Z * workspace.height;

        debug!("fitting scene (extent {extent}) at {target:?}, scale {scale}");
        self.set(
            Mat4::from_translation(center)
                * Mat4::from_scale(Vec3::splat(scale))
                * Mat4::from_translation(-target),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_clamped() {
        let mut nav = Navigation::new(0.001, 1000.0);
        nav.set(Mat4::from_scale(Vec3::splat(5000.0)));
        assert_eq!(nav.scale(), 1000.0);
        assert!((nav.matrix().x_axis.truncate().length() - 1000.0).abs() < 1e-2);

        nav.set(Mat4::from_scale(Vec3::splat(1e-6)));
        assert_eq!(nav.scale(), 0.001);

        nav.apply(Mat4::from_scale(Vec3::splat(0.5)), Space::Scene);
        assert_eq!(nav.scale(), 0.001, "repeated shrinking must stay at the floor");
    }

    #[test]
    fn translation_is_kept_when_clamping() {
        let mut nav = Navigation::new(0.5, 2.0);
        nav.set(Mat4::from_scale_rotation_translation(
            Vec3::splat(10.0),
            glam::Quat::IDENTITY,
            Vec3::new(1.0, 2.0, 3.0),
        ));
        assert!(nav
            .matrix()
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        assert_eq!(nav.scale(), 2.0);
    }

    #[test]
    fn fit_centers_scene_in_workspace() {
        let mut nav = Navigation::new(0.001, 1000.0);
        let hmd = Mat4::from_translation(Vec3::new(0.0, 0.0, 1.7));
        let ws = Workspace {
            size: 0.45,
            distance: 0.55,
            height: -0.35,
        };
        nav.fit((Vec3::splat(-4.5), Vec3::splat(4.5)), hmd, ws);
        assert!((nav.scale() - 20.0).abs() < 1e-3);

        // hmd looks down -Z by default, which has no horizontal component: forward falls back
        // to +Y
        let target = Vec3::new(0.0, 0.55, 1.7 - 0.35);
        let mapped = nav.convert(Mat4::from_translation(target), Space::Real, Space::Scene);
        assert!(mapped.w_axis.truncate().abs_diff_eq(Vec3::ZERO, 1e-4));
    }
}
