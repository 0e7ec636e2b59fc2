use crate::navigation::Navigation;
use crate::types::Space;
use glam::Mat4;

/// A transform with a lazily computed inverse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LMatrix {
    mat: Mat4,
    inv: Mat4,
    inv_valid: bool,
}

impl Default for LMatrix {
    fn default() -> Self {
        Self {
            mat: Mat4::IDENTITY,
            inv: Mat4::IDENTITY,
            inv_valid: true,
        }
    }
}

impl From<Mat4> for LMatrix {
    fn from(mat: Mat4) -> Self {
        let mut m = Self::default();
        m.set(mat);
        m
    }
}

impl LMatrix {
    pub fn set(&mut self, mat: Mat4) {
        self.mat = mat;
        self.invalidate();
    }

    /// Drops the cached inverse; the next inverse request recomputes it.
    #[inline]
    pub fn invalidate(&mut self) {
        self.inv_valid = false;
    }

    pub fn get(&mut self, inverse: bool) -> Mat4 {
        if !inverse {
            return self.mat;
        }
        if !self.inv_valid {
            self.inv = self.mat.inverse();
            self.inv_valid = true;
        }
        self.inv
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.mat
    }

    #[inline]
    pub fn inverse_is_cached(&self) -> bool {
        self.inv_valid
    }
}

/// A transform known in both real and scene space. Setting one space marks the other stale; it
/// is derived through the navigation transform the next time it is read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LMatrix2 {
    position: [LMatrix; Space::COUNT],
    current: [bool; Space::COUNT],
}

impl LMatrix2 {
    pub fn new(mat: Mat4, space: Space) -> Self {
        let mut m = Self::default();
        m.set(mat, space);
        m
    }

    pub fn set(&mut self, mat: Mat4, space: Space) {
        self.position[space as usize].set(mat);
        self.current[space as usize] = true;
        self.current[space.other() as usize] = false;
    }

    /// Marks both spaces stale except `keep`, e.g. after the navigation changed.
    pub fn invalidate_except(&mut self, keep: Space) {
        self.current[keep.other() as usize] = false;
    }

    pub fn get(&mut self, space: Space, inverse: bool, nav: &Navigation) -> Mat4 {
        let idx = space as usize;
        if !self.current[idx] {
            let other = space.other();
            if self.current[other as usize] {
                let source = self.position[other as usize].matrix();
                self.position[idx].set(nav.convert(source, other, space));
                self.current[idx] = true;
            }
        }
        self.position[idx].get(inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn inverse_only_computed_on_request() {
        let mut m = LMatrix::default();
        m.set(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert!(!m.inverse_is_cached());
        m.get(false);
        assert!(!m.inverse_is_cached());
        let inv = m.get(true);
        assert!(m.inverse_is_cached());
        assert!(inv.abs_diff_eq(Mat4::from_translation(Vec3::new(-1.0, -2.0, -3.0)), 1e-6));

        m.set(Mat4::from_scale(Vec3::splat(2.0)));
        assert!(!m.inverse_is_cached(), "setting the matrix must drop the inverse");
        assert!(m.get(true).abs_diff_eq(Mat4::from_scale(Vec3::splat(0.5)), 1e-6));
    }

    #[test]
    fn scene_space_follows_navigation() {
        let mut nav = Navigation::new(0.001, 1000.0);
        nav.set(Mat4::from_scale(Vec3::splat(2.0)));

        let real = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let mut pose = LMatrix2::new(real, Space::Real);
        let scene = pose.get(Space::Scene, false, &nav);
        assert!(scene
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));

        pose.set(Mat4::from_translation(Vec3::new(0.0, 4.0, 0.0)), Space::Scene);
        let real = pose.get(Space::Real, false, &nav);
        assert!(real
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-6));
    }
}
