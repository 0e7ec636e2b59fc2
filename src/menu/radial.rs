//! Stick direction to slot mapping.
//!
//! The stick's angle from "up" is unwrapped onto a signed range (positive on the right half,
//! negative on the left), rotated by half a slot and scaled so every slot spans exactly π. The
//! resulting band number is then looked up in a fixed table, because slot numbers do not follow
//! the visual order around the ring.

use glam::Vec2;
use std::f32::consts::PI;

/// Band (offset by 4) to slot, for menus with fewer than 8 items.
const SLOTS_8: [usize; 9] = [7, 5, 1, 3, 0, 4, 2, 6, 7];
/// Band (offset by 6) to slot, for the 12-slot ring.
const SLOTS_12: [usize; 13] = [11, 9, 7, 1, 5, 3, 0, 4, 6, 2, 8, 10, 11];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ring {
    Eight,
    Twelve,
}

impl Ring {
    pub fn for_items(num_items: usize) -> Self {
        if num_items < 8 {
            Ring::Eight
        } else {
            Ring::Twelve
        }
    }

    #[inline]
    fn slots(self) -> &'static [usize] {
        match self {
            Ring::Eight => &SLOTS_8,
            Ring::Twelve => &SLOTS_12,
        }
    }

    /// Number of bands on either side of "up".
    #[inline]
    pub fn half(self) -> i32 {
        match self {
            Ring::Eight => 4,
            Ring::Twelve => 6,
        }
    }

    /// The slot straight down, which backs out of a submenu.
    #[inline]
    pub fn exit_slot(self) -> usize {
        match self {
            Ring::Eight => 7,
            Ring::Twelve => 11,
        }
    }
}

/// Unsigned angle between the stick and +Y, in `[0, π]`. A zero stick has no direction.
pub fn angle(stick: Vec2) -> Option<f32> {
    let dir = stick.try_normalize()?;
    Some(dir.dot(Vec2::Y).clamp(-1.0, 1.0).acos())
}

/// Angle from "up", negative when the stick points left.
pub fn signed_angle(stick: Vec2) -> Option<f32> {
    let a = angle(stick)?;
    Some(if stick.x < 0.0 { -a } else { a })
}

/// Rotates and scales the stick angle so slot boundaries fall on multiples of π.
pub fn unwrap(stick: Vec2, ring: Ring) -> Option<f32> {
    let a = angle(stick)?;
    let (k, m) = match ring {
        Ring::Eight => (8.0, 4.0),
        Ring::Twelve => (12.0, 6.0),
    };
    let a = if stick.x > 0.0 { a + PI / k } else { -a + PI / k };
    Some(a * m)
}

/// Which π-wide band an unwrapped angle falls in. Band `n` is `[nπ, (n+1)π)`, clamped to the
/// ring's exit bands at either end.
pub fn band(a: f32, ring: Ring) -> i32 {
    let mut b = (a / PI).floor() as i32;
    // `a / PI` can round across a boundary; compare against the same products callers use.
    if a < b as f32 * PI {
        b -= 1;
    } else if a >= (b + 1) as f32 * PI {
        b += 1;
    }
    b.clamp(-ring.half(), ring.half())
}

pub fn slot(a: f32, ring: Ring) -> usize {
    ring.slots()[(band(a, ring) + ring.half()) as usize]
}

/// Slot under the stick, if it points anywhere.
pub fn highlight(stick: Vec2, num_items: usize) -> Option<usize> {
    let ring = Ring::for_items(num_items);
    unwrap(stick, ring).map(|a| slot(a, ring))
}

/// Sculpt strength for an unwrapped angle on the strength meter, which covers the right half
/// `[0, 3π)` and the left half `[-2π, 0)` of the ring with two different slopes meeting at 1/3.
/// `None` outside the meter.
pub fn strength(a: f32) -> Option<f32> {
    let value = if (0.0..3.0 * PI).contains(&a) {
        a / (9.0 * PI / 2.0) + 1.0 / 3.0
    } else if (-2.0 * PI..0.0).contains(&a) {
        a / (6.0 * PI) + 1.0 / 3.0
    } else {
        return None;
    };
    Some(value.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(degrees_from_up: f32) -> Vec2 {
        let r = degrees_from_up.to_radians();
        Vec2::new(r.sin(), r.cos())
    }

    #[test]
    fn bands_map_to_interleaved_slots_8() {
        // (band, slot), all 9 bands including both exit bands
        let expected = [
            (-4, 7),
            (-3, 5),
            (-2, 1),
            (-1, 3),
            (0, 0),
            (1, 4),
            (2, 2),
            (3, 6),
            (4, 7),
        ];
        for (band_no, slot_no) in expected {
            let lo = band_no as f32 * PI;
            let mid = lo + PI / 2.0;
            assert_eq!(band(lo, Ring::Eight), band_no, "lower edge of band {band_no}");
            assert_eq!(slot(lo, Ring::Eight), slot_no, "lower edge of band {band_no}");
            assert_eq!(slot(mid, Ring::Eight), slot_no, "middle of band {band_no}");
        }
        // just below each boundary belongs to the band underneath
        for b in -3..=4 {
            let below = b as f32 * PI - 1e-3;
            assert_eq!(band(below, Ring::Eight), b - 1, "just below {b}π");
        }
    }

    #[test]
    fn bands_map_to_interleaved_slots_12() {
        let expected = [
            (-6, 11),
            (-5, 9),
            (-4, 7),
            (-3, 1),
            (-2, 5),
            (-1, 3),
            (0, 0),
            (1, 4),
            (2, 6),
            (3, 2),
            (4, 8),
            (5, 10),
            (6, 11),
        ];
        for (band_no, slot_no) in expected {
            let lo = band_no as f32 * PI;
            assert_eq!(band(lo, Ring::Twelve), band_no, "lower edge of band {band_no}");
            assert_eq!(slot(lo, Ring::Twelve), slot_no, "lower edge of band {band_no}");
            assert_eq!(
                slot(lo + PI / 2.0, Ring::Twelve),
                slot_no,
                "middle of band {band_no}"
            );
        }
    }

    #[test]
    fn out_of_range_angles_land_in_exit_slot() {
        assert_eq!(slot(100.0, Ring::Eight), 7);
        assert_eq!(slot(-100.0, Ring::Eight), 7);
        assert_eq!(slot(100.0, Ring::Twelve), 11);
        assert_eq!(slot(-100.0, Ring::Twelve), 11);
    }

    #[test]
    fn stick_directions_8() {
        assert_eq!(unwrap(Vec2::Y, Ring::Eight), Some(PI / 2.0));
        let cases = [
            (0.0, 0),
            (45.0, 4),
            (90.0, 2),
            (135.0, 6),
            (180.0, 7),
            (-135.0, 5),
            (-90.0, 1),
            (-45.0, 3),
        ];
        for (deg, expected) in cases {
            assert_eq!(highlight(dir(deg), 7), Some(expected), "{deg} degrees");
        }
    }

    #[test]
    fn stick_directions_12() {
        let cases = [
            (0.0, 0),
            (30.0, 4),
            (60.0, 6),
            (90.0, 2),
            (120.0, 8),
            (150.0, 10),
            (180.0, 11),
            (-150.0, 9),
            (-120.0, 7),
            (-90.0, 1),
            (-60.0, 5),
            (-30.0, 3),
        ];
        for (deg, expected) in cases {
            assert_eq!(highlight(dir(deg), 12), Some(expected), "{deg} degrees");
        }
    }

    #[test]
    fn zero_stick_has_no_slot() {
        assert_eq!(angle(Vec2::ZERO), None);
        assert_eq!(highlight(Vec2::ZERO, 7), None);
        assert_eq!(highlight(Vec2::ZERO, 12), None);
    }

    #[test]
    fn signed_angle_is_negative_on_the_left() {
        let a = signed_angle(Vec2::new(-1.0, 0.0)).expect("direction");
        assert!((a + PI / 2.0).abs() < 1e-6);
        let a = signed_angle(Vec2::new(1.0, 0.0)).expect("direction");
        assert!((a - PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn strength_is_linear_and_clamped() {
        assert_eq!(strength(0.0), Some(1.0 / 3.0));
        assert!((strength(-1e-6).expect("meter") - 1.0 / 3.0).abs() < 1e-5);
        assert_eq!(strength(-2.0 * PI), Some(0.0));
        assert!((strength(3.0 * PI - 1e-4).expect("meter") - 1.0).abs() < 1e-4);
        assert_eq!(strength(3.0 * PI), None);
        assert_eq!(strength(-2.0 * PI - 1e-3), None);

        let mut last = -1.0;
        let steps = 500;
        for i in 0..steps {
            let a = -2.0 * PI + 5.0 * PI * i as f32 / steps as f32;
            let Some(v) = strength(a) else { continue };
            assert!((0.0..=1.0).contains(&v), "{v} at {a}");
            assert!(v >= last, "strength must not decrease ({last} -> {v} at {a})");
            last = v;
        }

        // constant slope within each half
        let right = |a: f32| strength(a).expect("meter");
        let d1 = right(PI) - right(0.5 * PI);
        let d2 = right(2.0 * PI) - right(1.5 * PI);
        assert!((d1 - d2).abs() < 1e-5);
        let d3 = right(-0.5 * PI) - right(-PI);
        let d4 = right(-1.0 * PI) - right(-1.5 * PI);
        assert!((d3 - d4).abs() < 1e-5);
    }
}
