use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_sq(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Position in camera space. `z` is the distance from the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Linear colour with channels in `0.0..=255.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn clamped(self) -> Rgb {
        Rgb::new(
            self.r.clamp(0.0, 255.0),
            self.g.clamp(0.0, 255.0),
            self.b.clamp(0.0, 255.0),
        )
    }

    /// Source-over blend of `self` onto `dst`.
    pub fn over(self, dst: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        Rgb::new(
            dst.r + (self.r - dst.r) * a,
            dst.g + (self.g - dst.g) * a,
            dst.b + (self.b - dst.b) * a,
        )
    }

    pub fn to_u8(self) -> (u8, u8, u8) {
        let c = self.clamped();
        (c.r.round() as u8, c.g.round() as u8, c.b.round() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod vec2_length {
        use super::*;

        #[test]
        fn calculates_length() {
            let v = Vec2::new(3.0, 4.0);
            assert_eq!(v.length_sq(), 25.0);
            assert_eq!(v.length(), 5.0);
        }

        #[test]
        fn zero_vector_has_zero_length() {
            assert_eq!(Vec2::ZERO.length(), 0.0);
        }
    }

    mod vec2_ops {
        use super::*;

        #[test]
        fn adds_and_subtracts() {
            let a = Vec2::new(5.0, 7.0);
            let b = Vec2::new(2.0, 3.0);
            assert_eq!(a + b, Vec2::new(7.0, 10.0));
            assert_eq!(a - b, Vec2::new(3.0, 4.0));
        }

        #[test]
        fn add_assign_modifies_in_place() {
            let mut a = Vec2::new(1.0, 2.0);
            a += Vec2::new(3.0, 4.0);
            assert_eq!(a, Vec2::new(4.0, 6.0));
        }

        #[test]
        fn scales_by_scalar() {
            assert_eq!(Vec2::new(2.0, 3.0) * 2.0, Vec2::new(4.0, 6.0));
        }
    }

    mod rgb {
        use super::*;

        #[test]
        fn clamps_channels_into_byte_range() {
            let c = Rgb::new(-4.0, 128.0, 300.0).clamped();
            assert_eq!(c, Rgb::new(0.0, 128.0, 255.0));
        }

        #[test]
        fn over_with_full_alpha_replaces_destination() {
            let src = Rgb::new(200.0, 100.0, 50.0);
            assert_eq!(src.over(Rgb::BLACK, 1.0), src);
        }

        #[test]
        fn over_with_zero_alpha_keeps_destination() {
            let dst = Rgb::new(10.0, 20.0, 30.0);
            assert_eq!(Rgb::new(255.0, 255.0, 255.0).over(dst, 0.0), dst);
        }

        #[test]
        fn over_interpolates_linearly() {
            let c = Rgb::new(100.0, 0.0, 0.0).over(Rgb::BLACK, 0.25);
            assert!((c.r - 25.0).abs() < 1e-5);
        }

        #[test]
        fn to_u8_rounds_and_clamps() {
            assert_eq!(Rgb::new(12.6, 300.0, -1.0).to_u8(), (13, 255, 0));
        }
    }
}
